pub mod content_provider;
pub mod message_dispatcher;
