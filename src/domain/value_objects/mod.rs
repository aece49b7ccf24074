pub mod enums;
pub mod inbound_events;
pub mod local_time;
pub mod subscribers;
