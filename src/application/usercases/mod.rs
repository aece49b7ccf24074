pub mod conversation;
pub mod delivery_scheduler;
