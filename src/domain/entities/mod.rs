pub mod conversation_states;
pub mod delivery_logs;
pub mod subscribers;
