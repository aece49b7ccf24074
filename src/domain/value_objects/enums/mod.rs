pub mod conversation_steps;
pub mod delivery_slots;
pub mod delivery_statuses;
