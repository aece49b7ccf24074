pub mod conversation_states;
pub mod delivery_ledger;
pub mod subscribers;
