pub mod handlers;
pub mod repo;
pub mod state_machine;
