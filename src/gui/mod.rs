pub mod application;
pub mod executor;
pub mod state;
pub mod types;
