pub mod config;
pub mod recognition;
pub mod state;
