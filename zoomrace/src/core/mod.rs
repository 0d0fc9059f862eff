pub mod boost;
pub mod config;
pub mod handle_race;
pub mod placement;
pub mod race;
pub mod racer;
pub mod session;
pub mod state_handler;
pub mod timers;
