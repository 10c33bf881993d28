//! Feed Simulator Library
//!
//! Drives a [`feed_audio::MediaFocusCoordinator`] the way a scrolling video
//! feed would: mounts items, moves focus, toggles sound and opens the
//! fullscreen viewer, against simulated players with latency and failures.
//!
//! This library exposes the simulator components for testing purposes.

pub mod config;
pub mod error;
pub mod player;
pub mod script;
pub mod simulator;

// Re-export commonly used types for convenience
pub use config::{SimConfig, SimulationSettings};
pub use error::{Result, SimError};
pub use player::SimulatedPlayer;
pub use script::{AudioAction, Step};
pub use simulator::{PlayerReport, Report, Simulator};
