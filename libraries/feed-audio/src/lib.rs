//! Feed Audio - single audible item coordination
//!
//! Governs which video in a continuously scrolling feed may emit sound, the
//! way short-video feeds behave: one audible item at a time, one global sound
//! toggle, and a fullscreen viewer that silences the feed underneath it.
//!
//! This crate provides:
//! - A player registry holding non-owning references to UI-owned players
//! - Focus transitions (mute previous, unmute new when sound is on)
//! - A persisted global sound toggle
//! - A fullscreen state machine (pause + mute the feed while an overlay plays)
//! - Synchronous listeners for render-time state
//!
//! # Architecture
//!
//! The coordinator never constructs, owns or awaits a player:
//! - State fields change synchronously inside each call
//! - Mute/pause calls run as detached tokio tasks; failures are logged
//! - Players converge once those tasks settle
//!
//! Platform code supplies players via [`PlayerControl`] and persistence via
//! [`SettingsStore`]. Run the coordinator on the UI's event loop (a
//! current-thread runtime) so player commands are issued in call order.
//!
//! # Example
//!
//! ```rust
//! use feed_audio::{
//!     ControlRef, CoordinatorConfig, MediaFocusCoordinator, MemorySettingsStore,
//!     PlayerControl, PlayerKind, Result,
//! };
//! use std::sync::Arc;
//!
//! struct NativePlayer;
//!
//! #[async_trait::async_trait]
//! impl PlayerControl for NativePlayer {
//!     async fn set_muted(&self, _muted: bool) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     async fn pause(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let coordinator = MediaFocusCoordinator::new(
//!     CoordinatorConfig::default(),
//!     Arc::new(MemorySettingsStore::new()),
//! )?;
//!
//! // Feed item mounts
//! let player = Arc::new(NativePlayer);
//! coordinator.register_player("post-1", PlayerKind::Feed, ControlRef::new(&player));
//!
//! // Scroll position logic reports focus; the user taps the sound toggle
//! coordinator.set_active_video(Some("post-1".into()));
//! coordinator.set_audio_enabled(true);
//! assert!(coordinator.should_video_have_audio("post-1"));
//!
//! coordinator.settle().await;
//! # Ok(())
//! # }
//! ```

mod control;
mod coordinator;
mod effects;
mod error;
mod listeners;
mod registry;
pub mod settings;
pub mod types;

// Public exports
pub use control::{ControlRef, PlayerControl};
pub use coordinator::MediaFocusCoordinator;
pub use error::{FocusError, Result};
pub use listeners::{ListenerFn, ListenerHandle};
pub use settings::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore};
pub use types::{AudioFocusSnapshot, CoordinatorConfig, FocusMode, PlayerId, PlayerKind};
