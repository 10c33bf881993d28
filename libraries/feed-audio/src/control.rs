//! Player control seam
//!
//! Abstracts the platform video player so the coordinator can mute and pause
//! whatever the UI mounted (native player, web element, simulator, test double).

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Weak};

/// Controllable media player
///
/// Both operations are asynchronous and may fail, typically because the
/// underlying player was released. The coordinator logs failures and moves on.
#[async_trait]
pub trait PlayerControl: Send + Sync {
    /// Suppress (`true`) or restore (`false`) audio output without stopping playback
    async fn set_muted(&self, muted: bool) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;
}

/// Non-owning reference to a player control
///
/// The UI owns the player; the coordinator only keeps a weak back-reference
/// and treats an expired one as a no-op target.
#[derive(Clone, Default)]
pub struct ControlRef(Option<Weak<dyn PlayerControl>>);

impl ControlRef {
    /// Reference a live control without taking ownership
    pub fn new<P: PlayerControl + 'static>(control: &Arc<P>) -> Self {
        let weak: Weak<dyn PlayerControl> = Arc::downgrade(control) as Weak<dyn PlayerControl>;
        Self(Some(weak))
    }

    /// Reference an already type-erased control
    pub fn from_dyn(control: &Arc<dyn PlayerControl>) -> Self {
        Self(Some(Arc::downgrade(control)))
    }

    /// Registered but not mounted yet
    pub fn detached() -> Self {
        Self(None)
    }

    /// Upgrade to the live control, if the owner still holds it
    pub fn upgrade(&self) -> Option<Arc<dyn PlayerControl>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    /// Whether a control was ever attached (it may still have expired)
    pub fn is_attached(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.0 {
            None => "detached",
            Some(weak) if weak.strong_count() > 0 => "live",
            Some(_) => "expired",
        };
        f.debug_tuple("ControlRef").field(&state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullPlayer;

    #[async_trait]
    impl PlayerControl for NullPlayer {
        async fn set_muted(&self, _muted: bool) -> Result<()> {
            Ok(())
        }

        async fn pause(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reference_expires_with_owner() {
        let player = Arc::new(NullPlayer);
        let control = ControlRef::new(&player);
        assert!(control.upgrade().is_some());
        assert_eq!(format!("{control:?}"), "ControlRef(\"live\")");

        drop(player);
        assert!(control.upgrade().is_none());
        assert!(control.is_attached());
        assert_eq!(format!("{control:?}"), "ControlRef(\"expired\")");
    }

    #[test]
    fn detached_reference_has_no_control() {
        let control = ControlRef::detached();
        assert!(!control.is_attached());
        assert!(control.upgrade().is_none());
    }

    #[test]
    fn reference_does_not_keep_player_alive() {
        let player: Arc<dyn PlayerControl> = Arc::new(NullPlayer);
        let control = ControlRef::from_dyn(&player);
        assert_eq!(Arc::strong_count(&player), 1);
        drop(control);
        assert_eq!(Arc::strong_count(&player), 1);
    }
}
