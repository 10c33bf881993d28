//! Shared helpers for feed-audio integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use feed_audio::{
    ControlRef, CoordinatorConfig, FocusError, MediaFocusCoordinator, MemorySettingsStore,
    PlayerControl, Result, SettingsStore,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// One call observed by a [`FakePlayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Mute,
    Unmute,
    Pause,
}

/// Player double
///
/// Applies each command when it is issued (like a native player queueing
/// commands), records it, then optionally fails.
#[derive(Debug)]
pub struct FakePlayer {
    muted: AtomicBool,
    paused: AtomicBool,
    calls: Mutex<Vec<Call>>,
    fail: AtomicBool,
    latency: Option<Duration>,
}

impl FakePlayer {
    /// Fresh players start audible and playing, like a just-mounted video
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            latency: None,
        })
    }

    /// A player whose calls take `latency` to resolve after being issued
    pub fn slow(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            latency: Some(latency),
        })
    }

    /// A player whose every call rejects after being issued
    pub fn failing() -> Arc<Self> {
        let player = Self::new();
        player.fail.store(true, Ordering::SeqCst);
        player
    }

    pub fn control(self: &Arc<Self>) -> ControlRef {
        ControlRef::new(self)
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn outcome(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            Err(FocusError::control("fake", "player released"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlayerControl for FakePlayer {
    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.muted.store(muted, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push(if muted { Call::Mute } else { Call::Unmute });
        self.outcome().await
    }

    async fn pause(&self) -> Result<()> {
        self.paused.store(true, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::Pause);
        self.outcome().await
    }
}

/// Settings store that rejects every call and counts attempts
#[derive(Debug, Default)]
pub struct BrokenSettingsStore {
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

#[async_trait]
impl SettingsStore for BrokenSettingsStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(FocusError::Persistence("storage unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(FocusError::Persistence("storage unavailable".to_string()))
    }
}

/// Coordinator that skips the startup load, over an in-memory store
pub fn coordinator() -> Arc<MediaFocusCoordinator> {
    init_tracing();
    let config = CoordinatorConfig {
        restore_persisted: false,
        ..Default::default()
    };
    MediaFocusCoordinator::new(config, Arc::new(MemorySettingsStore::new()))
        .expect("tokio runtime available")
}

/// Coordinator with a caller-supplied store and config
pub fn coordinator_with(
    config: CoordinatorConfig,
    store: Arc<dyn SettingsStore>,
) -> Arc<MediaFocusCoordinator> {
    init_tracing();
    MediaFocusCoordinator::new(config, store).expect("tokio runtime available")
}
