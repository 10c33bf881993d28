//! Simulated video player
//!
//! Stands in for a native video element: commands take effect when issued,
//! resolve after a fixed latency, and reject at a configured rate. A rejected
//! command leaves the player's state untouched.

use async_trait::async_trait;
use feed_audio::{ControlRef, FocusError, PlayerControl, PlayerId, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct SimulatedPlayer {
    id: PlayerId,
    muted: AtomicBool,
    paused: AtomicBool,
    latency: Duration,
    failure_rate: f64,
    rng: Mutex<StdRng>,
    calls: AtomicUsize,
    failures: AtomicUsize,
}

impl SimulatedPlayer {
    /// A freshly mounted player: audible and playing
    pub fn new(id: PlayerId, latency: Duration, failure_rate: f64, seed: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            latency,
            failure_rate,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        })
    }

    pub fn control(self: &Arc<Self>) -> ControlRef {
        ControlRef::new(self)
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Commands received, including rejected ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    fn roll_failure(&self) -> bool {
        if self.failure_rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_bool(self.failure_rate.min(1.0))
    }

    async fn run(&self, op: &str, apply: impl FnOnce(&Self)) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fails = self.roll_failure();
        if !fails {
            apply(self);
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if fails {
            self.failures.fetch_add(1, Ordering::SeqCst);
            warn!(player = %self.id, op, "Simulated player rejected command");
            return Err(FocusError::control(
                self.id.as_str(),
                format!("{op} rejected by simulated player"),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl PlayerControl for SimulatedPlayer {
    async fn set_muted(&self, muted: bool) -> Result<()> {
        debug!(player = %self.id, muted, "set_muted");
        self.run("set_muted", |player| player.muted.store(muted, Ordering::SeqCst))
            .await
    }

    async fn pause(&self) -> Result<()> {
        debug!(player = %self.id, "pause");
        self.run("pause", |player| player.paused.store(true, Ordering::SeqCst))
            .await
    }
}
