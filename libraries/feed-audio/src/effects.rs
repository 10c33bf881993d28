//! Fire-and-forget player effects
//!
//! Every mute/pause call against a player runs as a detached task. Failures are
//! logged and swallowed; only `settle` ever awaits these tasks, so a
//! hung player only leaves its own audible state unresolved.

use crate::control::ControlRef;
use crate::types::PlayerId;
use futures_util::future::join_all;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Single control call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlOp {
    Mute,
    Unmute,
    Pause,
}

/// Spawns effects on a runtime and remembers them until they finish
pub(crate) struct EffectRunner {
    runtime: Handle,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl EffectRunner {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a detached effect
    pub fn spawn<F>(&self, effect: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(effect);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|task| !task.is_finished());
        in_flight.push(handle);
    }

    /// Number of effects spawned and not yet reaped
    pub fn pending(&self) -> usize {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|task| !task.is_finished());
        in_flight.len()
    }

    /// Wait for every effect spawned so far, including effects spawned by effects
    pub async fn settle(&self) {
        loop {
            let batch: Vec<JoinHandle<()>> = {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *in_flight)
            };
            if batch.is_empty() {
                return;
            }
            for result in join_all(batch).await {
                if let Err(e) = result {
                    warn!("Audio focus effect task ended abnormally: {}", e);
                }
            }
        }
    }
}

/// Apply one op to one player, best-effort
pub(crate) async fn apply(id: PlayerId, control: ControlRef, op: ControlOp) {
    let Some(player) = control.upgrade() else {
        debug!("Skipping {:?} on {}: player not mounted", op, id);
        return;
    };

    let result = match op {
        ControlOp::Mute => player.set_muted(true).await,
        ControlOp::Unmute => player.set_muted(false).await,
        ControlOp::Pause => player.pause().await,
    };

    if let Err(e) = result {
        warn!("{:?} failed on player {}: {}", op, id, e);
    }
}

/// Apply `ops` to one player in order
pub(crate) async fn apply_sequence(id: PlayerId, control: ControlRef, ops: Vec<ControlOp>) {
    for op in ops {
        apply(id.clone(), control.clone(), op).await;
    }
}

/// Apply `op` to every target concurrently and wait for all of them
pub(crate) async fn apply_all(targets: Vec<(PlayerId, ControlRef)>, op: ControlOp) {
    join_all(
        targets
            .into_iter()
            .map(|(id, control)| apply(id, control, op)),
    )
    .await;
}
