//! Scripted feed session
//!
//! Owns the simulated players (the coordinator only holds weak references)
//! and replays script steps against one coordinator.

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::player::SimulatedPlayer;
use crate::script::{item_id, AudioAction, Step};
use feed_audio::{
    AudioFocusSnapshot, JsonFileSettingsStore, MediaFocusCoordinator, MemorySettingsStore,
    PlayerId, PlayerKind, SettingsStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

struct Mounted {
    kind: PlayerKind,
    player: Arc<SimulatedPlayer>,
}

pub struct Simulator {
    coordinator: Arc<MediaFocusCoordinator>,
    players: BTreeMap<PlayerId, Mounted>,
    latency: Duration,
    failure_rate: f64,
    seed: u64,
    mounted_total: u64,
}

/// Final state of one mounted player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerReport {
    pub id: PlayerId,
    pub kind: PlayerKind,
    pub muted: bool,
    pub paused: bool,
    pub calls: usize,
    pub failures: usize,
}

/// Coordinator and player state after a run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub snapshot: AudioFocusSnapshot,
    pub players: Vec<PlayerReport>,
}

impl Report {
    pub fn audible(&self) -> Vec<&PlayerId> {
        self.players
            .iter()
            .filter(|player| !player.muted)
            .map(|player| &player.id)
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.players.iter().map(|player| player.failures).sum()
    }

    /// Single-audible, sound-off and fullscreen rules over the settled state
    pub fn check_invariants(&self) -> Result<()> {
        let audible = self.audible();
        if audible.len() > 1 {
            return Err(SimError::Invariant(format!(
                "{} players audible: {:?}",
                audible.len(),
                audible
            )));
        }

        if !self.snapshot.audio_enabled {
            if let Some(id) = audible.first() {
                return Err(SimError::Invariant(format!(
                    "sound is off but {id} is audible"
                )));
            }
        }

        if self.snapshot.fullscreen_active {
            let playing = self
                .players
                .iter()
                .filter(|player| player.kind == PlayerKind::Feed)
                .find(|player| !player.muted || !player.paused);
            if let Some(player) = playing {
                return Err(SimError::Invariant(format!(
                    "fullscreen is open but feed player {} is {}",
                    player.id,
                    if player.muted { "playing" } else { "audible" }
                )));
            }
        }

        Ok(())
    }
}

impl Simulator {
    /// Build the coordinator and settings store; must run inside a tokio runtime
    pub fn new(config: &SimConfig) -> Result<Self> {
        let settings: Arc<dyn SettingsStore> = match &config.simulation.settings_path {
            Some(path) => {
                info!("Persisting settings to {:?}", path);
                Arc::new(JsonFileSettingsStore::new(path))
            }
            None => Arc::new(MemorySettingsStore::new()),
        };

        let coordinator = MediaFocusCoordinator::new(config.coordinator.clone(), settings)?;
        coordinator.add_listener(|snapshot: &AudioFocusSnapshot| {
            debug!(
                audio_enabled = snapshot.audio_enabled,
                active = ?snapshot.active_id,
                fullscreen = snapshot.fullscreen_active,
                "Audio focus changed"
            );
        });

        Ok(Self {
            coordinator,
            players: BTreeMap::new(),
            latency: Duration::from_millis(config.simulation.latency_ms),
            failure_rate: config.simulation.failure_rate,
            seed: config.simulation.seed,
            mounted_total: 0,
        })
    }

    pub fn coordinator(&self) -> &Arc<MediaFocusCoordinator> {
        &self.coordinator
    }

    pub fn player(&self, id: &str) -> Option<&Arc<SimulatedPlayer>> {
        self.players.get(id).map(|mounted| &mounted.player)
    }

    /// Mount `item-0` .. `item-{count-1}` as feed players
    pub fn mount_feed(&mut self, count: usize) {
        for index in 0..count {
            self.mount(item_id(index), PlayerKind::Feed);
        }
        info!("Mounted {} feed items", count);
    }

    fn spawn_player(&mut self, id: &PlayerId) -> Arc<SimulatedPlayer> {
        self.mounted_total += 1;
        // Distinct but reproducible failure sequence per mounted instance
        let seed = self.seed.wrapping_mul(31).wrapping_add(self.mounted_total);
        SimulatedPlayer::new(id.clone(), self.latency, self.failure_rate, seed)
    }

    fn mount(&mut self, id: PlayerId, kind: PlayerKind) {
        let player = self.spawn_player(&id);
        self.coordinator
            .register_player(id.clone(), kind, player.control());
        self.players.insert(id, Mounted { kind, player });
    }

    /// Apply one step
    pub async fn apply(&mut self, step: &Step) {
        debug!("Step: {}", step);
        match step {
            Step::Focus(id) => self.coordinator.set_active_video(id.clone()),
            Step::Audio(AudioAction::On) => self.coordinator.set_audio_enabled(true),
            Step::Audio(AudioAction::Off) => self.coordinator.set_audio_enabled(false),
            Step::Audio(AudioAction::Toggle) => {
                self.coordinator.toggle_audio();
            }
            Step::EnterFullscreen => self.coordinator.enter_fullscreen_mode(),
            Step::ExitFullscreen => self.coordinator.exit_fullscreen_mode(),
            Step::Mount { id, kind } => self.mount(id.clone(), *kind),
            Step::Unmount(id) => {
                self.coordinator.unregister_player(id.as_str());
                self.players.remove(id);
            }
            Step::Remount(id) => {
                if !self.players.contains_key(id) {
                    warn!("Cannot remount {}: not mounted", id);
                    return;
                }
                let player = self.spawn_player(id);
                self.coordinator
                    .update_player_ref(id.as_str(), player.control());
                if let Some(mounted) = self.players.get_mut(id) {
                    // Previous instance drops here; its weak reference expires
                    mounted.player = player;
                }
            }
            Step::Wait(duration) => tokio::time::sleep(*duration).await,
            Step::Settle => self.coordinator.settle().await,
        }
    }

    /// Apply every step, then wait for all effects to land
    pub async fn run(&mut self, steps: &[Step]) -> Report {
        for step in steps {
            self.apply(step).await;
        }
        self.coordinator.settle().await;
        self.report()
    }

    pub fn report(&self) -> Report {
        Report {
            snapshot: self.coordinator.snapshot(),
            players: self
                .players
                .iter()
                .map(|(id, mounted)| PlayerReport {
                    id: id.clone(),
                    kind: mounted.kind,
                    muted: mounted.player.is_muted(),
                    paused: mounted.player.is_paused(),
                    calls: mounted.player.calls(),
                    failures: mounted.player.failures(),
                })
                .collect(),
        }
    }
}
