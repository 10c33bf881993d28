//! Audio focus coordinator - core orchestration
//!
//! Decides which player in a scrolling feed may emit sound. State fields are
//! updated synchronously inside each call; the mute/pause calls they imply run
//! as detached effects, so players converge on the invariants once those
//! effects settle:
//!
//! 1. At most one registered player is unmuted.
//! 2. With audio disabled, every registered player is muted.
//! 3. With audio enabled, the active player (if registered) is the unmuted one.
//! 4. In fullscreen mode, feed players are paused and muted; only overlay
//!    players may be unmuted.

use crate::{
    control::ControlRef,
    effects::{apply, apply_all, apply_sequence, ControlOp, EffectRunner},
    error::{FocusError, Result},
    listeners::{self, ListenerFn, ListenerHandle, ListenerSet},
    registry::Registry,
    settings::{decode_flag, encode_flag, SettingsStore},
    types::{AudioFocusSnapshot, CoordinatorConfig, FocusMode, PlayerId, PlayerKind},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

/// Synchronous bookkeeping, mutated only under the coordinator's lock
#[derive(Debug)]
struct CoordinatorState {
    audio_enabled: bool,
    /// Set once the audio flag is written through the public API; a late
    /// startup load must not override it.
    audio_set_explicitly: bool,
    active_id: Option<PlayerId>,
    mode: FocusMode,
    registry: Registry,
}

impl CoordinatorState {
    fn new() -> Self {
        Self {
            audio_enabled: false,
            audio_set_explicitly: false,
            active_id: None,
            mode: FocusMode::Feed,
            registry: Registry::new(),
        }
    }

    fn snapshot(&self) -> AudioFocusSnapshot {
        AudioFocusSnapshot {
            audio_enabled: self.audio_enabled,
            active_id: self.active_id.clone(),
            fullscreen_active: self.mode == FocusMode::Fullscreen,
        }
    }

    fn is_active(&self, id: &str) -> bool {
        self.active_id.as_ref().is_some_and(|active| active.as_str() == id)
    }

    /// Whether `id` should be audible right now, given its kind (if registered)
    fn should_have_audio(&self, id: &str, kind: Option<PlayerKind>) -> bool {
        if !self.audio_enabled || !self.is_active(id) {
            return false;
        }
        match self.mode {
            FocusMode::Feed => true,
            FocusMode::Fullscreen => kind == Some(PlayerKind::FullscreenOverlay),
        }
    }
}

type Effect = BoxFuture<'static, ()>;

/// Process-wide audio focus coordinator
///
/// Construct once per app session and share the returned `Arc` with the feed,
/// the fullscreen viewer and any UI that renders the sound toggle.
///
/// Every public method is total: collaborator failures (players, settings
/// store, listeners) are logged and never surface to the caller.
pub struct MediaFocusCoordinator {
    config: CoordinatorConfig,
    state: Mutex<CoordinatorState>,
    listeners: ListenerSet,
    effects: EffectRunner,
    settings: Arc<dyn SettingsStore>,
    /// Bumped by every transition; lets superseded unmutes bail out
    generation: Arc<AtomicU64>,
    /// Lets effects re-read live state without keeping the coordinator alive
    this: Weak<Self>,
}

impl MediaFocusCoordinator {
    /// Create the coordinator on the current tokio runtime
    ///
    /// Starts loading the persisted audio flag in the background; until it
    /// completes, audio is disabled.
    ///
    /// Call this from the UI's current-thread runtime. On a multi-thread
    /// runtime effects may be issued out of call order (a warning is logged).
    pub fn new(config: CoordinatorConfig, settings: Arc<dyn SettingsStore>) -> Result<Arc<Self>> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| FocusError::NoRuntime)?;
        Ok(Self::with_runtime(config, settings, runtime))
    }

    /// Create the coordinator with effects running on `runtime`
    ///
    /// `runtime` should be a current-thread runtime; see [`Self::new`].
    pub fn with_runtime(
        config: CoordinatorConfig,
        settings: Arc<dyn SettingsStore>,
        runtime: Handle,
    ) -> Arc<Self> {
        if runtime.runtime_flavor() != RuntimeFlavor::CurrentThread {
            warn!(
                "Audio focus coordinator on a {:?} runtime: player commands may be issued out of call order",
                runtime.runtime_flavor()
            );
        }

        let restore = config.restore_persisted;
        let coordinator = Arc::new_cyclic(|this| Self {
            config,
            state: Mutex::new(CoordinatorState::new()),
            listeners: ListenerSet::new(),
            effects: EffectRunner::new(runtime),
            settings,
            generation: Arc::new(AtomicU64::new(0)),
            this: this.clone(),
        });

        if restore {
            let load = Self::restore_audio_flag(coordinator.this.clone());
            coordinator.effects.spawn(load);
        }

        coordinator
    }

    // ===== Registry =====

    /// Register a mounted (or about-to-mount) player
    ///
    /// Re-registering an id replaces its entry. The player is immediately
    /// brought in line with the current state, which is how a player that
    /// registers after becoming active catches up.
    pub fn register_player(&self, id: impl Into<PlayerId>, kind: PlayerKind, control: ControlRef) {
        let id = id.into();
        let effect = {
            let mut state = self.lock();
            if state.registry.insert(id.clone(), kind, control.clone()) {
                debug!("Re-registered player {} ({:?})", id, kind);
            } else {
                debug!("Registered player {} ({:?})", id, kind);
            }
            self.catch_up_effect(&state, &id, kind, control)
        };
        self.dispatch(effect);
    }

    /// Forget a player. Clears the active id if it was the active one.
    ///
    /// No control calls are issued; the owner is tearing the player down.
    pub fn unregister_player(&self, id: &str) {
        let snapshot = {
            let mut state = self.lock();
            if state.registry.remove(id).is_none() {
                debug!("Unregister of unknown player {}", id);
            }

            if state.is_active(id) {
                state.active_id = None;
                self.bump_generation();
                debug!("Active player {} unregistered; focus cleared", id);
                Some(state.snapshot())
            } else {
                None
            }
        };

        if let Some(snapshot) = snapshot {
            self.listeners.notify(&snapshot);
        }
    }

    /// Swap a registered player's control, keeping its identity and kind
    ///
    /// Unknown ids are ignored.
    pub fn update_player_ref(&self, id: &str, control: ControlRef) {
        let effect = {
            let mut state = self.lock();
            let Some(kind) = state.registry.replace_control(id, control.clone()) else {
                debug!("Control update for unknown player {}", id);
                return;
            };
            self.catch_up_effect(&state, &PlayerId::from(id), kind, control)
        };
        self.dispatch(effect);
    }

    // ===== Focus =====

    /// Move focus to `id` (or clear it with `None`)
    ///
    /// The previous active player is muted. If audio is enabled and `id` is a
    /// registered player allowed to be audible, every other feed player is
    /// muted and then `id` is unmuted. Unknown ids are recorded and reconciled
    /// when they register.
    pub fn set_active_video(&self, id: Option<PlayerId>) {
        let (effects, snapshot) = {
            let mut state = self.lock();
            if state.active_id == id {
                return;
            }
            self.bump_generation();

            let previous = std::mem::replace(&mut state.active_id, id.clone());
            debug!("Focus {:?} -> {:?}", previous, id);

            let mut effects = Vec::new();
            if let Some(previous) = previous {
                if let Some(entry) = state.registry.get(previous.as_str()) {
                    effects.push(apply(previous, entry.control.clone(), ControlOp::Mute).boxed());
                }
            }
            if let Some(id) = &id {
                effects.extend(self.focus_effect(&state, id));
            }

            (effects, state.snapshot())
        };

        self.dispatch_all(effects);
        self.listeners.notify(&snapshot);
    }

    /// Clear focus
    pub fn clear_active_video(&self) {
        self.set_active_video(None);
    }

    // ===== Global audio =====

    /// Flip the global sound toggle; returns the new value
    pub fn toggle_audio(&self) -> bool {
        self.change_audio(|enabled| !enabled)
    }

    /// Set the global sound toggle
    pub fn set_audio_enabled(&self, enabled: bool) {
        self.change_audio(|_| enabled);
    }

    fn change_audio(&self, next: impl FnOnce(bool) -> bool) -> bool {
        let (enabled, effects, snapshot) = {
            let mut state = self.lock();
            let enabled = next(state.audio_enabled);
            state.audio_enabled = enabled;
            state.audio_set_explicitly = true;
            self.bump_generation();
            debug!("Audio {}", if enabled { "enabled" } else { "disabled" });

            let mut effects = vec![self.persist_effect(enabled)];
            effects.extend(self.audio_effects(&state));
            (enabled, effects, state.snapshot())
        };

        self.dispatch_all(effects);
        self.listeners.notify(&snapshot);
        enabled
    }

    // ===== Fullscreen =====

    /// Open a fullscreen overlay: pause and mute every feed player
    pub fn enter_fullscreen_mode(&self) {
        let (effects, snapshot) = {
            let mut state = self.lock();
            state.mode = FocusMode::Fullscreen;
            self.bump_generation();
            debug!("Entering fullscreen mode");

            let effects: Vec<Effect> = state
                .registry
                .of_kind(PlayerKind::Feed)
                .into_iter()
                .map(|(id, control)| {
                    apply_sequence(id, control, vec![ControlOp::Pause, ControlOp::Mute]).boxed()
                })
                .collect();
            (effects, state.snapshot())
        };

        self.dispatch_all(effects);
        self.listeners.notify(&snapshot);
    }

    /// Close the fullscreen overlay: mute every overlay player
    ///
    /// Feed players are not resumed; the feed re-establishes focus itself
    /// since the mounted items may have changed meanwhile.
    pub fn exit_fullscreen_mode(&self) {
        let (effect, snapshot) = {
            let mut state = self.lock();
            state.mode = FocusMode::Feed;
            self.bump_generation();
            debug!("Exiting fullscreen mode");

            let overlays = state.registry.of_kind(PlayerKind::FullscreenOverlay);
            (apply_all(overlays, ControlOp::Mute).boxed(), state.snapshot())
        };

        self.dispatch(Some(effect));
        self.listeners.notify(&snapshot);
    }

    // ===== Queries =====

    pub fn is_audio_enabled(&self) -> bool {
        self.lock().audio_enabled
    }

    pub fn active_video_id(&self) -> Option<PlayerId> {
        self.lock().active_id.clone()
    }

    pub fn is_in_fullscreen_mode(&self) -> bool {
        self.lock().mode == FocusMode::Fullscreen
    }

    pub fn mode(&self) -> FocusMode {
        self.lock().mode
    }

    pub fn snapshot(&self) -> AudioFocusSnapshot {
        self.lock().snapshot()
    }

    /// Whether `id` should currently render with sound
    pub fn should_video_have_audio(&self, id: &str) -> bool {
        let state = self.lock();
        state.should_have_audio(id, state.registry.kind_of(id))
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.lock().registry.contains(id)
    }

    pub fn registered_count(&self) -> usize {
        self.lock().registry.len()
    }

    /// Effects spawned and not finished yet
    pub fn pending_effects(&self) -> usize {
        self.effects.pending()
    }

    /// Wait for every in-flight effect, including the startup load
    ///
    /// Never cancels anything; a hung player call keeps this waiting.
    pub async fn settle(&self) {
        self.effects.settle().await;
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ===== Listeners =====

    /// Subscribe to state changes
    ///
    /// The callback runs immediately with the current state, then after every
    /// state-mutating call. Callbacks run outside the coordinator's lock and may
    /// call back into it.
    pub fn add_listener<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&AudioFocusSnapshot) + Send + Sync + 'static,
    {
        let listener: ListenerFn = Arc::new(callback);
        let handle = self.listeners.subscribe(Arc::clone(&listener));
        listeners::invoke(&listener, &self.snapshot());
        handle
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ===== Internals =====

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn dispatch(&self, effect: Option<Effect>) {
        if let Some(effect) = effect {
            self.effects.spawn(effect);
        }
    }

    fn dispatch_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.effects.spawn(effect);
        }
    }

    /// Mute every other feed player, then unmute `id`
    ///
    /// `None` unless audio is enabled and `id` is registered and allowed sound
    /// in the current mode. The unmute is dropped if, once the mutes resolve,
    /// `id` is no longer the registered active player with sound allowed.
    fn focus_effect(&self, state: &CoordinatorState, id: &PlayerId) -> Option<Effect> {
        let entry = state.registry.get(id.as_str())?;
        if !state.should_have_audio(id.as_str(), Some(entry.kind)) {
            return None;
        }

        let others = state.registry.of_kind_except(PlayerKind::Feed, id.as_str());
        let target = (id.clone(), entry.control.clone());
        let coordinator = self.this.clone();
        let generation = Arc::clone(&self.generation);
        let started_at = generation.load(Ordering::SeqCst);
        let cancel_superseded = self.config.cancel_superseded_unmutes;

        Some(
            async move {
                apply_all(others, ControlOp::Mute).await;
                if cancel_superseded && generation.load(Ordering::SeqCst) != started_at {
                    debug!("Skipping unmute of {}: superseded by a newer transition", target.0);
                    return;
                }
                let wanted = coordinator
                    .upgrade()
                    .is_some_and(|c| c.unmute_still_wanted(target.0.as_str()));
                if !wanted {
                    debug!("Skipping unmute of {}: no longer focused with sound", target.0);
                    return;
                }
                apply(target.0, target.1, ControlOp::Unmute).await;
            }
            .boxed(),
        )
    }

    /// Live re-check run by a focus effect right before its unmute
    fn unmute_still_wanted(&self, id: &str) -> bool {
        let state = self.lock();
        let kind = state.registry.kind_of(id);
        kind.is_some() && state.should_have_audio(id, kind)
    }

    /// Effects implied by the current audio flag
    fn audio_effects(&self, state: &CoordinatorState) -> Vec<Effect> {
        if state.audio_enabled {
            state
                .active_id
                .as_ref()
                .and_then(|id| self.focus_effect(state, id))
                .into_iter()
                .collect()
        } else {
            vec![apply_all(state.registry.all(), ControlOp::Mute).boxed()]
        }
    }

    /// Bring a freshly registered or re-referenced player in line with state
    fn catch_up_effect(
        &self,
        state: &CoordinatorState,
        id: &PlayerId,
        kind: PlayerKind,
        control: ControlRef,
    ) -> Option<Effect> {
        if !control.is_attached() {
            return None;
        }

        if state.mode == FocusMode::Fullscreen && kind == PlayerKind::Feed {
            return Some(
                apply_sequence(id.clone(), control, vec![ControlOp::Pause, ControlOp::Mute])
                    .boxed(),
            );
        }

        if state.should_have_audio(id.as_str(), Some(kind)) {
            return self.focus_effect(state, id);
        }

        Some(apply(id.clone(), control, ControlOp::Mute).boxed())
    }

    /// Fire-and-forget write of the audio flag
    fn persist_effect(&self, enabled: bool) -> Effect {
        let settings = Arc::clone(&self.settings);
        let key = self.config.settings_key.clone();
        async move {
            if let Err(e) = settings.set(&key, encode_flag(enabled)).await {
                warn!("Failed to persist {}={}: {}", key, enabled, e);
            }
        }
        .boxed()
    }

    /// Startup load of the persisted audio flag
    async fn restore_audio_flag(coordinator: Weak<Self>) {
        let (settings, key) = match coordinator.upgrade() {
            Some(c) => (Arc::clone(&c.settings), c.config.settings_key.clone()),
            None => return,
        };

        let enabled = match settings.get(&key).await {
            Ok(Some(raw)) => decode_flag(&key, &raw),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to load {}: {}; audio stays disabled", key, e);
                false
            }
        };

        if let Some(coordinator) = coordinator.upgrade() {
            coordinator.apply_restored_flag(enabled);
        }
    }

    fn apply_restored_flag(&self, enabled: bool) {
        let (effects, snapshot) = {
            let mut state = self.lock();
            if state.audio_set_explicitly {
                debug!("Ignoring restored audio flag: already set this session");
                return;
            }
            info!("Restored audio flag: {}", enabled);
            if state.audio_enabled == enabled {
                return;
            }

            state.audio_enabled = enabled;
            self.bump_generation();
            (self.audio_effects(&state), state.snapshot())
        };

        self.dispatch_all(effects);
        self.listeners.notify(&snapshot);
    }
}

impl std::fmt::Debug for MediaFocusCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFocusCoordinator")
            .field("config", &self.config)
            .field("state", &*self.lock())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
