//! Persisted sound toggle: startup load, writes, and failure handling

mod common;

use async_trait::async_trait;
use common::{coordinator_with, BrokenSettingsStore, FakePlayer};
use feed_audio::{
    AudioFocusSnapshot, CoordinatorConfig, FocusError, JsonFileSettingsStore,
    MemorySettingsStore, PlayerKind, Result, SettingsStore,
};
use mockall::mock;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

const KEY: &str = "media.audio_enabled";

mock! {
    pub Store {}

    #[async_trait]
    impl SettingsStore for Store {
        async fn get(&self, key: &str) -> Result<Option<String>>;
        async fn set(&self, key: &str, value: &str) -> Result<()>;
    }
}

#[tokio::test]
async fn persisted_flag_is_restored() {
    let store = Arc::new(MemorySettingsStore::with_value(KEY, "true"));
    let c = coordinator_with(CoordinatorConfig::default(), store);

    // Disabled until the load completes
    assert!(!c.is_audio_enabled());
    c.settle().await;
    assert!(c.is_audio_enabled());
}

#[tokio::test]
async fn restored_flag_unmutes_current_focus() {
    let store = Arc::new(MemorySettingsStore::with_value(KEY, "true"));
    let c = coordinator_with(CoordinatorConfig::default(), store);
    let a = FakePlayer::new();
    let b = FakePlayer::new();
    c.register_player("a", PlayerKind::Feed, a.control());
    c.register_player("b", PlayerKind::Feed, b.control());
    c.set_active_video(Some("b".into()));

    c.settle().await;

    assert!(a.is_muted());
    assert!(!b.is_muted());
}

#[tokio::test]
async fn restore_notifies_listeners() {
    let store = Arc::new(MemorySettingsStore::with_value(KEY, "true"));
    let c = coordinator_with(CoordinatorConfig::default(), store);
    let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _handle = c.add_listener(move |s: &AudioFocusSnapshot| {
        sink.lock().unwrap().push(s.audio_enabled)
    });

    c.settle().await;
    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn explicit_choice_beats_late_load() {
    let store = Arc::new(MemorySettingsStore::with_value(KEY, "true"));
    let c = coordinator_with(CoordinatorConfig::default(), Arc::clone(&store) as Arc<dyn SettingsStore>);

    c.set_audio_enabled(false);
    c.settle().await;

    assert!(!c.is_audio_enabled());
    assert_eq!(store.value(KEY).as_deref(), Some("false"));
}

#[tokio::test]
async fn toggle_writes_through() {
    let store = Arc::new(MemorySettingsStore::new());
    let c = coordinator_with(CoordinatorConfig::default(), Arc::clone(&store) as Arc<dyn SettingsStore>);
    c.settle().await;
    assert!(!c.is_audio_enabled());

    assert!(c.toggle_audio());
    c.settle().await;
    assert_eq!(store.value(KEY).as_deref(), Some("true"));

    assert!(!c.toggle_audio());
    c.settle().await;
    assert_eq!(store.value(KEY).as_deref(), Some("false"));
}

#[tokio::test]
async fn unreadable_value_defaults_to_disabled() {
    let store = Arc::new(MemorySettingsStore::with_value(KEY, "loud"));
    let c = coordinator_with(CoordinatorConfig::default(), store);
    c.settle().await;
    assert!(!c.is_audio_enabled());
}

#[tokio::test]
async fn broken_store_never_surfaces() {
    let store = Arc::new(BrokenSettingsStore::default());
    let c = coordinator_with(CoordinatorConfig::default(), Arc::clone(&store) as Arc<dyn SettingsStore>);
    let a = FakePlayer::new();
    c.register_player("a", PlayerKind::Feed, a.control());
    c.set_active_video(Some("a".into()));
    c.settle().await;
    assert!(!c.is_audio_enabled());
    assert_eq!(store.reads.load(Ordering::SeqCst), 1);

    // Each toggle attempts its own write; a failed one is not retried
    c.toggle_audio();
    c.settle().await;
    assert!(c.is_audio_enabled());
    assert!(!a.is_muted());
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);

    c.toggle_audio();
    c.settle().await;
    assert!(!c.is_audio_enabled());
    assert_eq!(store.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn custom_key_is_used_for_reads_and_writes() {
    let mut store = MockStore::new();
    store
        .expect_get()
        .withf(|key| key == "feed.sound")
        .times(1)
        .returning(|_| Ok(Some("true".to_string())));
    store
        .expect_set()
        .withf(|key, value| key == "feed.sound" && value == "false")
        .times(1)
        .returning(|_, _| Ok(()));

    let config = CoordinatorConfig {
        settings_key: "feed.sound".to_string(),
        ..Default::default()
    };
    let c = coordinator_with(config, Arc::new(store));
    c.settle().await;
    assert!(c.is_audio_enabled());

    c.set_audio_enabled(false);
    c.settle().await;
    drop(c);
}

#[tokio::test]
async fn restore_can_be_disabled() {
    let mut store = MockStore::new();
    store.expect_get().times(0);
    store
        .expect_set()
        .times(1)
        .returning(|_, _| Err(FocusError::Persistence("read-only".to_string())));

    let config = CoordinatorConfig {
        restore_persisted: false,
        ..Default::default()
    };
    let c = coordinator_with(config, Arc::new(store));
    c.set_audio_enabled(true);
    c.settle().await;
    assert!(c.is_audio_enabled());
    drop(c);
}

#[tokio::test]
async fn flag_survives_restart_through_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");

    {
        let store = Arc::new(JsonFileSettingsStore::new(&path));
        let c = coordinator_with(CoordinatorConfig::default(), store);
        c.settle().await;
        assert!(!c.is_audio_enabled());
        c.toggle_audio();
        c.settle().await;
    }

    let store = Arc::new(JsonFileSettingsStore::new(&path));
    let c = coordinator_with(CoordinatorConfig::default(), store);
    c.settle().await;
    assert!(c.is_audio_enabled());
}
