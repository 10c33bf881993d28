//! Property-based tests for the audio focus coordinator
//!
//! Uses proptest to drive random register/unregister/focus/toggle/fullscreen
//! sequences and checks the invariants once every effect has settled. Players
//! get random latencies so effects from different calls overlap; each case runs
//! on a paused-clock runtime.

mod common;

use common::{coordinator, FakePlayer};
use feed_audio::{PlayerId, PlayerKind};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const SLOTS: usize = 6;

#[derive(Debug, Clone)]
enum Op {
    Register(usize, PlayerKind, Option<u64>),
    Unregister(usize),
    Focus(Option<usize>),
    Toggle,
    SetAudio(bool),
    EnterFullscreen,
    ExitFullscreen,
}

fn arbitrary_kind() -> impl Strategy<Value = PlayerKind> {
    prop_oneof![
        3 => Just(PlayerKind::Feed),
        1 => Just(PlayerKind::FullscreenOverlay),
    ]
}

/// Call latency in ms; `None` resolves immediately
fn arbitrary_latency() -> impl Strategy<Value = Option<u64>> {
    prop_oneof![
        2 => Just(None),
        1 => (1u64..50).prop_map(Some),
    ]
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..SLOTS, arbitrary_kind(), arbitrary_latency())
            .prop_map(|(slot, kind, latency)| Op::Register(slot, kind, latency)),
        2 => (0..SLOTS).prop_map(Op::Unregister),
        5 => proptest::option::of(0..SLOTS).prop_map(Op::Focus),
        2 => Just(Op::Toggle),
        1 => any::<bool>().prop_map(Op::SetAudio),
        1 => Just(Op::EnterFullscreen),
        1 => Just(Op::ExitFullscreen),
    ]
}

fn arbitrary_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arbitrary_op(), 1..60)
}

/// Everything except sound-toggle changes, so audio stays off
fn setup_op() -> impl Strategy<Value = Op> {
    arbitrary_op().prop_filter("leaves audio untouched", |op| {
        !matches!(op, Op::Toggle | Op::SetAudio(_))
    })
}

fn slot_id(slot: usize) -> PlayerId {
    PlayerId::new(format!("item-{slot}"))
}

type Players = BTreeMap<usize, (PlayerKind, Arc<FakePlayer>)>;

/// Final state of one registered player
struct Settled {
    kind: PlayerKind,
    muted: bool,
    paused: bool,
}

/// Final state after settling
struct Outcome {
    audio_enabled: bool,
    fullscreen: bool,
    players: Vec<Settled>,
}

impl Outcome {
    fn audible(&self) -> usize {
        self.players.iter().filter(|p| !p.muted).count()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("runtime")
}

fn muted_flags(registered: &Players) -> Vec<bool> {
    registered.values().map(|(_, p)| p.is_muted()).collect()
}

fn apply_ops(c: &feed_audio::MediaFocusCoordinator, registered: &mut Players, ops: &[Op]) {
    for op in ops {
        match op {
            Op::Register(slot, kind, latency) => {
                let player = match latency {
                    Some(ms) => FakePlayer::slow(Duration::from_millis(*ms)),
                    None => FakePlayer::new(),
                };
                c.register_player(slot_id(*slot), *kind, player.control());
                registered.insert(*slot, (*kind, player));
            }
            Op::Unregister(slot) => {
                c.unregister_player(slot_id(*slot).as_str());
                registered.remove(slot);
            }
            Op::Focus(slot) => c.set_active_video(slot.map(slot_id)),
            Op::Toggle => {
                c.toggle_audio();
            }
            Op::SetAudio(enabled) => c.set_audio_enabled(*enabled),
            Op::EnterFullscreen => c.enter_fullscreen_mode(),
            Op::ExitFullscreen => c.exit_fullscreen_mode(),
        }
    }
}

fn run(ops: Vec<Op>) -> Outcome {
    runtime().block_on(async {
        let c = coordinator();
        let mut registered: Players = BTreeMap::new();
        apply_ops(&c, &mut registered, &ops);
        c.settle().await;

        Outcome {
            audio_enabled: c.is_audio_enabled(),
            fullscreen: c.is_in_fullscreen_mode(),
            players: registered
                .values()
                .map(|(kind, p)| Settled {
                    kind: *kind,
                    muted: p.is_muted(),
                    paused: p.is_paused(),
                })
                .collect(),
        }
    })
}

proptest! {
    /// Property: at most one registered player is audible once effects settle
    #[test]
    fn at_most_one_audible_player(ops in arbitrary_ops()) {
        let outcome = run(ops);
        prop_assert!(outcome.audible() <= 1, "{} players audible", outcome.audible());
    }

    /// Property: with sound off, every registered player is muted
    #[test]
    fn sound_off_mutes_everything(ops in arbitrary_ops()) {
        let outcome = run(ops);
        if !outcome.audio_enabled {
            prop_assert_eq!(outcome.audible(), 0);
        }
    }

    /// Property: in fullscreen, every feed player is paused and muted
    #[test]
    fn fullscreen_silences_feed(ops in arbitrary_ops()) {
        let outcome = run(ops);
        if outcome.fullscreen {
            for player in outcome.players.iter().filter(|p| p.kind == PlayerKind::Feed) {
                prop_assert!(player.muted && player.paused);
            }
        }
    }

    /// Property: turning sound on then off restores each player's muted state
    #[test]
    fn sound_on_off_round_trip(setup in prop::collection::vec(setup_op(), 1..40)) {
        let (before, after) = runtime().block_on(async {
            let c = coordinator();
            let mut registered: Players = BTreeMap::new();
            apply_ops(&c, &mut registered, &setup);
            c.settle().await;
            let before = muted_flags(&registered);

            c.set_audio_enabled(true);
            c.settle().await;
            c.set_audio_enabled(false);
            c.settle().await;
            let after = muted_flags(&registered);

            (before, after)
        });
        prop_assert_eq!(before, after);
    }

    /// Property: sync queries always agree with the last call made
    #[test]
    fn last_focus_wins(ops in arbitrary_ops(), last in proptest::option::of(0..SLOTS)) {
        runtime().block_on(async {
            let c = coordinator();
            let mut registered: Players = BTreeMap::new();
            apply_ops(&c, &mut registered, &ops);
            c.set_active_video(last.map(slot_id));
            assert_eq!(c.active_video_id(), last.map(slot_id));
            c.settle().await;
        });
    }
}
