//! Scroll scripts
//!
//! One step per line:
//!
//! ```text
//! focus 2              # item-2 becomes the active video
//! focus none           # nothing in view
//! audio on|off|toggle
//! fullscreen enter|exit
//! mount viewer overlay # register a new player (kind: feed | overlay)
//! unmount 3
//! remount 1            # swap item-1's player for a fresh instance
//! wait 50              # let 50ms of simulated time pass
//! settle               # wait for every in-flight effect
//! ```
//!
//! A bare number names a feed item (`3` is `item-3`).

use crate::error::{Result, SimError};
use feed_audio::{PlayerId, PlayerKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioAction {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Focus(Option<PlayerId>),
    Audio(AudioAction),
    EnterFullscreen,
    ExitFullscreen,
    Mount { id: PlayerId, kind: PlayerKind },
    Unmount(PlayerId),
    Remount(PlayerId),
    Wait(Duration),
    Settle,
}

/// Id of the `index`th feed item
pub fn item_id(index: usize) -> PlayerId {
    PlayerId::new(format!("item-{index}"))
}

fn player_ref(token: &str) -> PlayerId {
    match token.parse::<usize>() {
        Ok(index) => item_id(index),
        Err(_) => PlayerId::new(token),
    }
}

impl Step {
    /// Parse a single step; `line` is 1-based and only used for errors
    pub fn parse(line: usize, text: &str) -> Result<Option<Self>> {
        let text = text.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            return Ok(None);
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        let step = match words.as_slice() {
            ["focus", "none"] => Step::Focus(None),
            ["focus", target] => Step::Focus(Some(player_ref(target))),
            ["audio", "on"] => Step::Audio(AudioAction::On),
            ["audio", "off"] => Step::Audio(AudioAction::Off),
            ["audio", "toggle"] => Step::Audio(AudioAction::Toggle),
            ["fullscreen", "enter"] => Step::EnterFullscreen,
            ["fullscreen", "exit"] => Step::ExitFullscreen,
            ["mount", target] => Step::Mount {
                id: player_ref(target),
                kind: PlayerKind::Feed,
            },
            ["mount", target, kind] => Step::Mount {
                id: player_ref(target),
                kind: parse_kind(line, kind)?,
            },
            ["unmount", target] => Step::Unmount(player_ref(target)),
            ["remount", target] => Step::Remount(player_ref(target)),
            ["wait", millis] => {
                let millis = millis
                    .parse::<u64>()
                    .map_err(|_| SimError::script(line, format!("invalid wait `{millis}`")))?;
                Step::Wait(Duration::from_millis(millis))
            }
            ["settle"] => Step::Settle,
            _ => return Err(SimError::script(line, format!("unknown step `{text}`"))),
        };

        Ok(Some(step))
    }
}

fn parse_kind(line: usize, kind: &str) -> Result<PlayerKind> {
    match kind {
        "feed" => Ok(PlayerKind::Feed),
        "overlay" => Ok(PlayerKind::FullscreenOverlay),
        other => Err(SimError::script(line, format!("unknown player kind `{other}`"))),
    }
}

/// Parse a whole script, skipping blank and comment-only lines
pub fn parse_script<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Step>> {
    let mut steps = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        if let Some(step) = Step::parse(index + 1, line.as_ref())? {
            steps.push(step);
        }
    }
    Ok(steps)
}

/// Random scrolling: mostly focus moves between neighbours, some sound toggles
pub fn random_steps(items: usize, count: usize, seed: u64) -> Vec<Step> {
    if items == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut position = 0usize;
    let mut steps = Vec::with_capacity(count);

    for _ in 0..count {
        let roll: u8 = rng.gen_range(0..10);
        let step = match roll {
            0 => Step::Audio(AudioAction::Toggle),
            1 => Step::Focus(None),
            _ => {
                position = if rng.gen_bool(0.7) {
                    (position + 1).min(items - 1)
                } else {
                    position.saturating_sub(1)
                };
                Step::Focus(Some(item_id(position)))
            }
        };
        steps.push(step);
    }

    steps
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Focus(None) => write!(f, "focus none"),
            Step::Focus(Some(id)) => write!(f, "focus {id}"),
            Step::Audio(AudioAction::On) => write!(f, "audio on"),
            Step::Audio(AudioAction::Off) => write!(f, "audio off"),
            Step::Audio(AudioAction::Toggle) => write!(f, "audio toggle"),
            Step::EnterFullscreen => write!(f, "fullscreen enter"),
            Step::ExitFullscreen => write!(f, "fullscreen exit"),
            Step::Mount { id, kind } => match kind {
                PlayerKind::Feed => write!(f, "mount {id} feed"),
                PlayerKind::FullscreenOverlay => write!(f, "mount {id} overlay"),
            },
            Step::Unmount(id) => write!(f, "unmount {id}"),
            Step::Remount(id) => write!(f, "remount {id}"),
            Step::Wait(duration) => write!(f, "wait {}", duration.as_millis()),
            Step::Settle => write!(f, "settle"),
        }
    }
}
