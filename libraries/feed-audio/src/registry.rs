//! Registry of mounted players keyed by id

use crate::control::ControlRef;
use crate::types::{PlayerId, PlayerKind};
use std::collections::HashMap;

/// One registered player
#[derive(Debug, Clone)]
pub(crate) struct PlayerEntry {
    pub kind: PlayerKind,
    pub control: ControlRef,
}

/// Live players, churned at scroll frequency
#[derive(Debug, Default)]
pub(crate) struct Registry {
    players: HashMap<PlayerId, PlayerEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `id`
    ///
    /// Returns true if an entry with the same id was replaced.
    pub fn insert(&mut self, id: PlayerId, kind: PlayerKind, control: ControlRef) -> bool {
        self.players
            .insert(id, PlayerEntry { kind, control })
            .is_some()
    }

    pub fn remove(&mut self, id: &str) -> Option<PlayerEntry> {
        self.players.remove(id)
    }

    /// Swap the control of an existing entry, keeping its kind
    ///
    /// Returns the entry's kind, or `None` if `id` is not registered.
    pub fn replace_control(&mut self, id: &str, control: ControlRef) -> Option<PlayerKind> {
        let entry = self.players.get_mut(id)?;
        entry.control = control;
        Some(entry.kind)
    }

    pub fn get(&self, id: &str) -> Option<&PlayerEntry> {
        self.players.get(id)
    }

    pub fn kind_of(&self, id: &str) -> Option<PlayerKind> {
        self.players.get(id).map(|entry| entry.kind)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Every player as `(id, control)`
    pub fn all(&self) -> Vec<(PlayerId, ControlRef)> {
        self.players
            .iter()
            .map(|(id, entry)| (id.clone(), entry.control.clone()))
            .collect()
    }

    /// Players of one kind as `(id, control)`
    pub fn of_kind(&self, kind: PlayerKind) -> Vec<(PlayerId, ControlRef)> {
        self.players
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(id, entry)| (id.clone(), entry.control.clone()))
            .collect()
    }

    /// Players of one kind except `skip`
    pub fn of_kind_except(&self, kind: PlayerKind, skip: &str) -> Vec<(PlayerId, ControlRef)> {
        self.players
            .iter()
            .filter(|(id, entry)| entry.kind == kind && id.as_str() != skip)
            .map(|(id, entry)| (id.clone(), entry.control.clone()))
            .collect()
    }
}
