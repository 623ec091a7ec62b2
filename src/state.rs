//! The serializable game state threaded through every reducer call.
//!
//! `CardGameState` is the *entire* mutable surface of a running game: no
//! PRNG stream, no registry handle, no ruleset reference lives inside it.
//! Two states compare equal (via `#[derive(PartialEq)]`) iff they'd look
//! identical to every viewer, which is what the determinism tests in
//! `tests/` lean on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A tagged union, not a bare enum — `in_progress`,
/// `paused`, and `finished` each carry the injected logical-clock
/// timestamp of the transition that produced them, and `finished` also
/// carries the winning player, if any (set by the `end_game` builtin).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameStatus {
    WaitingForPlayers,
    InProgress { started_at: u64 },
    Paused { paused_at: u64 },
    Finished {
        finished_at: u64,
        winner_id: Option<String>,
    },
}

impl GameStatus {
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDirection {
    Clockwise,
    Counterclockwise,
}

impl TurnDirection {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Clockwise => Self::Counterclockwise,
            Self::Counterclockwise => Self::Clockwise,
        }
    }
}

/// A single named zone's live contents. The zone's static configuration
/// (visibility, owners, capacity) lives in the ruleset, not here — only
/// the cards that move through it are state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ZoneState {
    pub cards: Vec<Card>,
}

impl ZoneState {
    #[must_use]
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }
}

/// An entry in the append-only action log. Rejected actions are
/// never appended — only actions that actually changed the state are.
///
/// `phase_transition` carries the `(from, to, guard)` triple for any
/// phase transition the action's processing fired;
/// empty when the action didn't cause one.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ResolvedAction {
    pub turn_number: u64,
    /// `None` for session-level actions with no acting player
    /// (`start_game`, `advance_phase`, `reset_round`).
    pub player_id: Option<String>,
    pub action_name: String,
    /// Injected logical clock (the only value the engine may
    /// inject), incremented once per processed action by the reducer.
    pub timestamp: u64,
    pub phase_transitions: Vec<PhaseTransitionLogEntry>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PhaseTransitionLogEntry {
    pub from_phase: String,
    pub to_phase: String,
    pub guard: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PlayerState {
    pub role: String,
    pub connected: bool,
    /// Display name supplied by the `join` action; never used by
    /// expressions or effects, purely a view-layer convenience.
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CardGameState {
    pub session_id: String,
    pub status: GameStatus,
    pub players: HashMap<String, PlayerState>,
    /// Seat order, fixed at game start; indexes into this (not into
    /// `players`, which has no stable iteration order) are what
    /// `current_player_index` refers to.
    pub player_order: Vec<String>,
    pub zones: HashMap<String, ZoneState>,
    pub current_phase: String,
    pub current_player_index: usize,
    pub turn_direction: TurnDirection,
    pub turn_number: u64,
    pub turns_taken_this_phase: u32,
    pub scores: HashMap<String, f64>,
    pub variables: HashMap<String, f64>,
    pub action_log: Vec<ResolvedAction>,
    /// Monotonically incremented once per accepted action;
    /// rejected actions leave it untouched.
    pub version: u64,
}

impl CardGameState {
    #[must_use]
    pub fn current_player(&self) -> Option<&str> {
        self.player_order
            .get(self.current_player_index)
            .map(String::as_str)
    }

    #[must_use]
    pub fn zone(&self, name: &str) -> Option<&ZoneState> {
        self.zones.get(name)
    }

    pub fn zone_mut(&mut self, name: &str) -> Option<&mut ZoneState> {
        self.zones.get_mut(name)
    }

    /// Total card count across every zone, used by the card-conservation
    /// invariant check in `tests/`.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.zones.values().map(|z| z.cards.len()).sum()
    }
}
