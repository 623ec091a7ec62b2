//! Inbound actions: the only way a caller can ever
//! mutate a [`crate::state::CardGameState`].
//!
//! Every variant here is untrusted input in the same sense an HTTP body
//! is: the reducer never trusts that a `player_id` is real, that a zone
//! name exists, or that it's that player's turn. Validation happens once,
//! centrally, in [`crate::validate`]. Actions the reducer doesn't
//! recognize, or that fail validation, collapse to a no-op —
//! there is deliberately no error variant for rejected input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardGameAction {
    Join {
        player_id: String,
        name: String,
    },
    Leave {
        player_id: String,
    },
    StartGame,
    PlayCard {
        player_id: String,
        card_id: u64,
        from_zone: String,
        to_zone: String,
    },
    DrawCard {
        player_id: String,
        from_zone: String,
        to_zone: String,
        count: u32,
    },
    Declare {
        player_id: String,
        declaration: String,
        #[serde(default)]
        params: HashMap<String, f64>,
    },
    EndTurn {
        player_id: String,
    },
    AdvancePhase,
    ResetRound,
}

impl CardGameAction {
    /// The acting player, where the action names one. `start_game`,
    /// `advance_phase`, and `reset_round` are session-level and carry no
    /// player.
    #[must_use]
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Self::Join { player_id, .. }
            | Self::Leave { player_id }
            | Self::PlayCard { player_id, .. }
            | Self::DrawCard { player_id, .. }
            | Self::Declare { player_id, .. }
            | Self::EndTurn { player_id } => Some(player_id),
            Self::StartGame | Self::AdvancePhase | Self::ResetRound => None,
        }
    }

    /// A short, stable name for the action kind, used for the action log
    /// and for `declare`'s ruleset-declared-action lookup.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::StartGame => "start_game",
            Self::PlayCard { .. } => "play_card",
            Self::DrawCard { .. } => "draw_card",
            Self::Declare { .. } => "declare",
            Self::EndTurn { .. } => "end_turn",
            Self::AdvancePhase => "advance_phase",
            Self::ResetRound => "reset_round",
        }
    }
}
