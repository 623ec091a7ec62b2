//! Concrete card instances.
//!
//! Suits and ranks are arbitrary strings rather than a closed enum: a
//! ruleset's custom deck can name anything (Uno's `wild` suit, a tarot
//! rank), which a fixed-game enum couldn't represent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable, session-unique card identifier.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card#{}", self.0)
    }
}

/// A single card instance living in some zone.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub suit: String,
    pub rank: String,
    pub face_up: bool,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.face_up {
            write!(f, "{}/{}", self.rank, self.suit)
        } else {
            write!(f, "??")
        }
    }
}

/// The conventional suit name for Uno-style wild cards, used by
/// `has_playable_card` / `card_matches_top` to treat a wild as always
/// playable regardless of the discard pile's top suit.
pub const WILD_SUIT: &str = "wild";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_display_hides_face_down() {
        let card = Card {
            id: CardId(1),
            suit: "Hearts".into(),
            rank: "Ace".into(),
            face_up: false,
        };
        assert_eq!(card.to_string(), "??");
    }

    #[test]
    fn card_display_shows_face_up() {
        let card = Card {
            id: CardId(2),
            suit: "Hearts".into(),
            rank: "Ace".into(),
            face_up: true,
        };
        assert_eq!(card.to_string(), "Ace/Hearts");
    }
}
