//! Deck instantiation from a ruleset's `deck` declaration.
//!
//! Card ids are assigned sequentially starting at 0 in generation order,
//! which is also shuffle order before any `shuffle` effect runs — this
//! is what makes two reducers built from the same ruleset and seed
//! produce bit-identical initial states.

use crate::card::{Card, CardId};
use crate::ruleset::{CardTemplate, DeckPreset, DeckSpec, Ruleset};

const STANDARD_SUITS: [&str; 4] = ["spades", "hearts", "diamonds", "clubs"];
const STANDARD_RANKS: [&str; 13] = [
    "ace", "2", "3", "4", "5", "6", "7", "8", "9", "10", "jack", "queen", "king",
];

const UNO_COLORS: [&str; 4] = ["red", "yellow", "green", "blue"];

#[must_use]
pub fn build_deck(ruleset: &Ruleset) -> Vec<Card> {
    let templates = match &ruleset.deck {
        DeckSpec::Preset { preset, copies } => {
            let mut templates = Vec::new();
            for _ in 0..*copies {
                templates.extend(preset_templates(*preset));
            }
            templates
        }
        DeckSpec::Custom { cards } => cards.clone(),
    };

    templates
        .into_iter()
        .enumerate()
        .map(|(i, template)| Card {
            id: CardId(i as u64),
            suit: template.suit,
            rank: template.rank,
            face_up: false,
        })
        .collect()
}

fn preset_templates(preset: DeckPreset) -> Vec<CardTemplate> {
    match preset {
        DeckPreset::Standard52 => standard_52(),
        DeckPreset::Standard54 => {
            let mut cards = standard_52();
            cards.push(CardTemplate {
                suit: "joker".into(),
                rank: "joker".into(),
            });
            cards.push(CardTemplate {
                suit: "joker".into(),
                rank: "joker".into(),
            });
            cards
        }
        DeckPreset::Uno108 => uno_108(),
    }
}

fn standard_52() -> Vec<CardTemplate> {
    let mut cards = Vec::with_capacity(52);
    for suit in STANDARD_SUITS {
        for rank in STANDARD_RANKS {
            cards.push(CardTemplate {
                suit: suit.to_string(),
                rank: rank.to_string(),
            });
        }
    }
    cards
}

fn uno_108() -> Vec<CardTemplate> {
    let mut cards = Vec::with_capacity(108);
    for color in UNO_COLORS {
        cards.push(CardTemplate {
            suit: color.to_string(),
            rank: "0".to_string(),
        });
        for rank in ["1", "2", "3", "4", "5", "6", "7", "8", "9", "skip", "reverse", "draw_two"] {
            cards.push(CardTemplate {
                suit: color.to_string(),
                rank: rank.to_string(),
            });
            cards.push(CardTemplate {
                suit: color.to_string(),
                rank: rank.to_string(),
            });
        }
    }
    for _ in 0..4 {
        cards.push(CardTemplate {
            suit: crate::card::WILD_SUIT.to_string(),
            rank: "wild".to_string(),
        });
    }
    for _ in 0..4 {
        cards.push(CardTemplate {
            suit: crate::card::WILD_SUIT.to_string(),
            rank: "wild_draw_four".to_string(),
        });
    }
    cards
}
