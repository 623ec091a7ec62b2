//! The ruleset document: an immutable, strictly-parsed input describing a
//! single card game.
//!
//! Ruleset *schema* validation — beyond the strictness required here — is
//! explicitly a black-box concern the host owns; this module
//! only guarantees a handful of structural invariants: unknown
//! and missing keys both fail, `players.min <= players.max`, at least one
//! zone/role/phase, and well-formed `version`/`slug` strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Ruleset {
    pub meta: Meta,
    pub deck: DeckSpec,
    #[serde(rename = "cardValues", default)]
    pub card_values: HashMap<String, CardValue>,
    pub zones: Vec<ZoneSpec>,
    pub roles: Vec<RoleSpec>,
    pub phases: Vec<PhaseSpec>,
    pub scoring: ScoringSpec,
    #[serde(default)]
    pub visibility: Vec<VisibilityRule>,
    #[serde(rename = "initialVariables", default)]
    pub initial_variables: HashMap<String, f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    pub name: String,
    pub slug: String,
    pub version: String,
    pub author: String,
    pub players: PlayerRange,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlayerRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum DeckSpec {
    Preset { preset: DeckPreset, copies: u32 },
    Custom { cards: Vec<CardTemplate> },
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeckPreset {
    Standard52,
    Standard54,
    Uno108,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CardTemplate {
    pub suit: String,
    pub rank: String,
}

/// A rank's contribution toward `hand_value`. Ranks absent from
/// `Ruleset::card_values` contribute 0.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum CardValue {
    Fixed { value: i64 },
    Dual { low: i64, high: i64 },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ZoneSpec {
    pub name: String,
    pub visibility: Visibility,
    pub owners: Vec<String>,
    #[serde(rename = "maxCards", default)]
    pub max_cards: Option<usize>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartialRule {
    FirstCardOnly,
    LastCardOnly,
    FaceUpOnly,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visibility {
    Public,
    OwnerOnly,
    Hidden,
    /// `rule` is kept as a raw string rather than a closed enum so that an
    /// unrecognized rule name can fall through to the conservative
    /// "hide everything" default the per-viewer filter falls back to,
    /// instead of failing to parse the ruleset at all.
    Partial { rule: String },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoleCount {
    Fixed(u32),
    /// The sentinel string `"per_player"`: one zone instance per human
    /// player, validated in [`Ruleset::load`].
    PerHumanPlayer(String),
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoleSpec {
    pub name: String,
    #[serde(rename = "isHuman")]
    pub is_human: bool,
    pub count: RoleCount,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Automatic,
    TurnBased,
    AllPlayers,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrder {
    Clockwise,
    Counterclockwise,
    Fixed,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ActionDecl {
    pub name: String,
    pub condition: Option<String>,
    #[serde(default)]
    pub effects: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransitionSpec {
    pub to: String,
    pub when: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PhaseSpec {
    pub name: String,
    pub kind: PhaseKind,
    #[serde(default)]
    pub actions: Vec<ActionDecl>,
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
    #[serde(rename = "automaticSequence", default)]
    pub automatic_sequence: Vec<String>,
    #[serde(rename = "turnOrder", default)]
    pub turn_order: Option<TurnOrder>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScoringSpec {
    pub method: String,
    #[serde(rename = "winCondition")]
    pub win_condition: String,
    #[serde(rename = "bustCondition", default)]
    pub bust_condition: Option<String>,
    #[serde(rename = "tieCondition", default)]
    pub tie_condition: Option<String>,
    /// Parsed and carried, but never wired into the reducer: an
    /// intentional no-op until a future revision connects it.
    #[serde(rename = "autoEndTurnCondition", default)]
    pub auto_end_turn_condition: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PhaseOverride {
    pub phase: String,
    pub visibility: Visibility,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VisibilityRule {
    pub zone: String,
    pub visibility: Visibility,
    #[serde(rename = "phaseOverride", default)]
    pub phase_override: Option<PhaseOverride>,
}

impl Ruleset {
    /// Parse and strictly validate a ruleset document. Unknown and
    /// missing keys both fail, as do semantically invalid documents
    /// (bad version/slug strings, empty zones/roles/phases, an inverted
    /// player range).
    pub fn load(raw_json: &str) -> Result<Self, ParseError> {
        let ruleset: Self = serde_json::from_str(raw_json).map_err(classify_json_error)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    fn validate(&self) -> Result<(), ParseError> {
        if !is_semver(&self.meta.version) {
            return Err(ParseError::InvalidRuleset {
                field: "meta.version".into(),
                reason: format!("`{}` does not match ^\\d+\\.\\d+\\.\\d+$", self.meta.version),
            });
        }
        if !is_slug(&self.meta.slug) {
            return Err(ParseError::InvalidRuleset {
                field: "meta.slug".into(),
                reason: format!("`{}` does not match ^[a-z0-9-]+$", self.meta.slug),
            });
        }
        if self.meta.players.min < 1 || self.meta.players.min > self.meta.players.max {
            return Err(ParseError::InvalidRuleset {
                field: "meta.players".into(),
                reason: format!(
                    "min ({}) must be >= 1 and <= max ({})",
                    self.meta.players.min, self.meta.players.max
                ),
            });
        }
        if self.zones.is_empty() {
            return Err(ParseError::InvalidRuleset {
                field: "zones".into(),
                reason: "must contain at least one zone".into(),
            });
        }
        if self.roles.is_empty() {
            return Err(ParseError::InvalidRuleset {
                field: "roles".into(),
                reason: "must contain at least one role".into(),
            });
        }
        if self.phases.is_empty() {
            return Err(ParseError::InvalidRuleset {
                field: "phases".into(),
                reason: "must contain at least one phase".into(),
            });
        }
        for role in &self.roles {
            if let RoleCount::PerHumanPlayer(tag) = &role.count {
                if tag != "per_player" {
                    return Err(ParseError::InvalidRuleset {
                        field: format!("roles[{}].count", role.name),
                        reason: format!("unrecognized count sentinel `{tag}`"),
                    });
                }
            }
        }
        if let DeckSpec::Custom { cards } = &self.deck {
            if cards.is_empty() {
                return Err(ParseError::InvalidRuleset {
                    field: "deck.cards".into(),
                    reason: "custom deck must list at least one card template".into(),
                });
            }
        }
        Ok(())
    }

    /// The ruleset's first declared phase, used by `create_initial_state`.
    #[must_use]
    pub fn first_phase(&self) -> &str {
        &self.phases[0].name
    }

    #[must_use]
    pub fn phase(&self, name: &str) -> Option<&PhaseSpec> {
        self.phases.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn zone(&self, name: &str) -> Option<&ZoneSpec> {
        self.zones.iter().find(|z| z.name == name)
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Number of seats with a `count` of per-player, i.e. human players.
    #[must_use]
    pub fn human_role_names(&self) -> Vec<&str> {
        self.roles
            .iter()
            .filter(|r| r.is_human)
            .map(|r| r.name.as_str())
            .collect()
    }
}

fn classify_json_error(err: serde_json::Error) -> ParseError {
    let msg = err.to_string();
    if let Some(field) = msg.strip_prefix("unknown field `").and_then(|s| s.split('`').next()) {
        return ParseError::UnknownKey(field.to_string());
    }
    if let Some(field) = msg.strip_prefix("missing field `").and_then(|s| s.split('`').next()) {
        return ParseError::MissingKey(field.to_string());
    }
    ParseError::Json(msg)
}

fn is_semver(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "meta": {"name": "Test", "slug": "test", "version": "1.0.0", "author": "me",
                      "players": {"min": 1, "max": 2}},
            "deck": {"kind": "preset", "preset": "standard_52", "copies": 1},
            "cardValues": {},
            "zones": [{"name": "draw_pile", "visibility": {"kind": "hidden"}, "owners": []}],
            "roles": [{"name": "player", "isHuman": true, "count": "per_player"}],
            "phases": [{"name": "play", "kind": "turn_based", "actions": [], "transitions": []}],
            "scoring": {"method": "0", "winCondition": "false"}
        }"#
    }

    #[test]
    fn loads_minimal_ruleset() {
        let ruleset = Ruleset::load(minimal_json()).expect("should parse");
        assert_eq!(ruleset.meta.slug, "test");
        assert_eq!(ruleset.first_phase(), "play");
    }

    #[test]
    fn rejects_unknown_key() {
        let bad = minimal_json().replace("\"author\": \"me\",", "\"author\": \"me\", \"bogus\": 1,");
        let err = Ruleset::load(&bad).unwrap_err();
        assert!(matches!(err, ParseError::UnknownKey(_)), "{err:?}");
    }

    #[test]
    fn rejects_bad_version() {
        let bad = minimal_json().replace("1.0.0", "v1");
        let err = Ruleset::load(&bad).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRuleset { .. }));
    }

    #[test]
    fn rejects_inverted_player_range() {
        let bad = minimal_json().replace("\"min\": 1, \"max\": 2", "\"min\": 3, \"max\": 2");
        let err = Ruleset::load(&bad).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRuleset { .. }));
    }

    #[test]
    fn rejects_empty_zones() {
        let bad = minimal_json().replace(
            r#""zones": [{"name": "draw_pile", "visibility": {"kind": "hidden"}, "owners": []}],"#,
            r#""zones": [],"#,
        );
        let err = Ruleset::load(&bad).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRuleset { .. }));
    }
}
