//! Per-viewer state filter: projects the full
//! [`CardGameState`] down to what a single player is allowed to see.
//!
//! Every zone's visibility is resolved independently, in priority order:
//! an exact zone-name match whose phase override fires; an exact match
//! with no firing override (its base `visibility`); a base-name
//! (`zone:<i>` stripped to `zone`) match whose override fires; and
//! finally the zone's own declared default. A card that visibility
//! hides is replaced with `None` rather than removed, so counts are
//! always visible even when contents aren't.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::error::InvariantViolation;
use crate::ruleset::{PhaseKind, Ruleset, Visibility, ZoneSpec};
use crate::state::{CardGameState, GameStatus};

/// One zone as a single viewer sees it: `None` entries are cards whose
/// existence is known but whose identity is hidden.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ZoneView {
    pub cards: Vec<Option<Card>>,
}

/// The projection of a whole [`CardGameState`] for one player, as
/// returned by `create_player_view`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerView {
    pub viewer_id: String,
    pub status: GameStatus,
    pub zones: HashMap<String, ZoneView>,
    /// `player_score:<i>` / `result:<i>` keys are remapped to the
    /// concrete player id at seat `i`; every other key passes through
    /// unchanged (e.g. `dealer_score`, `cumulative_score_<i>`).
    pub scores: HashMap<String, f64>,
    pub current_phase: String,
    pub current_player_index: usize,
    /// True when `current_phase` is `all_players`, or when the viewer
    /// occupies `current_player_index`.
    pub is_my_turn: bool,
}

/// Build `viewer_id`'s view of `state`. Errors fatally if
/// `viewer_id` doesn't name a seated player — unlike action rejection,
/// asking for a nonexistent viewer's perspective is a host-side bug, not
/// untrusted input this layer is expected to absorb silently.
pub fn create_player_view(
    state: &CardGameState,
    ruleset: &Ruleset,
    viewer_id: &str,
) -> Result<PlayerView, InvariantViolation> {
    let viewer_index = state
        .player_order
        .iter()
        .position(|id| id == viewer_id)
        .ok_or_else(|| InvariantViolation::UnknownPlayer(viewer_id.to_string()))?;
    let viewer_role = state
        .players
        .get(viewer_id)
        .map(|p| p.role.as_str())
        .unwrap_or_default();

    let mut zones = HashMap::with_capacity(state.zones.len());
    for (name, zone_state) in &state.zones {
        let zone_spec = ruleset.zone(name).or_else(|| ruleset.zone(base_name(name)));
        let default_visibility = zone_spec.map(|z| &z.visibility);
        let visibility = effective_visibility(ruleset, name, default_visibility, &state.current_phase);
        let cards = project_zone(name, &zone_state.cards, &visibility, viewer_index, viewer_role, zone_spec);
        zones.insert(name.clone(), ZoneView { cards });
    }

    let scores = remap_score_keys(&state.scores, &state.player_order);

    let is_my_turn = match ruleset.phase(&state.current_phase).map(|p| p.kind) {
        Some(PhaseKind::AllPlayers) => true,
        _ => state.current_player_index == viewer_index,
    };

    Ok(PlayerView {
        viewer_id: viewer_id.to_string(),
        status: state.status.clone(),
        zones,
        scores,
        current_phase: state.current_phase.clone(),
        current_player_index: state.current_player_index,
        is_my_turn,
    })
}

fn base_name(zone_name: &str) -> &str {
    zone_name.split(':').next().unwrap_or(zone_name)
}

/// Resolve a zone's effective visibility against the ruleset's
/// `visibility` rule list, per the priority order documented at the top
/// of this module. `zone_default` is `None` for a per-player zone whose
/// base name wasn't declared (shouldn't happen for a validated ruleset,
/// but conservatively hides rather than panicking).
fn effective_visibility(
    ruleset: &Ruleset,
    zone_name: &str,
    zone_default: Option<&Visibility>,
    current_phase: &str,
) -> Visibility {
    let base = base_name(zone_name);

    if let Some(rule) = ruleset.visibility.iter().find(|r| r.zone == zone_name) {
        if let Some(ov) = &rule.phase_override {
            if ov.phase == current_phase {
                return ov.visibility.clone();
            }
        }
        return rule.visibility.clone();
    }

    if let Some(rule) = ruleset.visibility.iter().find(|r| r.zone == base) {
        if let Some(ov) = &rule.phase_override {
            if ov.phase == current_phase {
                return ov.visibility.clone();
            }
        }
    }

    zone_default.cloned().unwrap_or(Visibility::Hidden)
}

fn project_zone(
    zone_name: &str,
    cards: &[Card],
    visibility: &Visibility,
    viewer_index: usize,
    viewer_role: &str,
    zone_spec: Option<&ZoneSpec>,
) -> Vec<Option<Card>> {
    match visibility {
        Visibility::Public => cards.iter().cloned().map(Some).collect(),
        Visibility::Hidden => cards.iter().map(|_| None).collect(),
        Visibility::OwnerOnly => {
            let owns = owns_zone(zone_name, zone_spec, viewer_index, viewer_role);
            cards
                .iter()
                .map(|c| if owns { Some(c.clone()) } else { None })
                .collect()
        }
        Visibility::Partial { rule } => match rule.as_str() {
            "first_card_only" => cards
                .iter()
                .enumerate()
                .map(|(i, c)| if i == 0 { Some(c.clone()) } else { None })
                .collect(),
            "last_card_only" => {
                let last = cards.len().saturating_sub(1);
                cards
                    .iter()
                    .enumerate()
                    .map(|(i, c)| if !cards.is_empty() && i == last { Some(c.clone()) } else { None })
                    .collect()
            }
            "face_up_only" => cards
                .iter()
                .map(|c| if c.face_up { Some(c.clone()) } else { None })
                .collect(),
            // Unrecognized partial rule: conservatively hide everything
            // rather than fail the whole view.
            _ => cards.iter().map(|_| None).collect(),
        },
    }
}

/// A numeric `zone:<i>` suffix names the owning seat directly; otherwise
/// ownership falls back to the zone's declared `owners` role list.
fn owns_zone(zone_name: &str, zone_spec: Option<&ZoneSpec>, viewer_index: usize, viewer_role: &str) -> bool {
    if let Some((_, suffix)) = zone_name.rsplit_once(':') {
        if let Ok(seat) = suffix.parse::<usize>() {
            return seat == viewer_index;
        }
    }
    zone_spec.is_some_and(|z| z.owners.iter().any(|o| o == viewer_role))
}

fn remap_score_keys(scores: &HashMap<String, f64>, player_order: &[String]) -> HashMap<String, f64> {
    let mut out = HashMap::with_capacity(scores.len());
    for (key, value) in scores {
        let remapped = remap_indexed_key(key, "player_score:", player_order)
            .or_else(|| remap_indexed_key(key, "result:", player_order));
        out.insert(remapped.unwrap_or_else(|| key.clone()), *value);
    }
    out
}

fn remap_indexed_key(key: &str, prefix: &str, player_order: &[String]) -> Option<String> {
    let index: usize = key.strip_prefix(prefix)?.parse().ok()?;
    let player_id = player_order.get(index)?;
    Some(format!("{prefix}{player_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardId;
    use crate::state::{PlayerState, TurnDirection, ZoneState};

    fn ruleset() -> Ruleset {
        Ruleset::load(
            r#"{
                "meta": {"name": "T", "slug": "t", "version": "1.0.0", "author": "me",
                          "players": {"min": 1, "max": 2}},
                "deck": {"kind": "preset", "preset": "standard_52", "copies": 1},
                "cardValues": {},
                "zones": [
                    {"name": "hand", "visibility": {"kind": "owner_only"}, "owners": ["player"]},
                    {"name": "discard", "visibility": {"kind": "public"}, "owners": []},
                    {"name": "dealer_hand", "visibility": {"kind": "partial", "rule": "first_card_only"}, "owners": ["dealer"]}
                ],
                "roles": [
                    {"name": "player", "isHuman": true, "count": "per_player"},
                    {"name": "dealer", "isHuman": false, "count": 1}
                ],
                "phases": [
                    {"name": "play", "kind": "turn_based", "actions": [], "transitions": []},
                    {"name": "reveal", "kind": "automatic", "transitions": []}
                ],
                "scoring": {"method": "0", "winCondition": "false"},
                "visibility": [
                    {"zone": "dealer_hand", "visibility": {"kind": "partial", "rule": "first_card_only"},
                     "phaseOverride": {"phase": "reveal", "visibility": {"kind": "public"}}}
                ]
            }"#,
        )
        .unwrap()
    }

    fn card(id: u64) -> Card {
        Card {
            id: CardId(id),
            suit: "hearts".into(),
            rank: "ace".into(),
            face_up: false,
        }
    }

    fn base_state() -> CardGameState {
        let mut players = HashMap::new();
        players.insert(
            "p0".to_string(),
            PlayerState {
                role: "player".into(),
                connected: true,
                name: "P0".into(),
            },
        );
        players.insert(
            "p1".to_string(),
            PlayerState {
                role: "player".into(),
                connected: true,
                name: "P1".into(),
            },
        );
        let mut zones = HashMap::new();
        zones.insert("hand:0".to_string(), ZoneState { cards: vec![card(1), card(2)] });
        zones.insert("hand:1".to_string(), ZoneState { cards: vec![card(3)] });
        zones.insert("discard".to_string(), ZoneState { cards: vec![card(4)] });
        zones.insert("dealer_hand".to_string(), ZoneState { cards: vec![card(5), card(6)] });
        CardGameState {
            session_id: "s".into(),
            status: GameStatus::InProgress { started_at: 0 },
            players,
            player_order: vec!["p0".to_string(), "p1".to_string()],
            zones,
            current_phase: "play".into(),
            current_player_index: 0,
            turn_direction: TurnDirection::Clockwise,
            turn_number: 0,
            turns_taken_this_phase: 0,
            scores: HashMap::new(),
            variables: HashMap::new(),
            action_log: Vec::new(),
            version: 0,
        }
    }

    #[test]
    fn owner_only_zone_hides_other_seats() {
        let ruleset = ruleset();
        let state = base_state();
        let view = create_player_view(&state, &ruleset, "p0").unwrap();
        let mine = &view.zones["hand:0"].cards;
        assert!(mine.iter().all(Option::is_some));
        let theirs = &view.zones["hand:1"].cards;
        assert!(theirs.iter().all(Option::is_none));
    }

    #[test]
    fn public_zone_always_visible() {
        let ruleset = ruleset();
        let state = base_state();
        let view = create_player_view(&state, &ruleset, "p1").unwrap();
        assert!(view.zones["discard"].cards.iter().all(Option::is_some));
    }

    #[test]
    fn partial_first_card_only_reveals_a_single_card() {
        let ruleset = ruleset();
        let state = base_state();
        let view = create_player_view(&state, &ruleset, "p0").unwrap();
        let dealer = &view.zones["dealer_hand"].cards;
        assert!(dealer[0].is_some());
        assert!(dealer[1].is_none());
    }

    #[test]
    fn phase_override_makes_dealer_hand_public_during_reveal() {
        let ruleset = ruleset();
        let mut state = base_state();
        state.current_phase = "reveal".to_string();
        let view = create_player_view(&state, &ruleset, "p0").unwrap();
        assert!(view.zones["dealer_hand"].cards.iter().all(Option::is_some));
    }

    #[test]
    fn unknown_viewer_is_a_fatal_error() {
        let ruleset = ruleset();
        let state = base_state();
        let err = create_player_view(&state, &ruleset, "ghost").unwrap_err();
        assert_eq!(err, InvariantViolation::UnknownPlayer("ghost".to_string()));
    }

    #[test]
    fn score_keys_are_remapped_to_player_ids() {
        let ruleset = ruleset();
        let mut state = base_state();
        state.scores.insert("player_score:0".to_string(), 21.0);
        state.scores.insert("result:1".to_string(), 1.0);
        state.scores.insert("dealer_score".to_string(), 17.0);
        let view = create_player_view(&state, &ruleset, "p0").unwrap();
        assert_eq!(view.scores.get("player_score:p0"), Some(&21.0));
        assert_eq!(view.scores.get("result:p1"), Some(&1.0));
        assert_eq!(view.scores.get("dealer_score"), Some(&17.0));
    }

    #[test]
    fn is_my_turn_matches_current_player_index() {
        let ruleset = ruleset();
        let state = base_state();
        let view0 = create_player_view(&state, &ruleset, "p0").unwrap();
        let view1 = create_player_view(&state, &ruleset, "p1").unwrap();
        assert!(view0.is_my_turn);
        assert!(!view1.is_my_turn);
    }
}
