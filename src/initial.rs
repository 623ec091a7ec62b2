//! Initial-state factory: builds the zero state a session
//! starts from, from `(ruleset, sessionId, players, seed)`.
//!
//! Card ids are already a seed-independent function of generation order
//! (see [`crate::deck::build_deck`]), so the `seed` parameter here exists
//! only to keep the factory's signature matching
//! `create_initial_state(ruleset, sessionId, players, seed)` — the actual
//! seeded stream lives in the reducer's [`crate::prng::Prng`], not here.

use std::collections::HashMap;

use log::warn;

use crate::deck::build_deck;
use crate::ruleset::{RoleCount, Ruleset, ZoneSpec};
use crate::state::{CardGameState, GameStatus, PlayerState, TurnDirection, ZoneState};

/// The conventional zone every bundled ruleset deals its deck into.
const DRAW_PILE: &str = "draw_pile";

/// Build the zero state for a new session: deck instantiated and placed
/// face-down in `draw_pile`, per-player zones created for every seated
/// human player, `variables` copied from the ruleset's
/// `initialVariables`, `status = waiting_for_players`.
///
/// `players` is the ordered seat list the host has already assembled
/// (lobby/seating is the host's concern, not the engine's) —
/// seats are fixed for the life of the session; a later `join` action
/// only reconnects a seat already listed here (see [`crate::reducer`]).
#[must_use]
pub fn create_initial_state(
    ruleset: &Ruleset,
    session_id: impl Into<String>,
    players: &[(String, String)],
    seed: u64,
) -> CardGameState {
    let _ = seed;
    let deck = build_deck(ruleset);
    let assigned = assign_roles(ruleset, players);
    let player_order: Vec<String> = assigned.iter().map(|(id, _, _)| id.clone()).collect();

    let mut players_map = HashMap::with_capacity(assigned.len());
    for (id, name, role) in &assigned {
        players_map.insert(
            id.clone(),
            PlayerState {
                role: role.clone(),
                connected: true,
                name: name.clone(),
            },
        );
    }

    let seat_count = player_order.len();
    let mut zones = HashMap::with_capacity(ruleset.zones.len() * seat_count.max(1));
    for zone in &ruleset.zones {
        if zone_is_per_player(ruleset, zone) {
            for i in 0..seat_count {
                zones.insert(format!("{}:{i}", zone.name), ZoneState::empty());
            }
        } else {
            zones.insert(zone.name.clone(), ZoneState::empty());
        }
    }

    let card_count = deck.len();
    match zones.get_mut(DRAW_PILE) {
        Some(draw_pile) => draw_pile.cards = deck,
        None => warn!(
            "ruleset `{}` declares no zone named `{DRAW_PILE}`; {card_count} instantiated cards were discarded",
            ruleset.meta.slug
        ),
    }

    CardGameState {
        session_id: session_id.into(),
        status: GameStatus::WaitingForPlayers,
        players: players_map,
        player_order,
        zones,
        current_phase: ruleset.first_phase().to_string(),
        current_player_index: 0,
        turn_direction: TurnDirection::Clockwise,
        turn_number: 0,
        turns_taken_this_phase: 0,
        scores: HashMap::new(),
        variables: ruleset.initial_variables.clone(),
        action_log: Vec::new(),
        version: 0,
    }
}

/// Assign each incoming `(player_id, name)` to a human role in ruleset
/// declaration order: fixed-count human roles claim their seats first,
/// then the first per-player-count role absorbs everyone left over.
/// Bundled rulesets declare exactly one human role, so this ordering
/// rarely matters in practice.
fn assign_roles(ruleset: &Ruleset, players: &[(String, String)]) -> Vec<(String, String, String)> {
    let mut assigned = Vec::with_capacity(players.len());
    let mut iter = players.iter();
    for role in ruleset.roles.iter().filter(|r| r.is_human) {
        match role.count {
            RoleCount::Fixed(n) => {
                for _ in 0..n {
                    let Some((id, name)) = iter.next() else { break };
                    assigned.push((id.clone(), name.clone(), role.name.clone()));
                }
            }
            RoleCount::PerHumanPlayer(_) => {
                for (id, name) in iter.by_ref() {
                    assigned.push((id.clone(), name.clone(), role.name.clone()));
                }
            }
        }
    }
    assigned
}

/// A zone is per-player iff any of its
/// owner roles has a per-player-count (`"per_player"`).
fn zone_is_per_player(ruleset: &Ruleset, zone: &ZoneSpec) -> bool {
    zone.owners.iter().any(|owner| {
        matches!(
            ruleset.role(owner).map(|r| &r.count),
            Some(RoleCount::PerHumanPlayer(_))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset() -> Ruleset {
        Ruleset::load(
            r#"{
                "meta": {"name": "T", "slug": "t", "version": "1.0.0", "author": "me",
                          "players": {"min": 1, "max": 4}},
                "deck": {"kind": "preset", "preset": "standard_52", "copies": 1},
                "cardValues": {},
                "zones": [
                    {"name": "draw_pile", "visibility": {"kind": "hidden"}, "owners": []},
                    {"name": "hand", "visibility": {"kind": "owner_only"}, "owners": ["player"]},
                    {"name": "discard", "visibility": {"kind": "public"}, "owners": []}
                ],
                "roles": [{"name": "player", "isHuman": true, "count": "per_player"}],
                "phases": [{"name": "play", "kind": "turn_based", "actions": [], "transitions": []}],
                "scoring": {"method": "0", "winCondition": "false"},
                "initialVariables": {"running_total": 0}
            }"#,
        )
        .unwrap()
    }

    fn players(n: usize) -> Vec<(String, String)> {
        (0..n).map(|i| (format!("p{i}"), format!("Player {i}"))).collect()
    }

    #[test]
    fn creates_per_player_zones_for_each_seat() {
        let ruleset = ruleset();
        let state = create_initial_state(&ruleset, "s1", &players(3), 42);
        assert!(state.zone("hand:0").is_some());
        assert!(state.zone("hand:1").is_some());
        assert!(state.zone("hand:2").is_some());
        assert!(state.zone("hand:3").is_none());
        assert!(state.zone("discard").is_some());
    }

    #[test]
    fn deck_lands_in_draw_pile_face_down() {
        let ruleset = ruleset();
        let state = create_initial_state(&ruleset, "s1", &players(2), 42);
        let draw_pile = state.zone("draw_pile").unwrap();
        assert_eq!(draw_pile.cards.len(), 52);
        assert!(draw_pile.cards.iter().all(|c| !c.face_up));
    }

    #[test]
    fn copies_initial_variables() {
        let ruleset = ruleset();
        let state = create_initial_state(&ruleset, "s1", &players(2), 42);
        assert_eq!(state.variables.get("running_total"), Some(&0.0));
    }

    #[test]
    fn status_starts_waiting_for_players() {
        let ruleset = ruleset();
        let state = create_initial_state(&ruleset, "s1", &players(2), 42);
        assert_eq!(state.status, GameStatus::WaitingForPlayers);
        assert_eq!(state.current_phase, "play");
        assert_eq!(state.version, 0);
    }

    #[test]
    fn equal_seeds_yield_equal_card_ids() {
        let ruleset = ruleset();
        let a = create_initial_state(&ruleset, "s1", &players(2), 7);
        let b = create_initial_state(&ruleset, "s2", &players(2), 7);
        let ids_a: Vec<_> = a.zone("draw_pile").unwrap().cards.iter().map(|c| c.id).collect();
        let ids_b: Vec<_> = b.zone("draw_pile").unwrap().cards.iter().map(|c| c.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
