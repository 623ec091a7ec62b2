//! Engine error taxonomy.
//!
//! Three of the four error families named by the engine's design are
//! surfaced to callers as `Result::Err`: [`ParseError`] from the ruleset
//! loader and expression tokenizer/parser, [`ExpressionError`] from
//! expression evaluation, and [`InvariantViolation`] from the reducer and
//! viewer. The fourth family, action rejection, is never an error value —
//! untrusted client actions that are malformed, out of turn, or unknown
//! always collapse to "return the input state unchanged" instead (see
//! [`crate::reducer`]).

use thiserror::Error;

/// Failure to parse a ruleset document or an expression's source text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("ruleset field `{field}`: {reason}")]
    InvalidRuleset { field: String, reason: String },

    #[error("unknown ruleset key `{0}`")]
    UnknownKey(String),

    #[error("missing ruleset key `{0}`")]
    MissingKey(String),

    #[error("{0}")]
    Json(String),

    #[error("tokenizer error at byte {pos}: {reason}")]
    Tokenize { pos: usize, reason: String },

    #[error("parser error: {0}")]
    Parse(String),
}

/// A failure that occurs while evaluating a ruleset-authored expression
/// against a live game state. Always a ruleset-authoring bug, never a
/// consequence of untrusted client input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{function}` expected {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("type mismatch in `{op}`: {detail}")]
    TypeMismatch { op: String, detail: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("`while` exceeded its iteration cap ({cap})")]
    WhileOverflow { cap: u32 },

    #[error("expression exceeded the maximum AST node count ({cap})")]
    TooManyNodes { cap: usize },

    #[error("expression exceeded the maximum evaluation depth ({cap})")]
    TooDeep { cap: usize },

    #[error("zone `{zone}` has no card at index {index}")]
    ZoneIndexOutOfBounds { zone: String, index: usize },

    #[error("zone `{0}` is empty")]
    EmptyZone(String),

    #[error("unknown zone `{0}`")]
    UnknownZone(String),
}

/// A structural invariant the engine guarantees was violated. Always
/// fatal — never recoverable by retrying the same action.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("card conservation violated: expected {expected} cards, found {found}")]
    CardConservation { expected: usize, found: usize },

    #[error("duplicate card id {0}")]
    DuplicateCardId(u64),

    #[error(
        "phase machine exceeded its transition budget ({budget}) starting from `{start_phase}`"
    )]
    TransitionBudgetExceeded { budget: u32, start_phase: String },

    #[error("unknown player `{0}`")]
    UnknownPlayer(String),

    #[error("zone `{zone}` exceeded its maxCards cap ({cap})")]
    ZoneCapacityExceeded { zone: String, cap: usize },

    #[error("ruleset scoring expression `{field}` is invalid: {reason}")]
    InvalidScoringExpression { field: String, reason: String },
}

/// Top-level error returned by the reducer and the per-viewer filter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
