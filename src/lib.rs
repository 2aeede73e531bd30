//! # Chess Guardrail Engine
//!
//! Move selection for a chess-playing agent working under a wall-clock
//! budget. Each legal move passes through cheap guardrails (sanity, hanging
//! a major piece, shallow blunder check), is scored by a deadline-aware
//! negamax with capture/check extensions and quiescence, and the final
//! choice is made by a "pyramid" tie-break that prefers forcing moves among
//! near-equal candidates and avoids drawing by repetition unless every
//! alternative is clearly worse.
//!
//! ## Quick Start
//!
//! ```rust
//! use chess_guardrail_engine::{EngineConfig, GameState, MoveSelector};
//! use std::time::Duration;
//!
//! let selector = MoveSelector::new(EngineConfig::fast());
//! let mut state = GameState::default();
//!
//! let best = selector.choose_best_move(&mut state, Duration::from_millis(200));
//! assert!(best.is_some());
//! ```
//!
//! Positions come from the [`chess`] crate; [`GameState`] adds the game
//! record needed for repetition detection and scoped make/undo.

// Core modules
pub mod errors;
pub mod position;

// Re-export commonly used types
pub use errors::ChessEngineError;

pub mod config;
pub mod evaluation;
pub mod guardrail;
pub mod quiescence;
pub mod risk;
pub mod search;
pub mod selector;

/// Centipawn score from the side to move's point of view.
pub type Score = i32;

/// Window bound used for full-width searches. Larger than any mate score.
pub const INFINITY: Score = 1_000_000;

pub use config::{EngineConfig, GuardrailMode, TieBreakKey};
pub use evaluation::{MaterialEvaluator, PieceValues, StaticEvaluator, MATE_SCORE};
pub use guardrail::{GuardrailPolicy, GuardrailVerdict};
pub use position::{GameState, MoveGuard};
pub use quiescence::QuiescenceEvaluator;
pub use risk::ShallowRiskSearch;
pub use search::{NegamaxSearchEngine, SearchStats};
pub use selector::{AnnotatedMove, MoveSelector, Selection, SelectionSource};
