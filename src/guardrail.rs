use crate::config::EngineConfig;
use crate::evaluation::StaticEvaluator;
use crate::position::GameState;
use crate::risk::ShallowRiskSearch;
use crate::Score;
use chess::{ChessMove, Piece};

/// Outcome of each guardrail sub-check for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardrailVerdict {
    pub legal_and_sane: bool,
    pub high_value_hang: bool,
    pub blunder: bool,
}

impl GuardrailVerdict {
    pub fn allowed(&self) -> bool {
        self.legal_and_sane && !self.high_value_hang && !self.blunder
    }
}

/// Cheap pre-checks run before a move is handed to the scorer.
///
/// Only reports booleans. Whether a rejected move is dropped or penalised is
/// the selector's decision.
pub struct GuardrailPolicy<'a, E: StaticEvaluator> {
    evaluator: &'a E,
    risk: ShallowRiskSearch<'a, E>,
    hang_threshold: Score,
    blunder_depth: u32,
}

impl<'a, E: StaticEvaluator> GuardrailPolicy<'a, E> {
    pub fn new(evaluator: &'a E, config: &EngineConfig) -> Self {
        Self {
            evaluator,
            risk: ShallowRiskSearch::new(evaluator),
            hang_threshold: config.hang_threshold,
            blunder_depth: config.blunder_depth,
        }
    }

    pub fn risk_nodes(&self) -> u64 {
        self.risk.nodes()
    }

    pub fn is_legal_and_sane(&self, state: &GameState, mv: ChessMove) -> bool {
        mv != ChessMove::default() && mv.get_source() != mv.get_dest() && state.is_legal(mv)
    }

    /// A rook-or-better piece (by default) lands where it is outnumbered.
    pub fn is_high_value_hang(&self, state: &mut GameState, mv: ChessMove) -> bool {
        if !state.is_legal(mv) {
            return false;
        }
        let piece = match state.piece_on(mv.get_source()) {
            Some(Piece::King) | None => return false,
            Some(piece) => piece,
        };
        if self.evaluator.piece_value(piece) < self.hang_threshold {
            return false;
        }

        let mover = state.side_to_move();
        let dest = mv.get_dest();
        let child = state.make_move(mv);
        child.attacker_count(!mover, dest) > child.attacker_count(mover, dest)
    }

    pub fn is_blunder(&mut self, state: &mut GameState, mv: ChessMove) -> bool {
        self.risk.is_risky(state, mv, self.blunder_depth)
    }

    pub fn allow_move(&mut self, state: &mut GameState, mv: ChessMove) -> bool {
        self.is_legal_and_sane(state, mv)
            && !self.is_high_value_hang(state, mv)
            && !self.is_blunder(state, mv)
    }

    /// All sub-checks at once. For insane moves the other two are not run and
    /// read as `false`.
    pub fn verdict(&mut self, state: &mut GameState, mv: ChessMove) -> GuardrailVerdict {
        if !self.is_legal_and_sane(state, mv) {
            return GuardrailVerdict {
                legal_and_sane: false,
                high_value_hang: false,
                blunder: false,
            };
        }
        let verdict = GuardrailVerdict {
            legal_and_sane: true,
            high_value_hang: self.is_high_value_hang(state, mv),
            blunder: self.is_blunder(state, mv),
        };
        log::trace!("guardrail {}: {:?}", mv, verdict);
        verdict
    }
}
