//! Shallow material search that flags moves likely to lose material.
//!
//! This is a classifier, not a scorer. It only asks one question: can the
//! opponent leave the mover with less material than before the move?
//!
//! To keep branching cheap, every move is first checked against
//! [`ShallowRiskSearch::punished_value`]. If the moved piece stands on a
//! square with more enemy attackers than friendly defenders, the search does
//! not recurse into it. For the move under test that alone makes it risky,
//! whatever it captured; deeper in the tree the branch is scored as if the
//! piece were simply lost. The shortcut ignores piece values in the
//! exchange, x-rays and pins, so it can disagree with an exact material
//! search in both directions. Use it for its directional signal only.

use crate::evaluation::{StaticEvaluator, MATE_SCORE};
use crate::position::GameState;
use crate::{Score, INFINITY};
use chess::{ChessMove, Color, Piece, Square};

pub struct ShallowRiskSearch<'a, E: StaticEvaluator> {
    evaluator: &'a E,
    nodes: u64,
}

impl<'a, E: StaticEvaluator> ShallowRiskSearch<'a, E> {
    pub fn new(evaluator: &'a E) -> Self {
        Self { evaluator, nodes: 0 }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// True when the moved piece ends up outnumbered on its destination, or
    /// when the worst material outcome within `depth` plies is strictly below
    /// the mover's material before `mv`.
    ///
    /// Moves that are not legal in `state` are reported as risky.
    pub fn is_risky(&mut self, state: &mut GameState, mv: ChessMove, depth: u32) -> bool {
        if !state.is_legal(mv) {
            log::debug!("risk check on illegal move {}", mv);
            return true;
        }

        let mover = state.side_to_move();
        let before = self.evaluator.material_balance(state, mover);

        let mut child = state.make_move(mv);
        if self.punished_value(&child, mover, mv.get_dest()).is_some() {
            log::trace!("{} lands on an outnumbered square", mv);
            return true;
        }
        let worst = -self.negamax(&mut child, depth.saturating_sub(1), -INFINITY, INFINITY);

        worst < before
    }

    /// Material outcome for `mover` when the piece it just moved to `dest`
    /// is outnumbered there, or `None` if the square holds.
    ///
    /// `state` is the position right after the move. Kings are never
    /// considered punished; a legal king move cannot land on an attacked
    /// square.
    pub fn punished_value(&self, state: &GameState, mover: Color, dest: Square) -> Option<Score> {
        let piece = state.piece_on(dest)?;
        if piece == Piece::King {
            return None;
        }

        let attackers = state.attacker_count(!mover, dest);
        let defenders = state.attacker_count(mover, dest);
        if attackers > defenders {
            let balance = self.evaluator.material_balance(state, mover);
            Some(balance - self.evaluator.piece_value(piece))
        } else {
            None
        }
    }

    fn negamax(&mut self, state: &mut GameState, depth: u32, mut alpha: Score, beta: Score) -> Score {
        self.nodes += 1;

        let us = state.side_to_move();
        if depth == 0 || state.is_game_over() {
            return self.leaf_value(state, us);
        }

        let mut best = -INFINITY;
        for mv in state.legal_moves() {
            let score = {
                let mut child = state.make_move(mv);
                match self.punished_value(&child, us, mv.get_dest()) {
                    Some(value) => value,
                    None => -self.negamax(&mut child, depth - 1, -beta, -alpha),
                }
            };

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        best
    }

    fn leaf_value(&self, state: &GameState, us: Color) -> Score {
        if state.status() == chess::BoardStatus::Checkmate {
            return -MATE_SCORE;
        }
        self.evaluator.material_balance(state, us)
    }
}
