use crate::evaluation::StaticEvaluator;
use crate::position::GameState;
use crate::Score;

/// Capture/check-only search that settles noisy leaves.
///
/// Works in the evaluator's material units (`quiet_score`); the caller is
/// responsible for rescaling the window and result by the material weight.
pub struct QuiescenceEvaluator<'a, E: StaticEvaluator> {
    evaluator: &'a E,
    max_depth: u32,
    nodes: u64,
}

impl<'a, E: StaticEvaluator> QuiescenceEvaluator<'a, E> {
    pub fn new(evaluator: &'a E, max_depth: u32) -> Self {
        Self {
            evaluator,
            max_depth,
            nodes: 0,
        }
    }

    /// Nodes visited since construction.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn evaluate(&mut self, state: &mut GameState, alpha: Score, beta: Score) -> Score {
        self.quiesce(state, alpha, beta, 0)
    }

    fn quiesce(&mut self, state: &mut GameState, mut alpha: Score, beta: Score, ply: u32) -> Score {
        self.nodes += 1;

        let stand_pat = self.evaluator.quiet_score(state);
        if state.is_game_over() || state.repetition_count() >= 3 {
            return stand_pat;
        }

        // Fail high: assume some move is at least as good as doing nothing.
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if ply >= self.max_depth {
            return alpha;
        }

        for mv in state.legal_moves() {
            if !state.is_capture(mv) && !state.gives_check(mv) {
                continue;
            }

            let score = {
                let mut child = state.make_move(mv);
                -self.quiesce(&mut child, -beta, -alpha, ply + 1)
            };

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}
