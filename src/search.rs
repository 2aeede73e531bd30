use crate::config::EngineConfig;
use crate::evaluation::{StaticEvaluator, MATE_SCORE};
use crate::position::GameState;
use crate::quiescence::QuiescenceEvaluator;
use crate::{Score, INFINITY};
use std::time::Instant;

/// Counters gathered while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub quiescence_nodes: u64,
    pub risk_nodes: u64,
    pub cutoffs: u64,
    pub extensions: u64,
    /// Nodes that returned a static evaluation because the deadline passed
    pub deadline_hits: u64,
}

impl SearchStats {
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.quiescence_nodes += other.quiescence_nodes;
        self.risk_nodes += other.risk_nodes;
        self.cutoffs += other.cutoffs;
        self.extensions += other.extensions;
        self.deadline_hits += other.deadline_hits;
    }
}

/// Depth-limited, deadline-aware negamax with alpha-beta pruning.
///
/// Captures and checks are extended by one ply (bounded per line by
/// `max_extensions`). Leaves, finished games and threefold repetitions are
/// handed to [`QuiescenceEvaluator`] with the window rescaled by the
/// evaluator's material weight.
pub struct NegamaxSearchEngine<'a, E: StaticEvaluator> {
    evaluator: &'a E,
    quiescence: QuiescenceEvaluator<'a, E>,
    max_extensions: u32,
    stats: SearchStats,
}

impl<'a, E: StaticEvaluator> NegamaxSearchEngine<'a, E> {
    pub fn new(evaluator: &'a E, config: &EngineConfig) -> Self {
        Self {
            evaluator,
            quiescence: QuiescenceEvaluator::new(evaluator, config.quiescence_max_depth),
            max_extensions: config.max_extensions,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            quiescence_nodes: self.quiescence.nodes(),
            ..self.stats
        }
    }

    /// Score `state` for its side to move.
    ///
    /// Never recurses once `deadline` has passed; the static evaluation is
    /// returned instead. `state` is left exactly as it was given.
    pub fn search(
        &mut self,
        state: &mut GameState,
        depth: u32,
        alpha: Score,
        beta: Score,
        deadline: Instant,
    ) -> Score {
        self.negamax(state, depth, alpha, beta, deadline, 0)
    }

    /// Like [`NegamaxSearchEngine::search`], for a line that has already
    /// been extended `extensions_used` times above `state`. The selector
    /// uses this so its root extension counts against `max_extensions`.
    pub fn search_extended(
        &mut self,
        state: &mut GameState,
        depth: u32,
        alpha: Score,
        beta: Score,
        deadline: Instant,
        extensions_used: u32,
    ) -> Score {
        self.negamax(state, depth, alpha, beta, deadline, extensions_used)
    }

    fn negamax(
        &mut self,
        state: &mut GameState,
        depth: u32,
        mut alpha: Score,
        beta: Score,
        deadline: Instant,
        extensions: u32,
    ) -> Score {
        self.stats.nodes += 1;

        if Instant::now() >= deadline {
            self.stats.deadline_hits += 1;
            return self.evaluator.evaluate(state);
        }

        if depth == 0 || state.is_game_over() || state.repetition_count() >= 3 {
            return self.resolve_leaf(state, alpha, beta);
        }

        let mut best = -INFINITY;
        for mv in state.legal_moves() {
            if Instant::now() >= deadline {
                self.stats.deadline_hits += 1;
                break;
            }

            let extend = extensions < self.max_extensions
                && (state.is_capture(mv) || state.gives_check(mv));
            let (child_depth, child_extensions) = if extend {
                self.stats.extensions += 1;
                (depth, extensions + 1)
            } else {
                (depth - 1, extensions)
            };

            let score = {
                let mut child = state.make_move(mv);
                -self.negamax(
                    &mut child,
                    child_depth,
                    -beta,
                    -alpha,
                    deadline,
                    child_extensions,
                )
            };

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }

        if best == -INFINITY {
            if Instant::now() >= deadline {
                return self.evaluator.evaluate(state);
            }
            return self.resolve_leaf(state, alpha, beta);
        }

        best
    }

    fn resolve_leaf(&mut self, state: &mut GameState, alpha: Score, beta: Score) -> Score {
        let weight = self.evaluator.material_weight();
        // Round the window outwards so a bound in material units, scaled
        // back up, is still a bound on the original side of the window.
        let lower = alpha.div_euclid(weight);
        let upper = -(-beta).div_euclid(weight);
        let score = self.quiescence.evaluate(state, lower, upper);
        if score.abs() >= MATE_SCORE {
            return score;
        }
        score * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{MaterialEvaluator, PieceValues};
    use std::time::Duration;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[test]
    fn test_expired_deadline_returns_static_eval() {
        let evaluator = MaterialEvaluator::default();
        let config = EngineConfig::default();
        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let mut state =
            GameState::from_fen("4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1").unwrap();

        let score = engine.search(&mut state, 5, -INFINITY, INFINITY, Instant::now());
        assert_eq!(score, evaluator.evaluate(&state));
        assert_eq!(engine.stats().nodes, 1);
        assert_eq!(engine.stats().deadline_hits, 1);
    }

    #[test]
    fn test_finds_free_rook() {
        let evaluator = MaterialEvaluator::default();
        let config = EngineConfig::default();
        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let mut state =
            GameState::from_fen("4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1").unwrap();

        let score = engine.search(&mut state, 2, -INFINITY, INFINITY, far_deadline());
        assert!(score >= 100, "expected exd5 to be found, got {}", score);
    }

    #[test]
    fn test_mate_in_one_is_seen() {
        let evaluator = MaterialEvaluator::default();
        let config = EngineConfig::default();
        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let mut state = GameState::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();

        let score = engine.search(&mut state, 1, -INFINITY, INFINITY, far_deadline());
        assert_eq!(score, MATE_SCORE);
    }

    #[test]
    fn test_material_weight_rescales_leaves() {
        let config = EngineConfig::default();
        let plain = MaterialEvaluator::new(PieceValues::default(), 1);
        let weighted = MaterialEvaluator::new(PieceValues::default(), 4);
        let mut state =
            GameState::from_fen("4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1").unwrap();

        let base = NegamaxSearchEngine::new(&plain, &config).search(
            &mut state,
            2,
            -INFINITY,
            INFINITY,
            far_deadline(),
        );
        let scaled = NegamaxSearchEngine::new(&weighted, &config).search(
            &mut state,
            2,
            -INFINITY,
            INFINITY,
            far_deadline(),
        );
        assert_eq!(scaled, base * 4);
    }

    /// A fail-hard or fail-soft result must agree with the exact value on
    /// which side of the window it falls.
    fn assert_window_consistent(exact: Score, alpha: Score, beta: Score, bounded: Score) {
        if exact <= alpha {
            assert!(bounded <= alpha, "({}, {}): exact {} but got {}", alpha, beta, exact, bounded);
        } else if exact >= beta {
            assert!(bounded >= beta, "({}, {}): exact {} but got {}", alpha, beta, exact, bounded);
        } else {
            assert_eq!(bounded, exact, "({}, {})", alpha, beta);
        }
    }

    #[test]
    fn test_weighted_leaf_window_stays_consistent() {
        let config = EngineConfig::default();
        let weighted = MaterialEvaluator::new(PieceValues::default(), 4);

        for fen in [
            "4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1",
            "4k3/8/8/3r4/8/8/8/4K3 w - - 0 1",
            "4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1",
        ] {
            let mut state = GameState::from_fen(fen).unwrap();
            for depth in [0, 2] {
                let exact = NegamaxSearchEngine::new(&weighted, &config).search(
                    &mut state,
                    depth,
                    -INFINITY,
                    INFINITY,
                    far_deadline(),
                );
                for (alpha, beta) in [
                    (exact - 3, exact - 1),
                    (exact + 1, exact + 3),
                    (exact - 1, exact + 1),
                    (exact - 6, exact + 2),
                    (5, 7),
                    (-7, -5),
                ] {
                    let bounded = NegamaxSearchEngine::new(&weighted, &config).search(
                        &mut state,
                        depth,
                        alpha,
                        beta,
                        far_deadline(),
                    );
                    assert_window_consistent(exact, alpha, beta, bounded);
                }
            }
        }
    }

    #[test]
    fn test_spent_extensions_are_not_granted_again() {
        let config = EngineConfig {
            max_extensions: 2,
            ..Default::default()
        };
        let evaluator = MaterialEvaluator::default();
        let mut state = GameState::from_fen("4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1").unwrap();

        let mut fresh = NegamaxSearchEngine::new(&evaluator, &config);
        fresh.search_extended(&mut state, 1, -INFINITY, INFINITY, far_deadline(), 0);
        assert!(fresh.stats().extensions > 0);

        let mut spent = NegamaxSearchEngine::new(&evaluator, &config);
        spent.search_extended(&mut state, 1, -INFINITY, INFINITY, far_deadline(), 2);
        assert_eq!(spent.stats().extensions, 0);
    }

    #[test]
    fn test_search_leaves_state_untouched() {
        let evaluator = MaterialEvaluator::default();
        let config = EngineConfig::default();
        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let mut state = GameState::default();
        let before = state.clone();

        engine.search(&mut state, 2, -INFINITY, INFINITY, far_deadline());
        assert_eq!(state, before);
        assert!(engine.stats().cutoffs > 0);
    }
}
