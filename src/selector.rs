//! Final move selection under a wall-clock budget.
//!
//! Legal moves are classified by [`GuardrailPolicy`], the survivors are
//! scored with [`NegamaxSearchEngine`] (each on its own slice of the
//! remaining time) and the winner is picked by the "pyramid" tie-break:
//!
//! 1. Candidates that do not repeat the position and score within
//!    `repetition_tolerance` of the best repeating candidate (of the best
//!    candidate overall when nothing repeats) are accepted. A repetition
//!    only wins outright when every non-repeating move trails it by more
//!    than the tolerance.
//! 2. Accepted candidates are sorted descending by `tie_break_order`
//!    (default: gives check, is capture, attacker count, score, captured
//!    value) and the first is played.
//! 3. With nothing accepted, all candidates are sorted by (score, captured
//!    value) instead, which accepts the repetition.
//! 4. If time ran out before any candidate was scored, a one-ply static
//!    evaluation decides.
//!
//! Every sort is stable, so exact ties fall back to legal-move order.

use crate::config::{EngineConfig, GuardrailMode, TieBreakKey};
use crate::evaluation::{MaterialEvaluator, StaticEvaluator};
use crate::guardrail::GuardrailPolicy;
use crate::position::GameState;
use crate::search::{NegamaxSearchEngine, SearchStats};
use crate::{Score, INFINITY};
use chess::ChessMove;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Per-candidate record used only during final selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedMove {
    pub chess_move: ChessMove,
    pub score: Score,
    pub captured_value: Score,
    pub gives_check: bool,
    pub is_capture: bool,
    /// Friendly pieces covering the destination after the move
    pub attacker_count: usize,
    pub causes_repetition: bool,
    pub guardrail_allowed: bool,
}

impl AnnotatedMove {
    fn key(&self, key: TieBreakKey) -> i64 {
        match key {
            TieBreakKey::GivesCheck => self.gives_check as i64,
            TieBreakKey::IsCapture => self.is_capture as i64,
            TieBreakKey::AttackerCount => self.attacker_count as i64,
            TieBreakKey::Score => self.score as i64,
            TieBreakKey::CapturedValue => self.captured_value as i64,
        }
    }

    fn compare_desc(&self, other: &Self, order: &[TieBreakKey]) -> Ordering {
        order
            .iter()
            .map(|&key| other.key(key).cmp(&self.key(key)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Which stage of the selection produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    NoLegalMoves,
    /// Accepted non-repeating candidate ranked by the tie-break order
    Pyramid,
    /// No non-repeating candidate was acceptable; best score overall
    ScoreFallback,
    /// Time ran out before any candidate was scored
    StaticFallback,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub best_move: Option<ChessMove>,
    pub source: SelectionSource,
    pub candidates: Vec<AnnotatedMove>,
    pub stats: SearchStats,
    pub elapsed: Duration,
}

/// Picks a move for the side to move within a time budget.
pub struct MoveSelector<E: StaticEvaluator = MaterialEvaluator> {
    config: EngineConfig,
    evaluator: E,
}

impl MoveSelector<MaterialEvaluator> {
    pub fn new(config: EngineConfig) -> Self {
        let evaluator = config.evaluator();
        Self { config, evaluator }
    }
}

impl Default for MoveSelector<MaterialEvaluator> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<E: StaticEvaluator> MoveSelector<E> {
    pub fn with_evaluator(config: EngineConfig, evaluator: E) -> Self {
        Self { config, evaluator }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Returns `None` only when the side to move has no legal moves.
    pub fn choose_best_move(&self, state: &mut GameState, time_budget: Duration) -> Option<ChessMove> {
        self.select(state, time_budget).best_move
    }

    pub fn select(&self, state: &mut GameState, time_budget: Duration) -> Selection {
        let start = Instant::now();
        let deadline = start + time_budget;

        let legal = state.legal_moves();
        if legal.is_empty() {
            return Selection {
                best_move: None,
                source: SelectionSource::NoLegalMoves,
                candidates: Vec::new(),
                stats: SearchStats::default(),
                elapsed: start.elapsed(),
            };
        }

        let mut guardrail = GuardrailPolicy::new(&self.evaluator, &self.config);
        let mut engine = NegamaxSearchEngine::new(&self.evaluator, &self.config);

        let candidates = self.classify(state, &legal, &mut guardrail, deadline);
        let annotated = self.score_candidates(state, &candidates, &mut engine, deadline);

        let mut stats = engine.stats();
        stats.risk_nodes = guardrail.risk_nodes();

        let (best_move, source) = match self.pick(&annotated) {
            Some((chosen, source)) => (chosen, source),
            None => {
                log::warn!(
                    "No candidate scored within {:?}; falling back to one-ply evaluation",
                    time_budget
                );
                (self.static_fallback(state, &legal), SelectionSource::StaticFallback)
            }
        };

        let elapsed = start.elapsed();
        log::info!(
            "Selected {} via {:?} from {} candidates ({} nodes, {:?})",
            best_move,
            source,
            annotated.len(),
            stats.nodes + stats.quiescence_nodes,
            elapsed
        );

        Selection {
            best_move: Some(best_move),
            source,
            candidates: annotated,
            stats,
            elapsed,
        }
    }

    /// Pair each move with its guardrail verdict and decide which ones get
    /// scored. Moves left unclassified when the deadline passes count as
    /// rejected.
    fn classify(
        &self,
        state: &mut GameState,
        legal: &[ChessMove],
        guardrail: &mut GuardrailPolicy<'_, E>,
        deadline: Instant,
    ) -> Vec<(ChessMove, bool)> {
        let mut verdicts = Vec::with_capacity(legal.len());
        for &mv in legal {
            let allowed = Instant::now() < deadline && guardrail.verdict(state, mv).allowed();
            verdicts.push((mv, allowed));
        }

        match self.config.guardrail_mode {
            GuardrailMode::Penalize => verdicts,
            GuardrailMode::Filter => {
                let safe: Vec<_> = verdicts.iter().copied().filter(|&(_, ok)| ok).collect();
                if safe.is_empty() {
                    log::debug!("Every move was rejected by the guardrail; searching all of them");
                    verdicts
                } else {
                    safe
                }
            }
        }
    }

    fn score_candidates(
        &self,
        state: &mut GameState,
        candidates: &[(ChessMove, bool)],
        engine: &mut NegamaxSearchEngine<'_, E>,
        deadline: Instant,
    ) -> Vec<AnnotatedMove> {
        let mut rng = StdRng::seed_from_u64(self.config.jitter_seed);
        let jitter = self.config.score_jitter;
        let mut annotated = Vec::with_capacity(candidates.len());

        for (index, &(mv, allowed)) in candidates.iter().enumerate() {
            let now = Instant::now();
            if now >= deadline {
                log::debug!(
                    "Deadline reached after {} of {} candidates",
                    index,
                    candidates.len()
                );
                break;
            }
            let remaining = candidates.len() - index;
            let sub_deadline = now + (deadline - now) / remaining as u32;

            let captured = state.captured_piece(mv);
            let captured_value = captured.map_or(0, |piece| self.evaluator.piece_value(piece));
            let is_capture = captured.is_some();
            let gives_check = state.gives_check(mv);
            let extension =
                u32::from((is_capture || gives_check) && self.config.max_extensions > 0);
            let depth = self.config.search_depth.saturating_sub(1) + extension;
            let mover = state.side_to_move();

            let (child_score, attacker_count, causes_repetition) = {
                let mut child = state.make_move(mv);
                let attackers = child.attacker_count(mover, mv.get_dest());
                let repeats = child.repetition_count() > 1;
                let score = -engine.search_extended(
                    &mut child,
                    depth,
                    -INFINITY,
                    INFINITY,
                    sub_deadline,
                    extension,
                );
                (score, attackers, repeats)
            };

            let mut score = child_score + captured_value;
            if !allowed && self.config.guardrail_mode == GuardrailMode::Penalize {
                score -= self.config.guardrail_penalty;
            }
            if jitter > 0 {
                score += rng.gen_range(-jitter..=jitter);
            }

            log::debug!(
                "{}: score {} (captured {}, check {}, attackers {}, repeats {}, allowed {})",
                mv,
                score,
                captured_value,
                gives_check,
                attacker_count,
                causes_repetition,
                allowed
            );

            annotated.push(AnnotatedMove {
                chess_move: mv,
                score,
                captured_value,
                gives_check,
                is_capture,
                attacker_count,
                causes_repetition,
                guardrail_allowed: allowed,
            });
        }

        annotated
    }

    fn pick(&self, annotated: &[AnnotatedMove]) -> Option<(ChessMove, SelectionSource)> {
        let best_overall = annotated.iter().map(|c| c.score).max()?;
        let reference = annotated
            .iter()
            .filter(|c| c.causes_repetition)
            .map(|c| c.score)
            .max()
            .unwrap_or(best_overall);
        let floor = reference - self.config.repetition_tolerance;

        let mut accepted: Vec<&AnnotatedMove> = annotated
            .iter()
            .filter(|c| !c.causes_repetition && c.score >= floor)
            .collect();

        if !accepted.is_empty() {
            let order = &self.config.tie_break_order;
            accepted.sort_by(|a, b| a.compare_desc(b, order));
            return Some((accepted[0].chess_move, SelectionSource::Pyramid));
        }

        let mut all: Vec<&AnnotatedMove> = annotated.iter().collect();
        all.sort_by(|a, b| a.compare_desc(b, &[TieBreakKey::Score, TieBreakKey::CapturedValue]));
        Some((all[0].chess_move, SelectionSource::ScoreFallback))
    }

    fn static_fallback(&self, state: &mut GameState, legal: &[ChessMove]) -> ChessMove {
        let mut best_move = legal[0];
        let mut best_score = -INFINITY;
        for &mv in legal {
            let score = {
                let child = state.make_move(mv);
                -self.evaluator.evaluate(&child)
            };
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }
        best_move
    }
}
