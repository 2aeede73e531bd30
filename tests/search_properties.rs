use chess::ChessMove;
use chess_guardrail_engine::{
    EngineConfig, GameState, GuardrailPolicy, MaterialEvaluator, NegamaxSearchEngine,
    QuiescenceEvaluator, StaticEvaluator, INFINITY,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

const TEST_POSITIONS: [&str; 5] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
    "4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1",
    "4k3/8/8/8/3n4/8/8/3QK3 w - - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(120)
}

fn random_game(rng: &mut StdRng, plies: usize) -> GameState {
    let mut state = GameState::default();
    for _ in 0..plies {
        let moves = state.legal_moves();
        let Some(&mv) = moves.choose(rng) else {
            break;
        };
        state.play(mv).expect("legal move");
    }
    state
}

#[test]
fn test_make_and_undo_is_identity_over_random_games() {
    let mut rng = StdRng::seed_from_u64(2024);

    for game in 0..20 {
        let mut state = random_game(&mut rng, 10 + game * 3);
        let before = state.clone();

        for mv in state.legal_moves() {
            {
                let mut child = state.make_move(mv);
                // One more level so nested guards unwind in order.
                if let Some(&reply) = child.legal_moves().first() {
                    let grandchild = child.make_move(reply);
                    assert_eq!(grandchild.ply(), before.ply() + 2);
                }
            }
            assert_eq!(state, before, "game {} move {}", game, mv);
        }
    }
}

#[test]
fn test_search_respects_deadline() {
    let config = EngineConfig::default();
    let evaluator = config.evaluator();
    let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
    let mut state = GameState::from_fen(TEST_POSITIONS[1]).unwrap();

    let start = Instant::now();
    let deadline = start + Duration::from_millis(50);
    engine.search(&mut state, 8, -INFINITY, INFINITY, deadline);

    // Quiescence below the last node may still finish after the deadline.
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "search overran its deadline: {:?}",
        start.elapsed()
    );
    assert!(engine.stats().deadline_hits > 0);
}

#[test]
fn test_depth_zero_never_scores_below_stand_pat() {
    let config = EngineConfig::default();
    let evaluator = config.evaluator();

    for fen in TEST_POSITIONS {
        let mut state = GameState::from_fen(fen).unwrap();
        if state.in_check() || state.is_game_over() {
            continue;
        }
        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let score = engine.search(&mut state, 0, -INFINITY, INFINITY, far_deadline());
        assert!(
            score >= evaluator.evaluate(&state),
            "{}: {} < {}",
            fen,
            score,
            evaluator.evaluate(&state)
        );
    }
}

/// Full-width negamax over the same tree: same extension rule, same
/// quiescence leaves, no pruning.
fn reference_negamax(
    state: &mut GameState,
    evaluator: &MaterialEvaluator,
    config: &EngineConfig,
    depth: u32,
    extensions: u32,
) -> i32 {
    if depth == 0 || state.is_game_over() || state.repetition_count() >= 3 {
        let mut quiescence = QuiescenceEvaluator::new(evaluator, config.quiescence_max_depth);
        return quiescence.evaluate(state, -INFINITY, INFINITY);
    }

    let mut best = -INFINITY;
    for mv in state.legal_moves() {
        let extend =
            extensions < config.max_extensions && (state.is_capture(mv) || state.gives_check(mv));
        let (child_depth, child_extensions) = if extend {
            (depth, extensions + 1)
        } else {
            (depth - 1, extensions)
        };
        let mut child = state.make_move(mv);
        let score = -reference_negamax(&mut child, evaluator, config, child_depth, child_extensions);
        best = best.max(score);
    }
    best
}

#[test]
fn test_alpha_beta_matches_full_width_search() {
    let config = EngineConfig {
        max_extensions: 1,
        quiescence_max_depth: 4,
        ..Default::default()
    };
    let evaluator = config.evaluator();

    for fen in [
        "4k3/8/8/3r4/4P3/8/8/4K3 w - - 0 1",
        "4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1",
        "8/8/4k3/8/2n5/8/3R4/3K4 w - - 0 1",
    ] {
        let mut state = GameState::from_fen(fen).unwrap();
        let expected = reference_negamax(&mut state, &evaluator, &config, 2, 0);

        let mut engine = NegamaxSearchEngine::new(&evaluator, &config);
        let actual = engine.search(&mut state, 2, -INFINITY, INFINITY, far_deadline());
        assert_eq!(actual, expected, "{}", fen);
    }
}

#[test]
fn test_quiescence_stays_inside_window() {
    let evaluator = MaterialEvaluator::default();

    for fen in TEST_POSITIONS {
        for (alpha, beta) in [(-50, 50), (-1000, -200), (200, 1000), (0, 1)] {
            let mut state = GameState::from_fen(fen).unwrap();
            let mut quiescence = QuiescenceEvaluator::new(&evaluator, 16);
            let score = quiescence.evaluate(&mut state, alpha, beta);
            assert!(
                (alpha..=beta).contains(&score),
                "{} window ({}, {}) returned {}",
                fen,
                alpha,
                beta,
                score
            );
        }
    }
}

#[test]
fn test_guardrail_is_conjunction_of_sub_checks() {
    let config = EngineConfig::default();
    let evaluator = config.evaluator();
    let mut policy = GuardrailPolicy::new(&evaluator, &config);

    for fen in TEST_POSITIONS {
        let mut state = GameState::from_fen(fen).unwrap();
        let before = state.clone();
        let mut moves = state.legal_moves();
        moves.push(ChessMove::default());

        for mv in moves {
            let expected = policy.is_legal_and_sane(&state, mv)
                && !policy.is_high_value_hang(&mut state, mv)
                && !policy.is_blunder(&mut state, mv);
            assert_eq!(policy.allow_move(&mut state, mv), expected, "{} {}", fen, mv);
            assert_eq!(policy.verdict(&mut state, mv).allowed(), expected, "{} {}", fen, mv);
        }
        assert_eq!(state, before);
    }
}
