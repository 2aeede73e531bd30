//! Static evaluation collaborator.
//!
//! The search core only needs a side-to-move score and a piece value table;
//! [`MaterialEvaluator`] is the default implementation.

use crate::position::GameState;
use crate::Score;
use chess::{BoardStatus, Color, Piece};
use serde::{Deserialize, Serialize};

/// Score for the side to move when it is checkmated.
pub const MATE_SCORE: Score = 100_000;

/// Standard centipawn values for chess pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceValues {
    pub pawn: Score,
    pub knight: Score,
    pub bishop: Score,
    pub rook: Score,
    pub queen: Score,
    /// Static king value (used by the hang check, which exempts kings anyway)
    pub king: Score,
    /// King value in material accounting before the endgame
    pub risk_king_middlegame: Score,
    /// King value in material accounting once the board has thinned out
    pub risk_king_endgame: Score,
    /// Non-pawn material per side at or below which the king counts as active
    pub endgame_material: Score,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
            king: 0,
            risk_king_middlegame: 0,
            risk_king_endgame: 300,
            endgame_material: 1300,
        }
    }
}

impl PieceValues {
    pub fn value(&self, piece: Piece) -> Score {
        match piece {
            Piece::Pawn => self.pawn,
            Piece::Knight => self.knight,
            Piece::Bishop => self.bishop,
            Piece::Rook => self.rook,
            Piece::Queen => self.queen,
            Piece::King => self.king,
        }
    }
}

/// Interface to the static evaluator consumed by the search.
///
/// All scores are from the perspective of the side to move.
pub trait StaticEvaluator {
    /// Value of a piece in the static table.
    fn piece_value(&self, piece: Piece) -> Score;

    /// Context-sensitive king value used by material accounting in the
    /// shallow risk search.
    fn king_value(&self, state: &GameState, color: Color) -> Score;

    /// Multiplier applied by [`StaticEvaluator::evaluate`] on top of the
    /// material-unit score. Always at least 1.
    fn material_weight(&self) -> Score;

    /// Material-unit score, terminal-aware. This is the quiescence stand-pat.
    fn quiet_score(&self, state: &GameState) -> Score;

    /// Full static evaluation: the quiet score scaled by the material weight.
    fn evaluate(&self, state: &GameState) -> Score {
        let quiet = self.quiet_score(state);
        if quiet.abs() >= MATE_SCORE {
            return quiet;
        }
        quiet * self.material_weight()
    }

    /// Material of `color` minus material of the opponent, kings included at
    /// [`StaticEvaluator::king_value`].
    fn material_balance(&self, state: &GameState, color: Color) -> Score;
}

/// Plain material counting with terminal-state handling.
#[derive(Debug, Clone)]
pub struct MaterialEvaluator {
    piece_values: PieceValues,
    material_weight: Score,
}

impl MaterialEvaluator {
    pub fn new(piece_values: PieceValues, material_weight: Score) -> Self {
        Self {
            piece_values,
            material_weight: material_weight.max(1),
        }
    }

    pub fn piece_values(&self) -> &PieceValues {
        &self.piece_values
    }

    fn count_material(&self, state: &GameState, color: Color) -> Score {
        let board = state.board();
        let ours = board.color_combined(color);
        [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .iter()
            .map(|&piece| (board.pieces(piece) & ours).popcnt() as Score * self.piece_value(piece))
            .sum()
    }

    fn non_pawn_material(&self, state: &GameState, color: Color) -> Score {
        let pawns = (state.board().pieces(Piece::Pawn) & state.board().color_combined(color))
            .popcnt() as Score;
        self.count_material(state, color) - pawns * self.piece_values.pawn
    }
}

impl Default for MaterialEvaluator {
    fn default() -> Self {
        Self::new(PieceValues::default(), 1)
    }
}

impl StaticEvaluator for MaterialEvaluator {
    fn piece_value(&self, piece: Piece) -> Score {
        self.piece_values.value(piece)
    }

    fn king_value(&self, state: &GameState, _color: Color) -> Score {
        let threshold = self.piece_values.endgame_material;
        let endgame = self.non_pawn_material(state, Color::White) <= threshold
            && self.non_pawn_material(state, Color::Black) <= threshold;
        if endgame {
            self.piece_values.risk_king_endgame
        } else {
            self.piece_values.risk_king_middlegame
        }
    }

    fn material_weight(&self) -> Score {
        self.material_weight
    }

    fn quiet_score(&self, state: &GameState) -> Score {
        match state.status() {
            BoardStatus::Checkmate => return -MATE_SCORE,
            BoardStatus::Stalemate => return 0,
            BoardStatus::Ongoing => {}
        }
        if state.repetition_count() >= 3 {
            return 0;
        }
        let us = state.side_to_move();
        self.count_material(state, us) - self.count_material(state, !us)
    }

    fn material_balance(&self, state: &GameState, color: Color) -> Score {
        let kings = self.king_value(state, color) - self.king_value(state, !color);
        self.count_material(state, color) - self.count_material(state, !color) + kings
    }
}
