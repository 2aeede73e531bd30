//! Rules-engine adapter.
//!
//! [`GameState`] wraps the copy-make [`chess::Board`] in a make/unmake
//! interface: every applied move pushes a board and its Zobrist hash, and
//! every undo pops them again. The only way the search mutates a state is
//! through [`MoveGuard`], which undoes its move when dropped, so early
//! returns and alpha-beta cutoffs can never leave a move applied.

use crate::errors::Result;
use crate::{invalid_move, invalid_position};
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Board stack plus repetition history for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    boards: Vec<Board>,
    /// Hash of every position in `boards`, plus any earlier game history
    history: Vec<u64>,
}

impl GameState {
    pub fn new(board: Board) -> Self {
        Self {
            history: vec![board.get_hash()],
            boards: vec![board],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        let board = Board::from_str(fen)
            .map_err(|e| invalid_position!("could not parse FEN '{}': {}", fen, e))?;
        Ok(Self::new(board))
    }

    /// Replay a game record so that repetition counts reflect real history.
    pub fn from_moves(start: Board, moves: &[ChessMove]) -> Result<Self> {
        let mut state = Self::new(start);
        for &mv in moves {
            state.play(mv)?;
        }
        Ok(state)
    }

    /// Permanently play a move onto the game record.
    pub fn play(&mut self, mv: ChessMove) -> Result<()> {
        if !self.board().legal(mv) {
            return Err(invalid_move!("{} is not legal in {}", mv, self.board()));
        }
        self.push(mv);
        Ok(())
    }

    /// Apply a legal move for the lifetime of the returned guard.
    ///
    /// Callers must only pass moves produced by [`GameState::legal_moves`];
    /// legality is trusted here, not re-verified.
    pub fn make_move(&mut self, mv: ChessMove) -> MoveGuard<'_> {
        self.push(mv);
        MoveGuard { state: self }
    }

    fn push(&mut self, mv: ChessMove) {
        let next = self.board().make_move_new(mv);
        self.history.push(next.get_hash());
        self.boards.push(next);
    }

    fn pop(&mut self) {
        debug_assert!(self.boards.len() > 1, "unmake without a matching make");
        if self.boards.len() > 1 {
            self.boards.pop();
            self.history.pop();
        }
    }

    pub fn board(&self) -> &Board {
        // `boards` always holds the root board.
        &self.boards[self.boards.len() - 1]
    }

    /// Number of moves applied on top of the root board.
    pub fn ply(&self) -> usize {
        self.boards.len() - 1
    }

    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(self.board()).collect()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board().legal(mv)
    }

    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.board().piece_on(square)
    }

    pub fn color_on(&self, square: Square) -> Option<Color> {
        self.board().color_on(square)
    }

    /// Piece removed from the board by `mv`, including en passant victims.
    pub fn captured_piece(&self, mv: ChessMove) -> Option<Piece> {
        let board = self.board();
        if let Some(piece) = board.piece_on(mv.get_dest()) {
            if board.color_on(mv.get_dest()) == Some(!board.side_to_move()) {
                return Some(piece);
            }
            return None;
        }
        let is_pawn = board.piece_on(mv.get_source()) == Some(Piece::Pawn);
        if is_pawn && mv.get_source().get_file() != mv.get_dest().get_file() {
            return Some(Piece::Pawn);
        }
        None
    }

    pub fn is_capture(&self, mv: ChessMove) -> bool {
        self.captured_piece(mv).is_some()
    }

    pub fn gives_check(&self, mv: ChessMove) -> bool {
        self.board().make_move_new(mv).checkers().popcnt() > 0
    }

    pub fn in_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    pub fn status(&self) -> BoardStatus {
        self.board().status()
    }

    pub fn is_game_over(&self) -> bool {
        self.status() != BoardStatus::Ongoing
    }

    /// How many times the current position has occurred, itself included.
    pub fn repetition_count(&self) -> usize {
        let current = self.board().get_hash();
        self.history.iter().filter(|&&hash| hash == current).count()
    }

    /// Count how many pieces of `color` attack `square` on the current board.
    ///
    /// X-rays and pins are ignored; a piece standing on `square` never counts
    /// as attacking it.
    pub fn attacker_count(&self, color: Color, square: Square) -> usize {
        let board = self.board();
        let ours = board.color_combined(color);
        let mut count = 0;

        // Squares a pawn of `!color` on `square` would hit are the squares our
        // pawns attack it from; the lookup masks by its third argument.
        let our_pawns = board.pieces(Piece::Pawn) & ours;
        count += chess::get_pawn_attacks(square, !color, our_pawns).popcnt() as usize;

        let knight_attacks = chess::get_knight_moves(square);
        count += (knight_attacks & board.pieces(Piece::Knight) & ours).popcnt() as usize;

        let king_attacks = chess::get_king_moves(square);
        count += (king_attacks & board.pieces(Piece::King) & ours).popcnt() as usize;

        let occupied = *board.combined();

        let diagonal = chess::get_bishop_moves(square, occupied);
        let bishops_queens = (board.pieces(Piece::Bishop) | board.pieces(Piece::Queen)) & ours;
        count += (diagonal & bishops_queens).popcnt() as usize;

        let straight = chess::get_rook_moves(square, occupied);
        let rooks_queens = (board.pieces(Piece::Rook) | board.pieces(Piece::Queen)) & ours;
        count += (straight & rooks_queens).popcnt() as usize;

        count
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Board::default())
    }
}

/// Scoped make/unmake: the move stays applied until the guard is dropped.
pub struct MoveGuard<'a> {
    state: &'a mut GameState,
}

impl Deref for MoveGuard<'_> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        self.state
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut GameState {
        self.state
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.state.pop();
    }
}
