//! Move application: incremental hash/eval bookkeeping plus an undo record
//! that restores prior state in O(1) instead of recomputing it.

use crate::board::pst;
use crate::board::state::Board;
use crate::types::{Bitboard, Color, Move, Piece, Square};
use crate::zobrist;

const WHITE_KING_HOME: Square = Square::new(0, 4);
const WHITE_KINGSIDE_ROOK_HOME: Square = Square::new(0, 7);
const WHITE_QUEENSIDE_ROOK_HOME: Square = Square::new(0, 0);
const BLACK_KING_HOME: Square = Square::new(7, 4);
const BLACK_KINGSIDE_ROOK_HOME: Square = Square::new(7, 7);
const BLACK_QUEENSIDE_ROOK_HOME: Square = Square::new(7, 0);

/// Everything needed to undo a `make_move` without recomputing the hash,
/// tapered-eval accumulators, or phase from scratch.
pub(crate) struct UnmakeInfo {
    captured: Option<(Piece, Color, Square)>,
    prev_castling_rights: u8,
    prev_en_passant: Option<Square>,
    prev_halfmove_clock: u32,
    prev_fullmove_number: u32,
    prev_hash: u64,
    prev_mg_score: i32,
    prev_eg_score: i32,
    prev_phase: i32,
}

pub(crate) struct NullMoveInfo {
    prev_en_passant: Option<Square>,
    prev_hash: u64,
    prev_halfmove_clock: u32,
}

impl Board {
    #[inline]
    pub(crate) fn piece_on(&self, sq: Square) -> Option<(Piece, Color)> {
        self.piece_at(sq)
    }

    #[inline]
    fn is_empty_at(&self, sq: Square) -> bool {
        !self.all_occupied.contains(sq)
    }

    /// Adds a piece and folds its contribution into hash/eval/phase.
    #[inline]
    fn place_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bit;
        self.occupied[color.index()] |= bit;
        self.all_occupied |= bit;
        self.hash ^= zobrist::piece_key(piece, color, sq.as_index());
        let sign = if color.is_white() { 1 } else { -1 };
        self.mg_score += sign * (pst::MATERIAL_MG[piece.index()] + pst::mg_value(piece, color, sq));
        self.eg_score += sign * (pst::MATERIAL_EG[piece.index()] + pst::eg_value(piece, color, sq));
        self.phase += pst::PHASE_WEIGHTS[piece.index()];
    }

    /// Removes a piece and unwinds its contribution from hash/eval/phase.
    #[inline]
    fn remove_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= !bit;
        self.occupied[color.index()] &= !bit;
        self.all_occupied &= !bit;
        self.hash ^= zobrist::piece_key(piece, color, sq.as_index());
        let sign = if color.is_white() { 1 } else { -1 };
        self.mg_score -= sign * (pst::MATERIAL_MG[piece.index()] + pst::mg_value(piece, color, sq));
        self.eg_score -= sign * (pst::MATERIAL_EG[piece.index()] + pst::eg_value(piece, color, sq));
        self.phase -= pst::PHASE_WEIGHTS[piece.index()];
    }

    /// Raw relocation used only by `unmake_move`, which restores hash/eval
    /// from the snapshot in `UnmakeInfo` rather than re-deriving it.
    #[inline]
    fn raw_move(&mut self, color: Color, piece: Piece, from: Square, to: Square) {
        let from_bit = Bitboard::from_square(from);
        let to_bit = Bitboard::from_square(to);
        self.pieces[color.index()][piece.index()] &= !to_bit;
        self.pieces[color.index()][piece.index()] |= from_bit;
        self.occupied[color.index()] &= !to_bit;
        self.occupied[color.index()] |= from_bit;
        self.all_occupied &= !to_bit;
        self.all_occupied |= from_bit;
    }

    #[inline]
    fn raw_place(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bit;
        self.occupied[color.index()] |= bit;
        self.all_occupied |= bit;
    }

    #[inline]
    fn raw_remove(&mut self, color: Color, piece: Piece, sq: Square) {
        let bit = !Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= bit;
        self.occupied[color.index()] &= bit;
        self.all_occupied &= bit;
    }

    fn castling_home_squares(color: Color) -> (Square, Square, Square) {
        if color.is_white() {
            (WHITE_KING_HOME, WHITE_KINGSIDE_ROOK_HOME, WHITE_QUEENSIDE_ROOK_HOME)
        } else {
            (BLACK_KING_HOME, BLACK_KINGSIDE_ROOK_HOME, BLACK_QUEENSIDE_ROOK_HOME)
        }
    }

    /// Clears castling rights invalidated by a king/rook moving from, or a
    /// rook being captured on, its home square.
    fn update_castling_rights_for(&mut self, from: Square, captured_sq: Option<Square>) {
        for color in [Color::White, Color::Black] {
            let (king_home, ks_rook_home, qs_rook_home) = Board::castling_home_squares(color);
            let (ks_bit, qs_bit) = if color.is_white() {
                (crate::types::CASTLE_WHITE_K, crate::types::CASTLE_WHITE_Q)
            } else {
                (crate::types::CASTLE_BLACK_K, crate::types::CASTLE_BLACK_Q)
            };
            if from == king_home {
                self.castling_rights &= !(ks_bit | qs_bit);
            }
            if from == ks_rook_home || captured_sq == Some(ks_rook_home) {
                self.castling_rights &= !ks_bit;
            }
            if from == qs_rook_home || captured_sq == Some(qs_rook_home) {
                self.castling_rights &= !qs_bit;
            }
        }
    }

    /// Applies `mv` to the position and returns an undo record.
    ///
    /// Caller must ensure `mv` is pseudo-legal in the current position;
    /// legality (does this leave our own king in check?) is checked by the
    /// move generator, not here.
    pub(crate) fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let prev_castling_rights = self.castling_rights;
        let prev_en_passant = self.en_passant;
        let prev_halfmove_clock = self.halfmove_clock;
        let prev_fullmove_number = self.fullmove_number;
        let prev_hash = self.hash;
        let prev_mg_score = self.mg_score;
        let prev_eg_score = self.eg_score;
        let prev_phase = self.phase;

        let stm = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        debug_assert!(!self.is_empty_at(from), "make_move: no piece on source square");
        let (moving_piece, moving_color) = self.piece_on(from).expect("make_move: source square is empty");
        debug_assert_eq!(moving_color, stm, "make_move: moving a piece that isn't the side to move's");

        let mut captured = None;

        if mv.is_en_passant() {
            let captured_sq = Square::new(from.rank(), to.file());
            self.remove_piece(stm.opponent(), Piece::Pawn, captured_sq);
            captured = Some((Piece::Pawn, stm.opponent(), captured_sq));
        } else if mv.is_capture() {
            let (captured_piece, captured_color) = self.piece_on(to).expect("capture move targets an empty square");
            self.remove_piece(captured_color, captured_piece, to);
            captured = Some((captured_piece, captured_color, to));
        }

        self.remove_piece(stm, moving_piece, from);
        match mv.promotion_piece() {
            Some(promo) => self.place_piece(stm, promo, to),
            None => self.place_piece(stm, moving_piece, to),
        }

        if mv.is_castling() {
            let rank = from.rank();
            let (rook_from, rook_to) =
                if mv.is_castle_kingside() { (Square::new(rank, 7), Square::new(rank, 5)) } else { (Square::new(rank, 0), Square::new(rank, 3)) };
            self.remove_piece(stm, Piece::Rook, rook_from);
            self.place_piece(stm, Piece::Rook, rook_to);
        }

        self.update_castling_rights_for(from, captured.map(|(_, _, sq)| sq));
        self.hash ^= zobrist::castling_key(prev_castling_rights) ^ zobrist::castling_key(self.castling_rights);

        if let Some(ep) = prev_en_passant {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.en_passant = if mv.is_double_push() { Some(Square::new((from.rank() + to.rank()) / 2, from.file())) } else { None };
        if let Some(ep) = self.en_passant {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }

        self.halfmove_clock =
            if moving_piece == Piece::Pawn || captured.is_some() { 0 } else { self.halfmove_clock + 1 };
        if stm == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = stm.opponent();
        self.hash ^= zobrist::side_to_move_key();

        self.record_repetition();

        UnmakeInfo {
            captured,
            prev_castling_rights,
            prev_en_passant,
            prev_halfmove_clock,
            prev_fullmove_number,
            prev_hash,
            prev_mg_score,
            prev_eg_score,
            prev_phase,
        }
    }

    pub(crate) fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        self.forget_repetition();

        let stm = self.side_to_move.opponent();
        let from = mv.from();
        let to = mv.to();

        if mv.is_castling() {
            let rank = from.rank();
            let (rook_from, rook_to) =
                if mv.is_castle_kingside() { (Square::new(rank, 7), Square::new(rank, 5)) } else { (Square::new(rank, 0), Square::new(rank, 3)) };
            self.raw_move(stm, Piece::Rook, rook_to, rook_from);
        }

        match mv.promotion_piece() {
            Some(promo) => {
                self.raw_remove(stm, promo, to);
                self.raw_place(stm, Piece::Pawn, from);
            }
            None => {
                let (moved_piece, _) = self.piece_on(to).expect("unmake_move: destination square is empty");
                self.raw_move(stm, moved_piece, to, from);
            }
        }

        if let Some((piece, color, sq)) = info.captured {
            self.raw_place(color, piece, sq);
        }

        self.castling_rights = info.prev_castling_rights;
        self.en_passant = info.prev_en_passant;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.fullmove_number = info.prev_fullmove_number;
        self.hash = info.prev_hash;
        self.mg_score = info.prev_mg_score;
        self.eg_score = info.prev_eg_score;
        self.phase = info.prev_phase;
        self.side_to_move = stm;
    }

    /// Passes the turn without moving a piece (search-only, never seen by
    /// the UCI layer). Clears en passant but leaves material/PST untouched.
    pub(crate) fn make_null_move(&mut self) -> NullMoveInfo {
        let prev_en_passant = self.en_passant;
        let prev_hash = self.hash;
        let prev_halfmove_clock = self.halfmove_clock;

        if let Some(ep) = prev_en_passant {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.en_passant = None;
        self.halfmove_clock += 1;
        self.side_to_move = self.side_to_move.opponent();
        self.hash ^= zobrist::side_to_move_key();
        self.record_repetition();

        NullMoveInfo { prev_en_passant, prev_hash, prev_halfmove_clock }
    }

    pub(crate) fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.forget_repetition();
        self.side_to_move = self.side_to_move.opponent();
        self.en_passant = info.prev_en_passant;
        self.hash = info.prev_hash;
        self.halfmove_clock = info.prev_halfmove_clock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_move_round_trips_state() {
        let mut board = Board::new();
        let before_hash = board.hash();
        let before_fen = board.to_fen();
        let mv = Move::double_push(Square::new(1, 4), Square::new(3, 4));
        let info = board.make_move(mv);
        assert_ne!(board.hash(), before_hash);
        board.unmake_move(mv, info);
        assert_eq!(board.hash(), before_hash);
        assert_eq!(board.to_fen(), before_fen);
    }

    #[test]
    fn capture_restores_captured_piece() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.to_fen();
        let mv = Move::capture(Square::new(3, 4), Square::new(4, 4));
        let info = board.make_move(mv);
        assert!(board.piece_on(Square::new(4, 4)).is_some());
        board.unmake_move(mv, info);
        assert_eq!(board.to_fen(), before);
    }

    #[test]
    fn castling_moves_both_king_and_rook_and_reverses() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.to_fen();
        let mv = Move::castle_kingside(Square::new(0, 4), Square::new(0, 6));
        let info = board.make_move(mv);
        assert_eq!(board.piece_on(Square::new(0, 5)), Some((Piece::Rook, Color::White)));
        assert_eq!(board.piece_on(Square::new(0, 6)), Some((Piece::King, Color::White)));
        assert!(!board.castling_rights().has(Color::White, 'K'));
        board.unmake_move(mv, info);
        assert_eq!(board.to_fen(), before);
    }

    #[test]
    fn en_passant_capture_removes_the_passed_pawn() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.to_fen();
        let mv = Move::en_passant(Square::new(4, 4), Square::new(5, 3));
        let info = board.make_move(mv);
        assert!(board.piece_on(Square::new(4, 3)).is_none());
        board.unmake_move(mv, info);
        assert_eq!(board.to_fen(), before);
    }

    #[test]
    fn promotion_replaces_pawn_and_reverses() {
        let fen = "8/4P3/8/8/8/8/8/4K2k w - - 0 1";
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.to_fen();
        let mv = Move::promotion(Square::new(6, 4), Square::new(7, 4), Piece::Queen);
        let info = board.make_move(mv);
        assert_eq!(board.piece_on(Square::new(7, 4)), Some((Piece::Queen, Color::White)));
        board.unmake_move(mv, info);
        assert_eq!(board.to_fen(), before);
    }

    #[test]
    fn null_move_only_flips_side_to_move() {
        let mut board = Board::new();
        let before = board.to_fen();
        let info = board.make_null_move();
        assert_eq!(board.side_to_move(), Color::Black);
        board.unmake_null_move(info);
        assert_eq!(board.to_fen(), before);
    }
}
