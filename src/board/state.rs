//! The `Board` struct: bitboard position state plus incrementally maintained
//! hash, tapered-eval accumulators, and repetition history.

use std::collections::HashMap;

use crate::board::pst;
use crate::types::{Bitboard, CastlingRights, Color, Piece, Square, ALL_CASTLING_RIGHTS};
use crate::zobrist;

/// Counts how many times each Zobrist hash has occurred along the current
/// search/game line, for twofold (in search) and threefold (at the root)
/// repetition detection.
#[derive(Clone, Debug, Default)]
pub(crate) struct RepetitionTable {
    counts: HashMap<u64, u8>,
}

impl RepetitionTable {
    fn record(&mut self, hash: u64) {
        *self.counts.entry(hash).or_insert(0) += 1;
    }

    fn forget(&mut self, hash: u64) {
        if let Some(count) = self.counts.get_mut(&hash) {
            if *count <= 1 {
                self.counts.remove(&hash);
            } else {
                *count -= 1;
            }
        }
    }

    pub(crate) fn count(&self, hash: u64) -> u8 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: u8,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
    pub(crate) mg_score: i32,
    pub(crate) eg_score: i32,
    pub(crate) phase: i32,
    pub(crate) repetitions: RepetitionTable,
}

impl Board {
    /// The standard chess starting position.
    #[must_use]
    pub fn new() -> Self {
        Self::from_fen(crate::board::fen::STARTPOS_FEN).expect("startpos FEN is well-formed")
    }

    pub(crate) fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            mg_score: 0,
            eg_score: 0,
            phase: 0,
            repetitions: RepetitionTable::default(),
        }
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        CastlingRights(self.castling_rights)
    }

    #[must_use]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[must_use]
    pub(crate) fn pieces_bb(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[must_use]
    pub(crate) fn occupied_bb(&self, color: Color) -> Bitboard {
        self.occupied[color.index()]
    }

    #[must_use]
    pub(crate) fn all_occupied(&self) -> Bitboard {
        self.all_occupied
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        for color in [Color::White, Color::Black] {
            if !self.occupied[color.index()].contains(sq) {
                continue;
            }
            for piece_idx in 0..6 {
                let piece = Piece::from_index(piece_idx);
                if self.pieces[color.index()][piece_idx].contains(sq) {
                    return Some((piece, color));
                }
            }
        }
        None
    }

    #[must_use]
    pub(crate) fn king_square(&self, color: Color) -> Square {
        self.pieces_bb(color, Piece::King).lsb()
    }

    /// Recomputes `hash`, `mg_score`, `eg_score`, and `phase` from scratch.
    /// Used at construction time; make/unmake otherwise maintain these
    /// incrementally to avoid an O(64) walk on every node.
    pub(crate) fn recalculate_incremental_state(&mut self) {
        let mut hash = 0u64;
        let mut mg_score = 0i32;
        let mut eg_score = 0i32;
        let mut phase = 0i32;

        for color in [Color::White, Color::Black] {
            let sign = if color.is_white() { 1 } else { -1 };
            for piece_idx in 0..6 {
                let piece = Piece::from_index(piece_idx);
                for sq in self.pieces[color.index()][piece_idx] {
                    hash ^= zobrist::piece_key(piece, color, sq.as_index());
                    mg_score += sign * (pst::MATERIAL_MG[piece_idx] + pst::mg_value(piece, color, sq));
                    eg_score += sign * (pst::MATERIAL_EG[piece_idx] + pst::eg_value(piece, color, sq));
                    phase += pst::PHASE_WEIGHTS[piece_idx];
                }
            }
        }

        hash ^= zobrist::castling_key(self.castling_rights);
        if let Some(ep) = self.en_passant {
            hash ^= zobrist::en_passant_key(ep.file());
        }
        if self.side_to_move == Color::Black {
            hash ^= zobrist::side_to_move_key();
        }

        self.hash = hash;
        self.mg_score = mg_score;
        self.eg_score = eg_score;
        self.phase = phase.min(pst::PHASE_TOTAL);
    }

    pub(crate) fn record_repetition(&mut self) {
        self.repetitions.record(self.hash);
    }

    pub(crate) fn forget_repetition(&mut self) {
        self.repetitions.forget(self.hash);
    }

    /// Twofold repetition within the current search line, or the fifty-move
    /// rule. Insufficient material is deliberately not folded in here: it
    /// would make the search treat e.g. a won K+minor-vs-K ending as an
    /// immediate draw at any node, not just the root.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.halfmove_clock >= 100 || self.repetitions.count(self.hash) >= 2
    }

    /// True when both sides' remaining bishops sit on the same square colour
    /// (relevant to a same-colour-bishop endgame draw heuristic).
    #[must_use]
    pub(crate) fn bishops_all_same_color(&self) -> bool {
        let bishops = self.pieces_bb(Color::White, Piece::Bishop) | self.pieces_bb(Color::Black, Piece::Bishop);
        if bishops.is_empty() {
            return false;
        }
        let mut iter = bishops.iter();
        let first_is_light = |sq: Square| (sq.rank() + sq.file()) % 2 == 1;
        let reference = first_is_light(iter.next().unwrap());
        iter.all(|sq| first_is_light(sq) == reference)
    }

    #[must_use]
    pub fn has_castling_rights(&self) -> bool {
        self.castling_rights & ALL_CASTLING_RIGHTS != 0
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}
