//! Tapered static evaluation: incremental material/PST plus a handful of
//! additional terms, each a flat centipawn addition on top of the tapered
//! base rather than a further mg/eg split.

use crate::attack_tables;
use crate::board::pst::PHASE_TOTAL;
use crate::board::state::Board;
use crate::types::{Bitboard, Color, Piece, Square};

const BISHOP_PAIR_BONUS: i32 = 40;

#[rustfmt::skip]
const PASSED_PAWN_BONUS: [i32; 8] = [0, 10, 17, 15, 62, 168, 276, 0];

const ROOK_OPEN_FILE: i32 = 10;
const ROOK_SEMI_OPEN_FILE: i32 = 4;

const KNIGHT_MOBILITY: i32 = 3;
const BISHOP_MOBILITY: i32 = 2;
const ROOK_MOBILITY: i32 = 2;
const QUEEN_MOBILITY: i32 = 1;
/// Mobility is only worth counting while there's still enough material on
/// the board for it to matter.
const MOBILITY_PHASE_THRESHOLD: i32 = 7;

const KING_PAWN_SHIELD_BONUS: i32 = 4;
/// Skipped once the game is past the middlegame: shelter in front of a king
/// that's about to be the only piece left doesn't mean much.
const KING_SHIELD_PHASE_THRESHOLD: i32 = 12;

/// Trading behaviour: nudge a side that's already winning to simplify,
/// asymmetrically — the penalty for a losing side that keeps pieces on is
/// steeper than the reward for a winning side that trades them off.
const TRADE_BONUS_MIN_ABS: i32 = 100;
const TRADE_WINNING_THRESHOLD: i32 = 150;
const TRADE_LOSING_THRESHOLD: i32 = -100;
const TRADE_BONUS_PER_PIECE: i32 = 8;
const TRADE_PENALTY_PER_PIECE: i32 = 10;

/// Mop-up kicks in once there's not much material left and one side has a
/// clear edge: drive the losing king to the rim, our king towards it.
const MOPUP_PHASE_THRESHOLD: i32 = 9;
const MOPUP_MIN_ADVANTAGE: i32 = 200;
const MOPUP_EDGE_WEIGHT: i32 = 4;
const MOPUP_KING_DISTANCE_WEIGHT: i32 = 2;

impl Board {
    /// Static evaluation in centipawns from the side-to-move's perspective.
    #[must_use]
    pub fn evaluate(&self) -> i32 {
        let phase = self.phase.min(PHASE_TOTAL);
        let mg_phase = phase;
        let eg_phase = PHASE_TOTAL - phase;

        let mut evaluation = (self.mg_score * mg_phase + self.eg_score * eg_phase) / PHASE_TOTAL;

        evaluation += self.bishop_pair_term();
        evaluation += self.passed_pawn_term();
        evaluation += self.king_shield_term(phase);
        evaluation += self.rook_file_term();
        evaluation += self.mobility_term(phase);
        evaluation += self.trade_bonus_term(evaluation);
        evaluation += self.mopup_term(phase, evaluation);

        if self.side_to_move() == Color::White {
            evaluation
        } else {
            -evaluation
        }
    }

    fn bishop_pair_term(&self) -> i32 {
        let white = i32::from(self.pieces_bb(Color::White, Piece::Bishop).popcount() >= 2);
        let black = i32::from(self.pieces_bb(Color::Black, Piece::Bishop).popcount() >= 2);
        (white - black) * BISHOP_PAIR_BONUS
    }

    fn passed_pawn_term(&self) -> i32 {
        let mut score = 0;
        for color in [Color::White, Color::Black] {
            let sign = if color.is_white() { 1 } else { -1 };
            let enemy_pawns = self.pieces_bb(color.opponent(), Piece::Pawn);
            for sq in self.pieces_bb(color, Piece::Pawn) {
                if (attack_tables::passed_pawn_mask(color, sq) & enemy_pawns).is_empty() {
                    let rank_from_start = if color.is_white() { sq.rank() } else { 7 - sq.rank() };
                    score += sign * PASSED_PAWN_BONUS[rank_from_start];
                }
            }
        }
        score
    }

    fn rook_file_term(&self) -> i32 {
        let mut score = 0;
        let all_pawns = self.pieces_bb(Color::White, Piece::Pawn) | self.pieces_bb(Color::Black, Piece::Pawn);
        for color in [Color::White, Color::Black] {
            let sign = if color.is_white() { 1 } else { -1 };
            let own_pawns = self.pieces_bb(color, Piece::Pawn);
            for sq in self.pieces_bb(color, Piece::Rook) {
                let file_mask = attack_tables::file_mask(sq.file());
                let has_any_pawn = !(file_mask & all_pawns).is_empty();
                let has_own_pawn = !(file_mask & own_pawns).is_empty();
                if !has_any_pawn {
                    score += sign * ROOK_OPEN_FILE;
                } else if !has_own_pawn {
                    score += sign * ROOK_SEMI_OPEN_FILE;
                }
            }
        }
        score
    }

    fn mobility_term(&self, phase: i32) -> i32 {
        if phase <= MOBILITY_PHASE_THRESHOLD {
            return 0;
        }
        let mut score = 0;
        let occ = self.all_occupied();
        for color in [Color::White, Color::Black] {
            let sign = if color.is_white() { 1 } else { -1 };
            let own = self.occupied_bb(color);
            let knight_moves: u32 =
                self.pieces_bb(color, Piece::Knight).iter().map(|sq| (attack_tables::knight_attacks(sq) & !own).popcount()).sum();
            let bishop_moves: u32 = self
                .pieces_bb(color, Piece::Bishop)
                .iter()
                .map(|sq| (attack_tables::bishop_attacks(sq, occ) & !own).popcount())
                .sum();
            let rook_moves: u32 =
                self.pieces_bb(color, Piece::Rook).iter().map(|sq| (attack_tables::rook_attacks(sq, occ) & !own).popcount()).sum();
            let queen_moves: u32 = self
                .pieces_bb(color, Piece::Queen)
                .iter()
                .map(|sq| (attack_tables::queen_attacks(sq, occ) & !own).popcount())
                .sum();

            score += sign
                * (knight_moves as i32 * KNIGHT_MOBILITY
                    + bishop_moves as i32 * BISHOP_MOBILITY
                    + rook_moves as i32 * ROOK_MOBILITY
                    + queen_moves as i32 * QUEEN_MOBILITY);
        }
        score
    }

    fn king_shield_term(&self, phase: i32) -> i32 {
        if phase < KING_SHIELD_PHASE_THRESHOLD {
            return 0;
        }
        let mut score = 0;
        for color in [Color::White, Color::Black] {
            let sign = if color.is_white() { 1 } else { -1 };
            let king_sq = self.king_square(color);
            let own_pawns = self.pieces_bb(color, Piece::Pawn);
            let shield = king_shield_mask(color, king_sq) & own_pawns;
            score += sign * shield.popcount() as i32 * KING_PAWN_SHIELD_BONUS;
        }
        score
    }

    /// Rewards simplifying when already winning by a wide margin, and
    /// (more steeply) punishes holding pieces on while losing by one.
    /// `evaluation` here is the absolute (White-positive) running total
    /// accumulated so far this call.
    fn trade_bonus_term(&self, evaluation: i32) -> i32 {
        if evaluation.abs() < TRADE_BONUS_MIN_ABS {
            return 0;
        }
        let total_pieces: i32 = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .into_iter()
            .map(|p| (self.pieces_bb(Color::White, p) | self.pieces_bb(Color::Black, p)).popcount() as i32)
            .sum();
        let simplification_level = PHASE_TOTAL - total_pieces;

        if evaluation > TRADE_WINNING_THRESHOLD {
            simplification_level * TRADE_BONUS_PER_PIECE
        } else if evaluation < TRADE_LOSING_THRESHOLD {
            -simplification_level * TRADE_PENALTY_PER_PIECE
        } else {
            0
        }
    }

    /// `evaluation` is the absolute running total including the trade bonus
    /// just added; the side a clear winner from the mover's point of view
    /// gets pushed to corner the opposing king.
    fn mopup_term(&self, phase: i32, evaluation: i32) -> i32 {
        if phase >= MOPUP_PHASE_THRESHOLD {
            return 0;
        }
        let score_relative_to_mover = if self.side_to_move() == Color::White { evaluation } else { -evaluation };
        let winning_color = if score_relative_to_mover > MOPUP_MIN_ADVANTAGE {
            Some(self.side_to_move())
        } else if score_relative_to_mover < -MOPUP_MIN_ADVANTAGE {
            Some(self.side_to_move().opponent())
        } else {
            None
        };
        let Some(winning_color) = winning_color else { return 0 };

        let losing_color = winning_color.opponent();
        let winning_king = self.king_square(winning_color);
        let losing_king = self.king_square(losing_color);
        let edge_distance = losing_king.centre_distance();
        let king_distance = winning_king.manhattan_distance(losing_king);

        let bonus = edge_distance * MOPUP_EDGE_WEIGHT + (14 - king_distance) * MOPUP_KING_DISTANCE_WEIGHT;
        if winning_color.is_white() {
            bonus
        } else {
            -bonus
        }
    }
}

/// Squares up to two ranks ahead of `king_sq` (towards the enemy side) on
/// the king's file or an adjacent file.
fn king_shield_mask(color: Color, king_sq: Square) -> Bitboard {
    let king_rank = king_sq.rank() as i32;
    let king_file = king_sq.file() as i32;
    let direction = if color.is_white() { 1 } else { -1 };

    let mut mask = Bitboard::EMPTY;
    for rank_offset in 1..=2 {
        let rank = king_rank + direction * rank_offset;
        for file_offset in -1..=1 {
            let file = king_file + file_offset;
            if let (Ok(rank), Ok(file)) = (usize::try_from(rank), usize::try_from(file)) {
                if let Some(sq) = Square::try_new(rank, file) {
                    mask |= Bitboard::from_square(sq);
                }
            }
        }
    }
    mask
}
