//! Static Exchange Evaluation (SEE): the material balance after all
//! exchanges on a single square, used by quiescence search to discard
//! captures that are clearly losing before recursing into them.

use crate::attack_tables;
use crate::board::state::Board;
use crate::types::{Bitboard, Color, Piece, Square};

#[rustfmt::skip]
const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20000];

const MAX_EXCHANGE_DEPTH: usize = 32;

/// Piece value used for SEE and for quiescence's delta-pruning margin.
#[must_use]
pub(crate) fn see_value(piece: Piece) -> i32 {
    SEE_VALUES[piece.index()]
}

impl Board {
    /// Material balance after the full capture sequence on `to`, from the
    /// perspective of the side initiating the capture at `from`. Positive
    /// means the capturing side comes out ahead.
    #[must_use]
    pub(crate) fn see(&self, from: Square, to: Square) -> i32 {
        let captured = match self.piece_at(to) {
            Some((piece, _)) => piece,
            None if self.en_passant_square() == Some(to) => Piece::Pawn,
            None => return 0,
        };
        let Some((attacker, _)) = self.piece_at(from) else { return 0 };
        self.see_exchange(from, to, attacker, captured)
    }

    /// `true` if `see(from, to) >= threshold`, without materializing the
    /// exact score — used by quiescence's per-depth SEE gate.
    #[must_use]
    pub(crate) fn see_ge(&self, from: Square, to: Square, threshold: i32) -> bool {
        self.see(from, to) >= threshold
    }

    fn see_exchange(&self, from: Square, to: Square, attacker: Piece, victim: Piece) -> i32 {
        let mut gain = [0i32; MAX_EXCHANGE_DEPTH];
        let mut depth = 0;
        gain[0] = SEE_VALUES[victim.index()];

        let mut occupied = self.all_occupied();
        let mut attackers = self.attackers_to(to, occupied);
        let mut side = self.side_to_move();
        let mut current_attacker = attacker;
        let mut from_bb = Bitboard::from_square(from);

        loop {
            occupied &= !from_bb;
            attackers &= !from_bb;

            if matches!(current_attacker, Piece::Pawn | Piece::Bishop | Piece::Queen) {
                let diag_sliders = self.pieces_bb(Color::White, Piece::Bishop)
                    | self.pieces_bb(Color::Black, Piece::Bishop)
                    | self.pieces_bb(Color::White, Piece::Queen)
                    | self.pieces_bb(Color::Black, Piece::Queen);
                attackers |= attack_tables::bishop_attacks(to, occupied) & diag_sliders & occupied;
            }
            if matches!(current_attacker, Piece::Rook | Piece::Queen) {
                let straight_sliders = self.pieces_bb(Color::White, Piece::Rook)
                    | self.pieces_bb(Color::Black, Piece::Rook)
                    | self.pieces_bb(Color::White, Piece::Queen)
                    | self.pieces_bb(Color::Black, Piece::Queen);
                attackers |= attack_tables::rook_attacks(to, occupied) & straight_sliders & occupied;
            }

            side = side.opponent();
            let side_attackers = attackers & self.occupied_bb(side);
            if side_attackers.is_empty() {
                break;
            }

            depth += 1;
            if depth >= MAX_EXCHANGE_DEPTH {
                break;
            }

            let Some((lva_piece, lva_sq)) = self.least_valuable_attacker(side_attackers, side) else { break };
            gain[depth] = SEE_VALUES[current_attacker.index()] - gain[depth - 1];

            if (-gain[depth - 1]).max(gain[depth]) < 0 {
                break;
            }

            if lva_piece == Piece::King && !(attackers & self.occupied_bb(side.opponent())).is_empty() {
                break;
            }

            current_attacker = lva_piece;
            from_bb = Bitboard::from_square(lva_sq);
        }

        while depth > 0 {
            depth -= 1;
            gain[depth] = -(-gain[depth]).max(gain[depth + 1]);
        }
        gain[0]
    }

    fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let mut attackers = Bitboard::EMPTY;
        attackers |= attack_tables::pawn_attacks(Color::White, sq) & self.pieces_bb(Color::Black, Piece::Pawn);
        attackers |= attack_tables::pawn_attacks(Color::Black, sq) & self.pieces_bb(Color::White, Piece::Pawn);
        attackers |= attack_tables::knight_attacks(sq)
            & (self.pieces_bb(Color::White, Piece::Knight) | self.pieces_bb(Color::Black, Piece::Knight));
        attackers |= attack_tables::king_attacks(sq)
            & (self.pieces_bb(Color::White, Piece::King) | self.pieces_bb(Color::Black, Piece::King));
        let diag_sliders = self.pieces_bb(Color::White, Piece::Bishop)
            | self.pieces_bb(Color::Black, Piece::Bishop)
            | self.pieces_bb(Color::White, Piece::Queen)
            | self.pieces_bb(Color::Black, Piece::Queen);
        attackers |= attack_tables::bishop_attacks(sq, occupied) & diag_sliders;
        let straight_sliders = self.pieces_bb(Color::White, Piece::Rook)
            | self.pieces_bb(Color::Black, Piece::Rook)
            | self.pieces_bb(Color::White, Piece::Queen)
            | self.pieces_bb(Color::Black, Piece::Queen);
        attackers |= attack_tables::rook_attacks(sq, occupied) & straight_sliders;
        attackers
    }

    /// Cheapest attacker in `attackers` belonging to `color`, least to most valuable.
    fn least_valuable_attacker(&self, attackers: Bitboard, color: Color) -> Option<(Piece, Square)> {
        for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
            let candidates = attackers & self.pieces_bb(color, piece);
            if !candidates.is_empty() {
                return Some((piece, candidates.lsb()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winning_an_undefended_pawn_scores_its_value() {
        let board = Board::from_fen("8/8/8/3p4/4P3/8/8/8 w - - 0 1").unwrap();
        assert_eq!(board.see(Square::new(3, 4), Square::new(4, 3)), 100);
    }

    #[test]
    fn trading_pawns_is_an_even_exchange() {
        let board = Board::from_fen("8/8/2p5/3p4/4P3/8/8/8 w - - 0 1").unwrap();
        assert_eq!(board.see(Square::new(3, 4), Square::new(4, 3)), 0);
    }

    #[test]
    fn knight_taking_a_pawn_defended_by_a_pawn_loses_material() {
        let board = Board::from_fen("8/8/2p5/3p4/4N3/8/8/8 w - - 0 1").unwrap();
        assert!(board.see(Square::new(3, 4), Square::new(4, 3)) < 0);
    }

    #[test]
    fn xray_rook_behind_rook_still_wins_an_undefended_exchange() {
        let board = Board::from_fen("3r4/8/8/8/8/8/8/R2R4 w - - 0 1").unwrap();
        assert_eq!(board.see(Square::new(0, 0), Square::new(7, 3)), 500);
    }

    #[test]
    fn undefended_pawn_capture_is_not_spoiled_by_a_distant_king() {
        // e8 is two ranks from e6, too far to recapture, regardless of
        // the idle white rook sitting on the board.
        let board = Board::from_fen("4k3/8/4p3/3P4/8/8/8/4R3 w - - 0 1").unwrap();
        assert_eq!(board.see(Square::new(4, 3), Square::new(5, 4)), 100);
    }

    #[test]
    fn en_passant_capture_wins_the_pawn() {
        let board = Board::from_fen("8/8/8/3Pp3/8/8/8/8 w - e6 0 1").unwrap();
        assert_eq!(board.see(Square::new(4, 3), Square::new(5, 4)), 100);
    }

    #[test]
    fn see_ge_reports_the_threshold_correctly() {
        let board = Board::from_fen("8/8/8/3p4/4N3/8/8/8 w - - 0 1").unwrap();
        assert!(board.see_ge(Square::new(3, 4), Square::new(4, 3), 0));
        assert!(board.see_ge(Square::new(3, 4), Square::new(4, 3), 100));
        assert!(!board.see_ge(Square::new(3, 4), Square::new(4, 3), 200));
    }
}
