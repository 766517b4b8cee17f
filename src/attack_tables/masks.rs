//! Precomputed leaper-piece attack tables and static positional masks.

use once_cell::sync::Lazy;

use crate::types::{Bitboard, Color, Square};

fn knight_attacks_from(sq: Square) -> Bitboard {
    const DELTAS: [(i32, i32); 8] =
        [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
    leaper_attacks_from(sq, &DELTAS)
}

fn king_attacks_from(sq: Square) -> Bitboard {
    const DELTAS: [(i32, i32); 8] =
        [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
    leaper_attacks_from(sq, &DELTAS)
}

fn leaper_attacks_from(sq: Square, deltas: &[(i32, i32)]) -> Bitboard {
    let rank = sq.rank() as i32;
    let file = sq.file() as i32;
    let mut bb = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let r = rank + dr;
        let f = file + df;
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb |= Bitboard::from_square(Square::new(r as usize, f as usize));
        }
    }
    bb
}

fn pawn_attacks_from(sq: Square, color: Color) -> Bitboard {
    let rank = sq.rank() as i32;
    let file = sq.file() as i32;
    let dr = if color.is_white() { 1 } else { -1 };
    let mut bb = Bitboard::EMPTY;
    for df in [-1, 1] {
        let r = rank + dr;
        let f = file + df;
        if (0..8).contains(&r) && (0..8).contains(&f) {
            bb |= Bitboard::from_square(Square::new(r as usize, f as usize));
        }
    }
    bb
}

static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, slot) in table.iter_mut().enumerate() {
        *slot = knight_attacks_from(Square::from_index(idx));
    }
    table
});

static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, slot) in table.iter_mut().enumerate() {
        *slot = king_attacks_from(Square::from_index(idx));
    }
    table
});

static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for color in [Color::White, Color::Black] {
        for idx in 0..64 {
            table[color.index()][idx] = pawn_attacks_from(Square::from_index(idx), color);
        }
    }
    table
});

#[inline]
#[must_use]
pub(crate) fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.as_index()]
}

#[inline]
#[must_use]
pub(crate) fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.as_index()]
}

#[inline]
#[must_use]
pub(crate) fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][sq.as_index()]
}

/// Bitboard of all squares on the given file (0=a, 7=h).
static FILE_MASKS: Lazy<[Bitboard; 8]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 8];
    for (file, slot) in table.iter_mut().enumerate() {
        let mut bb = Bitboard::EMPTY;
        for rank in 0..8 {
            bb |= Bitboard::from_square(Square::new(rank, file));
        }
        *slot = bb;
    }
    table
});

#[inline]
#[must_use]
pub(crate) fn file_mask(file: usize) -> Bitboard {
    FILE_MASKS[file]
}

/// The given file plus its immediate neighbours, used for passed-pawn checks
/// and rook-on-open/half-open-file scoring.
static ADJACENT_FILES_MASKS: Lazy<[Bitboard; 8]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 8];
    for (file, slot) in table.iter_mut().enumerate() {
        let mut bb = file_mask(file);
        if file > 0 {
            bb |= file_mask(file - 1);
        }
        if file < 7 {
            bb |= file_mask(file + 1);
        }
        *slot = bb;
    }
    table
});

#[inline]
#[must_use]
pub(crate) fn adjacent_files_mask(file: usize) -> Bitboard {
    ADJACENT_FILES_MASKS[file]
}

/// Squares ahead of `sq` (towards promotion) on `sq`'s file and both
/// neighbouring files, for `color`. A pawn is passed when this mask is clear
/// of enemy pawns.
static PASSED_PAWN_MASKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for color in [Color::White, Color::Black] {
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            let rank = sq.rank() as i32;
            let file = sq.file();
            let mut bb = Bitboard::EMPTY;
            let ranks: Vec<i32> = if color.is_white() { ((rank + 1)..8).collect() } else { (0..rank).collect() };
            for r in ranks {
                for f in file.saturating_sub(1)..=(file + 1).min(7) {
                    bb |= Bitboard::from_square(Square::new(r as usize, f));
                }
            }
            table[color.index()][idx] = bb;
        }
    }
    table
});

#[inline]
#[must_use]
pub(crate) fn passed_pawn_mask(color: Color, sq: Square) -> Bitboard {
    PASSED_PAWN_MASKS[color.index()][sq.as_index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_on_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square::new(0, 0)).popcount(), 2);
    }

    #[test]
    fn king_in_centre_has_eight_targets() {
        assert_eq!(king_attacks(Square::new(3, 3)).popcount(), 8);
    }

    #[test]
    fn white_pawn_attacks_diagonally_forward() {
        let attacks = pawn_attacks(Color::White, Square::new(3, 3));
        assert!(attacks.contains(Square::new(4, 2)));
        assert!(attacks.contains(Square::new(4, 4)));
        assert_eq!(attacks.popcount(), 2);
    }

    #[test]
    fn passed_pawn_mask_excludes_squares_behind() {
        let mask = passed_pawn_mask(Color::White, Square::new(3, 3));
        assert!(!mask.contains(Square::new(2, 3)));
        assert!(mask.contains(Square::new(4, 3)));
        assert!(mask.contains(Square::new(7, 4)));
    }
}
