//! Magic-bitboard sliding attack tables for bishops and rooks.
//!
//! Each square has a precomputed `(mask, magic, shift)` triple such that
//! `((occupied & mask).wrapping_mul(magic)) >> shift` is a perfect hash over
//! every occupancy subset of `mask` into a dense attack-table slice.

use once_cell::sync::Lazy;

use crate::types::{Bitboard, Square};

const ROOK_DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DELTAS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Attacks from `sq` sliding along `deltas`, stopping at (and including) the
/// first occupied square in each direction. `block_mask` is the full board
/// occupancy; this is the "slow" ray-tracer used only to build the tables.
fn sliding_attacks(sq: Square, deltas: &[(i32, i32)], occupied: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let rank = sq.rank() as i32;
    let file = sq.file() as i32;
    for &(dr, df) in deltas {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = Square::new(r as usize, f as usize);
            attacks |= Bitboard::from_square(target);
            if occupied.contains(target) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// The relevant-occupancy mask: every square a slider could move through,
/// excluding board edges (edge squares never block anything beyond them).
fn relevant_mask(sq: Square, deltas: &[(i32, i32)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    let rank = sq.rank() as i32;
    let file = sq.file() as i32;
    for &(dr, df) in deltas {
        let mut r = rank + dr;
        let mut f = file + df;
        loop {
            let next_r = r + dr;
            let next_f = f + df;
            if !(0..8).contains(&next_r) || !(0..8).contains(&next_f) {
                break;
            }
            mask |= Bitboard::from_square(Square::new(r as usize, f as usize));
            r = next_r;
            f = next_f;
        }
    }
    mask
}

/// Enumerate every subset of `mask` via the standard carry-rippler trick.
fn subsets_of(mask: Bitboard) -> Vec<Bitboard> {
    let mut subsets = Vec::with_capacity(1 << mask.popcount());
    let mut subset = 0u64;
    loop {
        subsets.push(Bitboard(subset));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }
    subsets
}

struct SquareMagic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    attacks: Vec<Bitboard>,
}

impl SquareMagic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        let relevant = occupied.0 & self.mask.0;
        (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }

    #[inline]
    fn attacks_for(&self, occupied: Bitboard) -> Bitboard {
        self.attacks[self.index(occupied)]
    }
}

/// Simple xorshift64* PRNG, seeded deterministically so the table build is
/// reproducible across runs (no dependency on a shared RNG state).
struct XorShift64(u64);

impl XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Sparse random candidates find magics faster than uniform ones.
    fn sparse_u64(&mut self) -> u64 {
        self.next_u64() & self.next_u64() & self.next_u64()
    }
}

const NUM_MAGIC_TRIES: u32 = 10_000_000;

fn find_magic(sq: Square, deltas: &[(i32, i32)], mask: Bitboard) -> (u64, u32, Vec<Bitboard>) {
    let subsets = subsets_of(mask);
    let reference: Vec<Bitboard> = subsets.iter().map(|&occ| sliding_attacks(sq, deltas, occ)).collect();
    let bits = mask.popcount();
    let shift = 64 - bits;
    let table_size = 1usize << bits;

    let mut rng = XorShift64(0x9E37_79B9_7F4A_7C15 ^ (sq.as_index() as u64 + 1));
    for _ in 0..NUM_MAGIC_TRIES {
        let magic = rng.sparse_u64();
        if ((mask.0.wrapping_mul(magic)) >> 56).count_ones() < 6 {
            continue;
        }
        let mut attacks = vec![None; table_size];
        let mut ok = true;
        for (i, &occ) in subsets.iter().enumerate() {
            let idx = ((occ.0 & mask.0).wrapping_mul(magic) >> shift) as usize;
            match attacks[idx] {
                None => attacks[idx] = Some(reference[i]),
                Some(existing) if existing == reference[i] => {}
                Some(_) => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            let filled = attacks.into_iter().map(|a| a.unwrap_or(Bitboard::EMPTY)).collect();
            return (magic, shift, filled);
        }
    }
    unreachable!("failed to find a magic number for square {sq} after {NUM_MAGIC_TRIES} tries");
}

fn build_table(deltas: &'static [(i32, i32)]) -> [SquareMagic; 64] {
    std::array::from_fn(|idx| {
        let sq = Square::from_index(idx);
        let mask = relevant_mask(sq, deltas);
        let (magic, shift, attacks) = find_magic(sq, deltas, mask);
        SquareMagic { mask, magic, shift, attacks }
    })
}

static ROOK_MAGICS: Lazy<[SquareMagic; 64]> = Lazy::new(|| build_table(&ROOK_DELTAS));
static BISHOP_MAGICS: Lazy<[SquareMagic; 64]> = Lazy::new(|| build_table(&BISHOP_DELTAS));

#[inline]
#[must_use]
pub(crate) fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ROOK_MAGICS[sq.as_index()].attacks_for(occupied)
}

#[inline]
#[must_use]
pub(crate) fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    BISHOP_MAGICS[sq.as_index()].attacks_for(occupied)
}

#[inline]
#[must_use]
pub(crate) fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}
