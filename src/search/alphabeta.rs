//! Fail-soft negamax: null-move pruning, late-move reduction with PVS
//! re-search, transposition-table cutoffs, and check extension.

use crate::board::Board;
use crate::search::ordering::score_moves;
use crate::search::quiescence::quiescence;
use crate::search::{score_from_tt, score_to_tt, SearchContext, MATE, MATE_THRESHOLD};
use crate::tt::Bound;
use crate::types::{Color, Move, Piece};

const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_BASE_REDUCTION: i32 = 3;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_FULL_DEPTH_MOVES: usize = 3;

fn lmr_reduction(depth: i32, move_index: usize) -> i32 {
    let d = depth.max(1) as u32;
    let m = move_index.max(1) as u32;
    let reduction = 1 + d.ilog2() as i32 + m.ilog2() as i32;
    reduction.clamp(1, (depth - 2).max(1))
}

fn has_non_pawn_material(board: &Board, color: Color) -> bool {
    [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen].into_iter().any(|p| !board.pieces_bb(color, p).is_empty())
}

/// Negamax search from `board`'s current position. Returns a fail-soft score
/// from the side-to-move's perspective; the value may lie outside
/// `[alpha, beta]` when that bound was exceeded.
pub(crate) fn negamax(board: &mut Board, ctx: &mut SearchContext, mut depth: i32, ply: u32, mut alpha: i32, mut beta: i32) -> i32 {
    ctx.count_node();
    if ctx.stopped {
        return alpha;
    }

    if ply > 0 {
        if board.is_draw() {
            return 0;
        }
        alpha = alpha.max(-MATE + ply as i32);
        beta = beta.min(MATE - ply as i32 - 1);
        if alpha >= beta {
            return alpha;
        }
    }

    let in_check = board.side_to_move_in_check();
    if in_check {
        depth += 1;
    }

    if depth <= 0 {
        return quiescence(board, ctx, ply, alpha, beta);
    }

    let hash = board.hash();
    let mut tt_move = None;
    if let Some((tt_depth, tt_score, bound, mv)) = ctx.tt.probe(hash) {
        tt_move = Some(mv);
        if tt_depth as i32 >= depth {
            let score = score_from_tt(tt_score, ply);
            let cutoff = match bound {
                Bound::Exact => true,
                Bound::Lower => score >= beta,
                Bound::Upper => score <= alpha,
            };
            if cutoff {
                return score;
            }
        }
    }

    let us = board.side_to_move();
    if !in_check
        && depth >= NULL_MOVE_MIN_DEPTH
        && ply > 0
        && has_non_pawn_material(board, us)
        && beta < MATE_THRESHOLD
    {
        let reduction = NULL_MOVE_BASE_REDUCTION + depth / 6;
        let info = board.make_null_move();
        let score = -negamax(board, ctx, depth - 1 - reduction, ply + 1, -beta, -beta + 1);
        board.unmake_null_move(info);
        if ctx.stopped {
            return alpha;
        }
        if score >= beta {
            return score;
        }
    }

    let moves = board.generate_pseudo_moves();
    let mut scored = score_moves(board, &moves, tt_move, ply as usize, &ctx.killers, &ctx.history);

    let original_alpha = alpha;
    let mut best_score = -MATE;
    let mut best_move = Move::null();
    let mut legal_count = 0usize;

    for i in 0..scored.len() {
        let Some(candidate) = scored.pick_best(i) else { break };
        let mv = candidate.mv;

        let info = board.make_move(mv);
        if board.is_in_check(us) {
            board.unmake_move(mv, info);
            continue;
        }
        legal_count += 1;

        let is_quiet = mv.is_quiet();
        let mut reduction = 0;
        if depth >= LMR_MIN_DEPTH && legal_count > LMR_FULL_DEPTH_MOVES && is_quiet && !in_check {
            reduction = lmr_reduction(depth, legal_count);
        }

        let score = if legal_count == 1 {
            -negamax(board, ctx, depth - 1, ply + 1, -beta, -alpha)
        } else {
            let mut s = -negamax(board, ctx, depth - 1 - reduction, ply + 1, -alpha - 1, -alpha);
            if s > alpha && reduction > 0 {
                s = -negamax(board, ctx, depth - 1, ply + 1, -alpha - 1, -alpha);
            }
            if s > alpha && s < beta {
                s = -negamax(board, ctx, depth - 1, ply + 1, -beta, -alpha);
            }
            s
        };

        board.unmake_move(mv, info);

        if ctx.stopped {
            return best_score.max(alpha);
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
            if score > alpha {
                alpha = score;
                if score >= beta {
                    if is_quiet {
                        ctx.killers.record(ply as usize, mv);
                        ctx.history.record(mv, depth);
                    }
                    break;
                }
            }
        }
    }

    if legal_count == 0 {
        return if in_check { -MATE + ply as i32 } else { 0 };
    }

    let bound = if best_score <= original_alpha {
        Bound::Upper
    } else if best_score >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    ctx.tt.store(hash, depth.min(i8::MAX as i32) as i8, score_to_tt(best_score, ply), bound, best_move);

    best_score
}
