//! Iterative-deepening search driver: aspiration windows wrapped around the
//! fail-soft negamax core in [`alphabeta`].

mod alphabeta;
mod ordering;
mod quiescence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use ordering::{HistoryTable, KillerTable};

use crate::board::Board;
use crate::tt::{TranspositionTable, DEFAULT_TT_MB};
use crate::types::{Move, MAX_PLY};

/// Score magnitude used to represent "mate", biased by ply-to-mate so that
/// shallower mates sort ahead of deeper ones.
pub const MATE: i32 = 30_000;
pub(crate) const MATE_THRESHOLD: i32 = MATE - MAX_PLY as i32;
const MAX_SEARCH_DEPTH: u32 = 64;
const ASPIRATION_DELTA: i32 = 50;
const NODE_CHECK_MASK: u64 = 0xFFF;

/// Converts a mate score measured from the current node into one measured
/// from the search root, so it can be compared across different plies once
/// stored in the transposition table.
fn score_to_tt(score: i32, ply: u32) -> i32 {
    if score > MATE_THRESHOLD {
        score + ply as i32
    } else if score < -MATE_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`]: rebases a stored mate score back onto the
/// current node's ply before it's used in a comparison.
fn score_from_tt(score: i32, ply: u32) -> i32 {
    if score > MATE_THRESHOLD {
        score - ply as i32
    } else if score < -MATE_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

/// Long-lived search state the engine keeps across successive `go` commands.
pub struct SearchTables {
    pub(crate) tt: TranspositionTable,
}

impl SearchTables {
    #[must_use]
    pub fn new(tt_size_mb: usize) -> Self {
        SearchTables { tt: TranspositionTable::new(tt_size_mb) }
    }

    pub fn resize(&mut self, tt_size_mb: usize) {
        self.tt = TranspositionTable::new(tt_size_mb);
    }

    pub fn clear(&mut self) {
        self.tt.clear();
    }
}

impl Default for SearchTables {
    fn default() -> Self {
        SearchTables::new(DEFAULT_TT_MB)
    }
}

/// Per-`go` search limits, as parsed from the UCI `go` command.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub infinite: bool,
}

fn compute_deadline(limits: &SearchLimits, board: &Board, start: Instant) -> Option<Instant> {
    if limits.infinite {
        return None;
    }
    if let Some(movetime) = limits.movetime_ms {
        return Some(start + Duration::from_millis(movetime));
    }
    let (my_time, my_inc) = if board.side_to_move().is_white() {
        (limits.wtime_ms, limits.winc_ms.unwrap_or(0))
    } else {
        (limits.btime_ms, limits.binc_ms.unwrap_or(0))
    };
    let my_time = my_time?;
    let allocated = (my_time / 20 + my_inc / 2).min(my_time.saturating_sub(50));
    Some(start + Duration::from_millis(allocated.max(1)))
}

/// Same allocation as [`compute_deadline`], expressed as a millisecond
/// duration from now rather than tied to a particular search's `start`
/// instant. Used by the engine controller to size its independent watchdog
/// thread, which backstops the search loop's own node-interval time checks.
pub(crate) fn hard_deadline_millis(limits: &SearchLimits, board: &Board) -> Option<u64> {
    let now = Instant::now();
    compute_deadline(limits, board, now).map(|deadline| deadline.saturating_duration_since(now).as_millis() as u64)
}

pub(crate) struct SearchContext<'a> {
    tt: &'a mut TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    nodes: u64,
    seldepth: u32,
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
    stopped: bool,
}

impl<'a> SearchContext<'a> {
    #[inline]
    fn count_node(&mut self) {
        self.nodes += 1;
        if self.nodes & NODE_CHECK_MASK == 0 {
            let timed_out = self.deadline.is_some_and(|d| Instant::now() >= d);
            if timed_out || self.stop.load(Ordering::Relaxed) {
                self.stopped = true;
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

/// Runs iterative deepening with aspiration windows until `limits` or `stop`
/// cuts it off, invoking `on_info` once per depth that finished searching.
pub fn search(
    board: &mut Board,
    tables: &mut SearchTables,
    limits: SearchLimits,
    stop: &AtomicBool,
    mut on_info: impl FnMut(&SearchInfo),
) -> SearchResult {
    tables.tt.new_generation();
    let start = Instant::now();
    let deadline = compute_deadline(&limits, board, start);

    let legal = board.generate_legal_moves();
    if legal.is_empty() {
        return SearchResult { best_move: Move::null(), score: 0, depth: 0, nodes: 0 };
    }

    let mut ctx = SearchContext {
        tt: &mut tables.tt,
        killers: KillerTable::new(),
        history: HistoryTable::new(),
        nodes: 0,
        seldepth: 0,
        stop,
        deadline,
        stopped: false,
    };

    let max_depth = limits.depth.unwrap_or(MAX_SEARCH_DEPTH).min(MAX_SEARCH_DEPTH);
    let mut result = SearchResult { best_move: legal.get(0).unwrap(), score: 0, depth: 0, nodes: 0 };
    let mut score = 0;

    for depth in 1..=max_depth {
        let mut alpha = if depth == 1 { -MATE } else { (score - ASPIRATION_DELTA).max(-MATE) };
        let mut beta = if depth == 1 { MATE } else { (score + ASPIRATION_DELTA).min(MATE) };
        let mut delta = ASPIRATION_DELTA;

        let depth_score = loop {
            let s = alphabeta::negamax(board, &mut ctx, depth as i32, 0, alpha, beta);
            if ctx.stopped {
                break s;
            }
            if s <= alpha {
                alpha = (alpha - delta).max(-MATE);
                delta *= 2;
                continue;
            }
            if s >= beta {
                beta = (beta + delta).min(MATE);
                delta *= 2;
                continue;
            }
            break s;
        };

        if ctx.stopped && depth > 1 {
            break;
        }

        score = depth_score;
        if let Some((_, _, _, mv)) = ctx.tt.probe(board.hash()) {
            result.best_move = mv;
        }
        result.score = score;
        result.depth = depth;
        result.nodes = ctx.nodes;

        let elapsed = start.elapsed();
        let pv = extract_pv(board, ctx.tt, depth);
        let info = SearchInfo {
            depth,
            seldepth: ctx.seldepth.max(depth),
            score,
            nodes: ctx.nodes,
            time_ms: elapsed.as_millis() as u64,
            nps: if elapsed.as_millis() > 0 { (ctx.nodes as u128 * 1000 / elapsed.as_millis()) as u64 } else { ctx.nodes },
            hashfull: ctx.tt.hashfull_permille(),
            pv,
        };
        on_info(&info);

        if ctx.stopped {
            break;
        }
        if let Some(node_limit) = limits.nodes {
            if ctx.nodes >= node_limit {
                break;
            }
        }
        if score.abs() > MATE_THRESHOLD {
            break;
        }
    }

    result
}

/// Follows the transposition table's best-move chain from the current
/// position, for UCI `info ... pv` lines. Stops on a TT miss, a null move,
/// or a repeated hash (which would otherwise loop forever).
fn extract_pv(board: &Board, tt: &TranspositionTable, max_len: u32) -> Vec<Move> {
    let mut pv = Vec::with_capacity(max_len as usize);
    let mut scratch = board.clone();
    let mut seen = Vec::new();

    for _ in 0..max_len {
        let Some((_, _, _, mv)) = tt.probe(scratch.hash()) else { break };
        if mv.is_null() || seen.contains(&scratch.hash()) {
            break;
        }
        let legal = scratch.generate_legal_moves();
        if !legal.contains(mv) {
            break;
        }
        seen.push(scratch.hash());
        scratch.make_move(mv);
        pv.push(mv);
    }
    pv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn finds_mate_in_one() {
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut tables = SearchTables::new(1);
        let stop = AtomicBool::new(false);
        let limits = SearchLimits { depth: Some(3), ..Default::default() };
        let result = search(&mut board, &mut tables, limits, &stop, |_| {});
        assert!(result.score > MATE_THRESHOLD);
        assert_eq!(result.best_move.to(), crate::types::Square::new(7, 0));
    }

    #[test]
    fn picks_a_legal_move_at_depth_one() {
        let mut board = Board::new();
        let mut tables = SearchTables::new(1);
        let stop = AtomicBool::new(false);
        let limits = SearchLimits { depth: Some(1), ..Default::default() };
        let result = search(&mut board, &mut tables, limits, &stop, |_| {});
        assert!(board.generate_legal_moves().contains(result.best_move));
    }
}
