//! Search tests to verify the engine finds correct moves in various positions.

use std::sync::atomic::AtomicBool;

use chess_engine::board::Board;
use chess_engine::search::{search, SearchLimits, SearchTables};

fn best_move_at_depth(fen: &str, depth: u32) -> String {
    let mut board = Board::from_fen(fen).unwrap();
    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(depth), ..Default::default() };
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});
    result.best_move.to_string()
}

#[test]
fn finds_mate_in_one_back_rank() {
    // White to move, Qe8# is mate.
    let uci = best_move_at_depth("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1", 4);
    assert_eq!(uci, "e1e8", "should find Qe8# (back rank mate)");
}

#[test]
fn finds_mate_in_one_queen() {
    let uci = best_move_at_depth("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 4", 4);
    assert_eq!(uci, "h5f7", "should find Qxf7# (scholar's mate)");
}

#[test]
fn avoids_hanging_queen() {
    let uci = best_move_at_depth("r1bqkbnr/pppppppp/2n5/8/4P3/5Q2/PPPP1PPP/RNB1KBNR w KQkq - 0 3", 4);
    assert_ne!(uci, "f3c6", "should not hang the queen on c6");
}

#[test]
fn captures_free_piece() {
    let mut board =
        Board::from_fen("rnbqk1nr/pppp1ppp/2b5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 4").unwrap();
    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(4), ..Default::default() };
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});
    assert!(
        result.best_move.is_capture() || result.best_move.to_string() == "c4f7",
        "should capture material or threaten the king"
    );
}

#[test]
fn iterative_deepening_consistency() {
    let mut board = Board::new();
    let stop = AtomicBool::new(false);

    let mut tables2 = SearchTables::new(16);
    let limits2 = SearchLimits { depth: Some(2), ..Default::default() };
    let best2 = search(&mut board, &mut tables2, limits2, &stop, |_| {}).best_move;

    let mut tables4 = SearchTables::new(16);
    let limits4 = SearchLimits { depth: Some(4), ..Default::default() };
    let best4 = search(&mut board, &mut tables4, limits4, &stop, |_| {}).best_move;

    let legal = board.generate_legal_moves();
    assert!(legal.contains(best2), "depth 2 move should be legal");
    assert!(legal.contains(best4), "depth 4 move should be legal");
}

#[test]
fn single_legal_move() {
    let uci = best_move_at_depth("8/8/8/8/8/8/8/K6rk w - - 0 1", 4);
    assert_eq!(uci, "a1a2", "only legal move should be Ka2");
}

#[test]
fn no_move_in_checkmate() {
    let mut board =
        Board::from_fen("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1").unwrap();
    assert!(board.is_checkmate(), "position should be checkmate");

    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(4), ..Default::default() };
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});
    assert!(result.best_move.is_null(), "should return a null move for checkmate position");
}

#[test]
fn handles_draw_by_repetition() {
    use chess_engine::uci::parse_position_command;

    let cmd = parse_position_command(
        "startpos moves g1f3 g8f6 f3g1 f6g8 g1f3 g8f6 f3g1 f6g8",
    )
    .unwrap();
    assert!(cmd.board.is_draw(), "should be a draw by repetition");
}

#[test]
fn evaluation_symmetry() {
    let board = Board::new();
    let eval = board.evaluate();
    assert!(eval.abs() < 50, "starting position should be roughly equal (eval: {eval})");
}

#[test]
fn evaluation_material_advantage() {
    let board_white_up = Board::from_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    let eval_white_up = board_white_up.evaluate();

    let board_black_up = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1").unwrap();
    let eval_black_up = board_black_up.evaluate();

    assert!(eval_white_up > 800, "white up a queen should be very positive (eval: {eval_white_up})");
    assert!(eval_black_up < -800, "black up a queen should be very negative (eval: {eval_black_up})");
}

#[test]
fn search_completes_at_depth_6() {
    use std::time::Instant;

    let mut board = Board::new();
    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(6), ..Default::default() };

    let start = Instant::now();
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});
    let elapsed = start.elapsed();

    assert!(!result.best_move.is_null(), "should find a move at depth 6");
    assert!(elapsed.as_secs() < 60, "search at depth 6 took too long: {elapsed:?}");
}

#[test]
fn identifies_stalemate() {
    let board = Board::from_fen("k7/8/1QK5/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(board.is_stalemate(), "position should be stalemate");
    assert!(!board.is_checkmate(), "position should not be checkmate");
}

#[test]
fn fifty_move_rule() {
    let board = Board::from_fen("8/8/8/8/8/8/8/K1k5 w - - 100 1").unwrap();
    assert!(board.is_draw(), "position with 100 halfmove clock should be a draw");
}

#[test]
fn black_promoting_pawn_is_winning_for_black() {
    // King and pawn ending where Black's h-pawn is a move from promoting;
    // White's king must rush to d6/e6 to have any chance of stopping it.
    let mut board = Board::from_fen("8/3K4/1k6/8/8/8/7p/8 w - - 0 1").unwrap();
    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(10), ..Default::default() };
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});

    let uci = result.best_move.to_string();
    assert!(uci == "d7d6" || uci == "d7e6", "expected Kd6 or Ke6, got {uci}");
    assert!(result.score < -500, "Black's promoting pawn should score large negative for White (score: {})", result.score);
}

#[test]
fn finds_mate_in_one_rook_and_bishop() {
    let uci = best_move_at_depth("8/4k2p/8/8/8/8/P7/2KR3b w - - 2 2", 4);
    assert_eq!(uci, "d1h1", "should find Rxh1#");
}

#[test]
fn finds_winning_promotion_to_queen() {
    let mut board = Board::from_fen("5B2/1P2P2P/2P1r3/2b1p3/6p1/2K2P1k/p7/nN5B w - - 0 1").unwrap();
    let mut tables = SearchTables::new(16);
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { depth: Some(6), ..Default::default() };
    let result = search(&mut board, &mut tables, limits, &stop, |_| {});

    assert_eq!(result.best_move.to_string(), "h7h8q", "should promote the h-pawn to a queen");
    assert!(result.score >= 1500, "promoting to a new queen should be decisively winning (score: {})", result.score);
}
