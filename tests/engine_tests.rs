use std::sync::mpsc;
use std::time::Duration;

use chess_engine::board::Board;
use chess_engine::engine::EngineController;
use chess_engine::search::SearchLimits;

#[test]
fn engine_depth_search_returns_move() {
    let mut engine = EngineController::new();
    let (tx, rx) = mpsc::channel();

    let limits = SearchLimits { depth: Some(1), ..Default::default() };
    engine.go(limits, |_| {}, move |best_move| {
        let _ = tx.send(best_move);
    });

    let best_move = rx.recv_timeout(Duration::from_secs(5)).expect("search never returned a move");
    assert!(!best_move.is_null(), "should find a move at depth 1 from the starting position");
}

#[test]
fn engine_stop_cuts_an_infinite_search_short() {
    let mut engine = EngineController::new();
    let (tx, rx) = mpsc::channel();

    let limits = SearchLimits { infinite: true, ..Default::default() };
    engine.go(limits, |_| {}, move |best_move| {
        let _ = tx.send(best_move);
    });

    std::thread::sleep(Duration::from_millis(50));
    engine.request_stop();

    let best_move = rx.recv_timeout(Duration::from_secs(5)).expect("stop did not end the search");
    assert!(!best_move.is_null());
}

#[test]
fn set_position_is_reflected_on_the_board() {
    let mut engine = EngineController::new();
    let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
    engine.set_position(Board::from_fen(fen).unwrap());
    assert_eq!(engine.board().to_fen(), fen);
}
