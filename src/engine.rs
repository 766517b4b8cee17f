//! Engine controller: owns the position and transposition table across UCI
//! commands, and runs each search on a dedicated worker thread so the UCI
//! reader stays responsive to `stop` while a search is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::board::{Board, Move};
use crate::search::{self, SearchInfo, SearchLimits, SearchTables};

/// Deep negamax recursion plus quiescence can run the default 8 MiB thread
/// stack out; give the search worker more headroom.
const SEARCH_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Margin subtracted from the computed hard deadline so the watchdog fires
/// just ahead of a real time-forfeit, not exactly at it.
const HARD_STOP_MARGIN_MS: u64 = 5;

struct SearchJob {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    timer_handle: Option<JoinHandle<()>>,
}

impl SearchJob {
    fn signal_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn stop_and_wait(self) {
        self.signal_stop();
        let _ = self.handle.join();
        if let Some(timer) = self.timer_handle {
            let _ = timer.join();
        }
    }
}

/// Owns the live position and long-lived search tables; dispatches `go` to
/// a worker thread and `stop`/`setoption`/`position` against it safely.
pub struct EngineController {
    board: Board,
    tables: Arc<Mutex<SearchTables>>,
    job: Option<SearchJob>,
}

impl EngineController {
    #[must_use]
    pub fn new() -> Self {
        EngineController { board: Board::new(), tables: Arc::new(Mutex::new(SearchTables::default())), job: None }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_position(&mut self, board: Board) {
        self.stop_and_wait();
        self.board = board;
    }

    pub fn new_game(&mut self) {
        self.stop_and_wait();
        self.tables.lock().clear();
        self.board = Board::new();
    }

    pub fn set_hash_size_mb(&mut self, mb: usize) {
        self.stop_and_wait();
        self.tables.lock().resize(mb);
    }

    /// Requests the in-flight search stop as soon as it next checks, without
    /// blocking for it to actually finish (use `stop_and_wait` for that).
    pub fn request_stop(&self) {
        if let Some(job) = &self.job {
            job.signal_stop();
        }
    }

    pub fn stop_and_wait(&mut self) {
        if let Some(job) = self.job.take() {
            job.stop_and_wait();
        }
    }

    /// Starts a search on a worker thread. `on_info` is called once per
    /// completed depth, `on_bestmove` once when the search concludes.
    pub fn go<F, G>(&mut self, limits: SearchLimits, on_info: F, on_bestmove: G)
    where
        F: Fn(&SearchInfo) + Send + 'static,
        G: FnOnce(Move) + Send + 'static,
    {
        self.stop_and_wait();

        let stop = Arc::new(AtomicBool::new(false));
        let mut board = self.board.clone();
        let tables = Arc::clone(&self.tables);
        let worker_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("search-worker".into())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || {
                let fallback_move = board.generate_legal_moves().get(0).unwrap_or(Move::null());
                let mut guard = tables.lock();
                // Defense-in-depth: an internal search bug should never take
                // the whole engine process down mid-game.
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    search::search(&mut board, &mut guard, limits, &worker_stop, &on_info)
                }));
                drop(guard);
                let best_move = match outcome {
                    Ok(result) => result.best_move,
                    Err(_) => {
                        log::error!("search worker panicked; falling back to the first legal move");
                        fallback_move
                    }
                };
                on_bestmove(best_move);
            })
            .expect("failed to spawn search worker thread");

        let timer_handle = search::hard_deadline_millis(&limits, &self.board).map(|deadline_ms| {
            let timer_stop = Arc::clone(&stop);
            let wait = Duration::from_millis(deadline_ms.saturating_sub(HARD_STOP_MARGIN_MS.min(deadline_ms)));
            std::thread::spawn(move || {
                let deadline = Instant::now() + wait;
                while Instant::now() < deadline {
                    if timer_stop.load(Ordering::Relaxed) {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(5).min(deadline.saturating_duration_since(Instant::now())));
                }
                timer_stop.store(true, Ordering::Relaxed);
            })
        });

        self.job = Some(SearchJob { stop, handle, timer_handle });
    }
}

impl Default for EngineController {
    fn default() -> Self {
        EngineController::new()
    }
}
