use std::io::{self, BufRead, Write};

use chess_engine::engine::EngineController;
use chess_engine::uci::{parse_go_command, parse_position_command};

const ENGINE_NAME: &str = "chess_engine";
const ENGINE_AUTHOR: &str = "chess_engine contributors";

fn main() {
    env_logger::init();
    let stdin = io::stdin();
    let mut engine = EngineController::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to read stdin: {err}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();

        match command {
            "uci" => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                println!("option name Hash type spin default 16 min 1 max 4096");
                println!("option name Threads type spin default 1 min 1 max 1");
                println!("uciok");
                flush_stdout();
            }
            "isready" => {
                println!("readyok");
                flush_stdout();
            }
            "ucinewgame" => engine.new_game(),
            "setoption" => handle_setoption(&mut engine, args),
            "position" => match parse_position_command(args) {
                Ok(cmd) => {
                    if let Some(mv) = &cmd.rejected_move {
                        println!("info string illegal move {mv} in position command, stopped there");
                        flush_stdout();
                    }
                    engine.set_position(cmd.board);
                }
                Err(err) => log::warn!("rejecting position command: {err}"),
            },
            "go" => {
                let limits = parse_go_command(args);
                engine.go(
                    limits,
                    |info| {
                        print_info(info);
                        flush_stdout();
                    },
                    |best_move| {
                        println!("bestmove {best_move}");
                        flush_stdout();
                    },
                );
            }
            "stop" => engine.request_stop(),
            "quit" => {
                engine.stop_and_wait();
                break;
            }
            other => log::warn!("unrecognized UCI command: '{other}'"),
        }
    }
}

fn handle_setoption(engine: &mut EngineController, args: &str) {
    let Some(name_pos) = args.find("name") else {
        log::warn!("setoption command missing 'name': '{args}'");
        return;
    };
    let rest = &args[name_pos + "name".len()..];
    let (name, value) = match rest.find("value") {
        Some(value_pos) => (rest[..value_pos].trim(), rest[value_pos + "value".len()..].trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "Hash" => match value.parse::<usize>() {
            Ok(mb) => engine.set_hash_size_mb(mb),
            Err(_) => log::warn!("invalid Hash value: '{value}'"),
        },
        "Threads" => {
            // Single-threaded search only; accepted for UCI compatibility
            // and otherwise ignored.
        }
        other => log::warn!("unrecognized option: '{other}'"),
    }
}

fn print_info(info: &chess_engine::search::SearchInfo) {
    let mut line = format!(
        "info depth {} seldepth {} score {} nodes {} nps {} time {} hashfull {}",
        info.depth,
        info.seldepth,
        format_score(info.score),
        info.nodes,
        info.nps,
        info.time_ms,
        info.hashfull,
    );
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for mv in &info.pv {
            line.push(' ');
            line.push_str(&mv.to_string());
        }
    }
    println!("{line}");
}

fn format_score(score: i32) -> String {
    const MATE_THRESHOLD: i32 = chess_engine::search::MATE - 128;
    if score > MATE_THRESHOLD {
        format!("mate {}", (chess_engine::search::MATE - score + 1) / 2)
    } else if score < -MATE_THRESHOLD {
        format!("mate {}", -(chess_engine::search::MATE + score + 1) / 2)
    } else {
        format!("cp {score}")
    }
}

fn flush_stdout() {
    let _ = io::stdout().flush();
}
