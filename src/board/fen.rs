//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use std::fmt::Write as _;

use crate::board::state::Board;
use crate::error::FenError;
use crate::types::{Bitboard, CastlingRights, Color, Piece, Square, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K, CASTLE_WHITE_Q};

pub(crate) const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parses a FEN string into a board position.
    ///
    /// # Errors
    /// Returns [`FenError`] if the string is malformed.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut board = Board::empty();
        parse_placement(&mut board, parts[0])?;
        board.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidSideToMove { token: other.to_string() }),
        };
        board.castling_rights = parse_castling(parts[2])?;
        board.en_passant = parse_en_passant(parts[3])?;
        board.halfmove_clock = parts
            .get(4)
            .map(|s| s.parse().map_err(|_| FenError::InvalidHalfmoveClock { token: (*s).to_string() }))
            .transpose()?
            .unwrap_or(0);
        board.fullmove_number = parts
            .get(5)
            .map(|s| s.parse().map_err(|_| FenError::InvalidFullmoveNumber { token: (*s).to_string() }))
            .transpose()?
            .unwrap_or(1);

        board.recalculate_incremental_state();
        board.record_repetition();
        Ok(board)
    }

    /// Serializes the current position back to FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        write_placement(self, &mut out);
        out.push(' ');
        out.push(if self.side_to_move == Color::White { 'w' } else { 'b' });
        out.push(' ');
        write_castling(self.castling_rights, &mut out);
        out.push(' ');
        match self.en_passant {
            Some(sq) => {
                let _ = write!(out, "{sq}");
            }
            None => out.push('-'),
        }
        let _ = write!(out, " {} {}", self.halfmove_clock, self.fullmove_number);
        out
    }
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::WrongRankCount { found: ranks.len() });
    }
    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_from_top;
        let mut file = 0usize;
        for ch in rank_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                file += skip as usize;
                if file > 8 {
                    return Err(FenError::TooManyFiles { rank });
                }
                continue;
            }
            if file >= 8 {
                return Err(FenError::TooManyFiles { rank });
            }
            let piece = Piece::from_char(ch).ok_or(FenError::InvalidPiece { ch })?;
            let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
            let sq = Square::new(rank, file);
            board.pieces[color.index()][piece.index()] |= Bitboard::from_square(sq);
            board.occupied[color.index()] |= Bitboard::from_square(sq);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::TooFewFiles { rank });
        }
    }
    board.all_occupied = board.occupied[Color::White.index()] | board.occupied[Color::Black.index()];
    Ok(())
}

fn parse_castling(token: &str) -> Result<u8, FenError> {
    if token == "-" {
        return Ok(0);
    }
    let mut rights = 0u8;
    for ch in token.chars() {
        rights |= match ch {
            'K' => CASTLE_WHITE_K,
            'Q' => CASTLE_WHITE_Q,
            'k' => CASTLE_BLACK_K,
            'q' => CASTLE_BLACK_Q,
            _ => return Err(FenError::InvalidCastling { token: token.to_string() }),
        };
    }
    Ok(rights)
}

fn parse_en_passant(token: &str) -> Result<Option<Square>, FenError> {
    if token == "-" {
        return Ok(None);
    }
    token.parse::<Square>().map(Some).map_err(|_| FenError::InvalidEnPassant { token: token.to_string() })
}

fn write_placement(board: &Board, out: &mut String) {
    for rank_from_top in 0..8 {
        let rank = 7 - rank_from_top;
        let mut empty_run = 0;
        for file in 0..8 {
            let sq = Square::new(rank, file);
            match board.piece_at(sq) {
                Some((piece, color)) => {
                    if empty_run > 0 {
                        let _ = write!(out, "{empty_run}");
                        empty_run = 0;
                    }
                    let ch = piece.to_char();
                    out.push(if color.is_white() { ch.to_ascii_uppercase() } else { ch });
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            let _ = write!(out, "{empty_run}");
        }
        if rank_from_top != 7 {
            out.push('/');
        }
    }
}

fn write_castling(rights: u8, out: &mut String) {
    if rights == 0 {
        out.push('-');
        return;
    }
    if rights & CASTLE_WHITE_K != 0 {
        out.push('K');
    }
    if rights & CASTLE_WHITE_Q != 0 {
        out.push('Q');
    }
    if rights & CASTLE_BLACK_K != 0 {
        out.push('k');
    }
    if rights & CASTLE_BLACK_Q != 0 {
        out.push('q');
    }
}

#[allow(dead_code)]
pub(crate) fn all_castling_rights() -> CastlingRights {
    CastlingRights::all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_round_trips() {
        let board = Board::from_fen(STARTPOS_FEN).unwrap();
        assert_eq!(board.to_fen(), STARTPOS_FEN);
    }

    #[test]
    fn kiwipete_round_trips() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        assert!(board.castling_rights().has(Color::White, 'K'));
        assert!(board.castling_rights().has(Color::Black, 'q'));
    }

    #[test]
    fn rejects_too_few_fields() {
        assert_eq!(Board::from_fen("8/8/8/8/8/8/8/8"), Err(FenError::TooFewParts { found: 1 }));
    }

    #[test]
    fn rejects_bad_piece_char() {
        let err = Board::from_fen("8/8/8/8/8/8/8/7x w - - 0 1").unwrap_err();
        assert_eq!(err, FenError::InvalidPiece { ch: 'x' });
    }
}
