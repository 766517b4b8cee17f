//! Crate-level error types for parsing and protocol boundaries.
//!
//! Internal invariant violations use `debug_assert!` instead; these types are
//! reserved for data crossing a trust boundary (FEN strings, UCI input).

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SquareError {
    InvalidNotation { notation: String },
    RankOutOfBounds { rank: usize },
    FileOutOfBounds { file: usize },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation: '{notation}'")
            }
            SquareError::RankOutOfBounds { rank } => write!(f, "rank out of bounds: {rank}"),
            SquareError::FileOutOfBounds { file } => write!(f, "file out of bounds: {file}"),
        }
    }
}

impl std::error::Error for SquareError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FenError {
    TooFewParts { found: usize },
    InvalidPiece { ch: char },
    TooManyFiles { rank: usize },
    TooFewFiles { rank: usize },
    WrongRankCount { found: usize },
    InvalidSideToMove { token: String },
    InvalidCastling { token: String },
    InvalidEnPassant { token: String },
    InvalidHalfmoveClock { token: String },
    InvalidFullmoveNumber { token: String },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewParts { found } => {
                write!(f, "FEN has too few space-separated fields: found {found}, need at least 4")
            }
            FenError::InvalidPiece { ch } => write!(f, "invalid piece character in FEN: '{ch}'"),
            FenError::TooManyFiles { rank } => write!(f, "rank {rank} describes more than 8 files"),
            FenError::TooFewFiles { rank } => write!(f, "rank {rank} describes fewer than 8 files"),
            FenError::WrongRankCount { found } => {
                write!(f, "FEN board has {found} ranks, expected 8")
            }
            FenError::InvalidSideToMove { token } => {
                write!(f, "invalid side-to-move field: '{token}'")
            }
            FenError::InvalidCastling { token } => write!(f, "invalid castling field: '{token}'"),
            FenError::InvalidEnPassant { token } => write!(f, "invalid en-passant field: '{token}'"),
            FenError::InvalidHalfmoveClock { token } => {
                write!(f, "invalid halfmove clock field: '{token}'")
            }
            FenError::InvalidFullmoveNumber { token } => {
                write!(f, "invalid fullmove number field: '{token}'")
            }
        }
    }
}

impl std::error::Error for FenError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveParseError {
    WrongLength { notation: String },
    BadSquare(SquareError),
    UnknownPromotionPiece { ch: char },
    IllegalInPosition { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::WrongLength { notation } => {
                write!(f, "move '{notation}' has an invalid length (expected 4 or 5 characters)")
            }
            MoveParseError::BadSquare(e) => write!(f, "{e}"),
            MoveParseError::UnknownPromotionPiece { ch } => {
                write!(f, "unknown promotion piece character: '{ch}'")
            }
            MoveParseError::IllegalInPosition { notation } => {
                write!(f, "move '{notation}' is not legal in the current position")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

impl From<SquareError> for MoveParseError {
    fn from(e: SquareError) -> Self {
        MoveParseError::BadSquare(e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UciError {
    MissingParts { command: String },
    InvalidFen(FenError),
    InvalidMove(MoveParseError),
    UnknownCommand { command: String },
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::MissingParts { command } => {
                write!(f, "command '{command}' is missing required arguments")
            }
            UciError::InvalidFen(e) => write!(f, "invalid FEN in position command: {e}"),
            UciError::InvalidMove(e) => write!(f, "invalid move in position command: {e}"),
            UciError::UnknownCommand { command } => write!(f, "unrecognized UCI command: '{command}'"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::InvalidFen(e)
    }
}

impl From<MoveParseError> for UciError {
    fn from(e: MoveParseError) -> Self {
        UciError::InvalidMove(e)
    }
}
