use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    EmptyRaster,
    InvalidConfig(&'static str),
    OutOfBounds { x: isize, y: isize },
    Unreachable { x: usize, y: usize },
    Pending { x: usize, y: usize },
    NoSession,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::EmptyRaster => write!(f, "raster has a zero dimension"),
            Self::InvalidConfig(what) => write!(f, "invalid config: {what}"),
            Self::OutOfBounds { x, y } => write!(f, "point ({x}, {y}) is out of bounds"),
            Self::Unreachable { x, y } => {
                write!(f, "pixel ({x}, {y}) is not reachable from the seed")
            }
            Self::Pending { x, y } => {
                write!(f, "pixel ({x}, {y}) has not been finalized yet")
            }
            Self::NoSession => write!(f, "no active tracing session"),
        }
    }
}

impl std::error::Error for Error {}
