use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Posting record of the wrong size, or a file that is not a whole
    /// number of records.
    Corrupt,
    /// Vocabulary file with an unknown magic number or version.
    Incompatible,
    /// `add` on a sealed index, reads on an unsealed one, or any use
    /// of a builder whose last spill failed.
    InvalidState,
    OutOfRange,
    /// The u32 term id space is exhausted.
    VocabularyFull,
    Fst(fst::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Error::Io(ref e) => Display::fmt(&e, f),
            Error::Corrupt => write!(f, "malformed posting record"),
            Error::Incompatible => write!(f, "incompatible vocabulary file"),
            Error::InvalidState => write!(f, "operation not valid in this index state"),
            Error::OutOfRange => write!(f, "posting index out of range"),
            Error::VocabularyFull => write!(f, "term id space exhausted"),
            Error::Fst(ref e) => Display::fmt(&e, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Fst(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<fst::Error> for Error {
    fn from(e: fst::Error) -> Self {
        Error::Fst(e)
    }
}
