use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Store(crate::store::Error),
    Analyzer(crate::analyzer::Error),
    Parse(std::num::ParseIntError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Error::Io(ref e) => Display::fmt(&e, f),
            Error::Store(ref e) => Display::fmt(&e, f),
            Error::Analyzer(ref e) => Display::fmt(&e, f),
            Error::Parse(ref e) => Display::fmt(&e, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Store(ref e) => Some(e),
            Error::Analyzer(ref e) => Some(e),
            Error::Parse(ref e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<crate::store::Error> for Error {
    fn from(e: crate::store::Error) -> Self {
        Error::Store(e)
    }
}

impl From<crate::analyzer::Error> for Error {
    fn from(e: crate::analyzer::Error) -> Self {
        Error::Analyzer(e)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(e: std::num::ParseIntError) -> Self {
        Error::Parse(e)
    }
}
