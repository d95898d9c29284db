use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Unreadable stop word list; `line` is 1-based.
    StopWordFile { line: usize, cause: std::io::Error },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Error::StopWordFile { line, ref cause } => {
                write!(f, "stop word list unreadable at line {}: {}", line, cause)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::StopWordFile { ref cause, .. } => Some(cause),
        }
    }
}
