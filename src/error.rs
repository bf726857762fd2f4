use std::fmt;

/// Failures in the glue around the simulation (config, storage, services).
///
/// The simulation itself never fails; these only surface as log lines or
/// status text.
#[derive(Debug)]
pub enum Error {
    /// JSON could not be parsed
    Parse(serde_json::Error),
    /// Tuning values the simulation cannot run with
    InvalidTuning(&'static str),
    /// Reading a file failed (native only)
    Io(std::io::Error),
    /// LocalStorage unavailable or write rejected
    Storage(String),
    /// An external service answered with an error
    Service(String),
    /// A wallet-only operation was requested without a session
    NotAuthenticated,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::InvalidTuning(reason) => write!(f, "invalid tuning: {reason}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Storage(reason) => write!(f, "storage error: {reason}"),
            Self::Service(reason) => write!(f, "service error: {reason}"),
            Self::NotAuthenticated => write!(f, "User not authenticated"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
