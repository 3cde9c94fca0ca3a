use std::fmt;

// Domain-level errors for world registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    AlreadyJoined,
    NoBaseAvailable,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::AlreadyJoined => write!(f, "player already joined"),
            JoinError::NoBaseAvailable => write!(f, "no base available"),
        }
    }
}

impl std::error::Error for JoinError {}
