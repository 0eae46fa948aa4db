use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The controller task has exited.
    ControllerStopped,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::ControllerStopped => write!(f, "controller stopped"),
        }
    }
}

impl std::error::Error for SessionError {}
