use thiserror::Error;

/// The result type for the `hackdoc` crate.
pub type Result<T> = std::result::Result<T, HackdocError>;

/// The error type for the `hackdoc` crate.
///
/// The scan path itself has exactly one failure mode and reports it by
/// returning false; typed errors arise only on the state-restore and
/// symbol-conversion surfaces.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HackdocError {
    /// A serialized state buffer too short to hold the three flag bytes.
    /// Only lengths of zero (reset) or at least three are valid.
    #[error("state buffer of length {0} is too short for the flag header")]
    MalformedState(usize),

    /// A token symbol index outside the range fixed by the host grammar.
    #[error("token index {0} is out of range for the heredoc token set")]
    InvalidTokenIndex(usize),
}
