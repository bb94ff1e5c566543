//! Error types.

/// Why a [`catch_and_match`](crate::catch_and_match) call did not succeed.
///
/// There are two kinds of errors. Usage errors mean the assertion itself was
/// set up wrong, and are reported before the operation under test runs.
/// Assertion errors mean the operation did not fail the way the test
/// expected.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A pattern matcher was given a regular expression that does not compile.
    #[error("invalid pattern matcher `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The operation completed without returning an error or panicking.
    #[error("no error thrown")]
    NoErrorThrown,

    /// The operation failed, but the failure was rejected by the matcher.
    #[error("error does not satisfy matcher {matcher} (error message: `{message}`)")]
    Mismatch { matcher: String, message: String },
}

impl Error {
    /// Whether this error comes from misuse of the assertion rather than from
    /// the operation under test.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::InvalidPattern { .. })
    }

    /// Whether this error reports a failed expectation about the operation
    /// under test.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::NoErrorThrown | Error::Mismatch { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
