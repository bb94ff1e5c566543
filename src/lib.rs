//! Assert that an operation fails, and that it fails the right way.
//!
//! [`catch_and_match`] runs an operation that is expected to fail, captures
//! the failure, and checks it against a [`Matcher`]. An operation fails when
//! it returns `Err` or panics; with [`catch_and_match_async`] it may also fail
//! by resolving its future to `Err` or panicking while being polled.
//!
//! The outcome is reported through the returned `Result` and, when one is
//! given, a completion callback invoked exactly once with the same outcome.
//!
//! # Example
//!
//! ```rust
//! use catch_and_match::{catch_and_match, ErrorType, Matcher};
//! use std::num::ParseIntError;
//!
//! catch_and_match(|| "x".parse::<u32>(), "invalid digit").unwrap();
//! catch_and_match(|| "x".parse::<u32>(), Matcher::regex("^invalid")).unwrap();
//! catch_and_match(|| "x".parse::<u32>(), ErrorType::of::<ParseIntError>()).unwrap();
//!
//! let err = catch_and_match(|| "7".parse::<u32>(), "invalid").unwrap_err();
//! assert_eq!(err.to_string(), "no error thrown");
//! ```

use std::fmt::{self, Write as _};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt as _;

mod error;
mod failure;
mod matcher;

pub use error::{Error, Result};
pub use failure::Failure;
pub use matcher::{ErrorType, IntoMatcher, Matcher, Pattern, Predicate};

type Callback<'a> = Box<dyn FnOnce(Option<&Error>) + Send + 'a>;

/// How the value an operation returns is classified.
///
/// `Result<T, E>` fails with `E` when it is `Err`. Plain values such as `()`,
/// numbers, strings, `Vec<T>` and `Option<T>` never fail; an operation
/// returning one of them can only fail by panicking.
pub trait Attempt {
    /// Returns the captured failure, or `None` if the operation succeeded.
    fn into_failure(self) -> Option<Failure>;
}

macro_rules! returned_normally {
    ($($t:ty),* $(,)?) => {
        $(
            impl Attempt for $t {
                fn into_failure(self) -> Option<Failure> {
                    None
                }
            }
        )*
    };
}

returned_normally! {
    (), bool, char, String,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64,
}

impl Attempt for &str {
    fn into_failure(self) -> Option<Failure> {
        None
    }
}

impl<T> Attempt for Vec<T> {
    fn into_failure(self) -> Option<Failure> {
        None
    }
}

impl<T> Attempt for Option<T> {
    fn into_failure(self) -> Option<Failure> {
        None
    }
}

impl<T, E> Attempt for std::result::Result<T, E>
where
    E: fmt::Display + Send + 'static,
{
    fn into_failure(self) -> Option<Failure> {
        self.err().map(Failure::from_error)
    }
}

/// Builder for a single catch-and-match assertion.
///
/// The free functions in this crate are shorthands for this builder.
///
/// ```rust
/// use catch_and_match::CatchAndMatch;
///
/// let mut seen = None;
/// let result = CatchAndMatch::new("overflow")
///     .on_complete(|err| seen = err.map(ToString::to_string))
///     .run(|| u8::try_from(300u32));
/// assert!(result.is_err());
/// assert!(seen.unwrap().starts_with("error does not satisfy matcher"));
/// ```
#[must_use]
pub struct CatchAndMatch<'a> {
    matcher: Result<Matcher>,
    on_complete: Option<Callback<'a>>,
}

impl<'a> CatchAndMatch<'a> {
    /// Starts an assertion that expects a failure accepted by `matcher`.
    pub fn new(matcher: impl IntoMatcher) -> CatchAndMatch<'a> {
        CatchAndMatch {
            matcher: matcher.into_matcher(),
            on_complete: None,
        }
    }

    /// Sets a callback that receives the outcome: `None` when the operation
    /// failed as expected, otherwise the error that is also returned.
    ///
    /// The callback is not invoked for usage errors.
    pub fn on_complete<C>(mut self, on_complete: C) -> CatchAndMatch<'a>
    where
        C: FnOnce(Option<&Error>) + Send + 'a,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Runs `operation` once and checks its failure against the matcher.
    pub fn run<F, R>(self, operation: F) -> Result<()>
    where
        F: FnOnce() -> R,
        R: Attempt,
    {
        let (matcher, on_complete) = self.validate()?;
        tracing::trace!(%matcher, "invoking operation");
        let failure = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(value) => value.into_failure(),
            Err(payload) => Some(Failure::from_panic(payload)),
        };
        settle(classify(&matcher, failure), on_complete)
    }

    /// Runs `operation` once, awaits the future it returns, and checks the
    /// failure against the matcher.
    ///
    /// A panic while creating the future and a panic while polling it are
    /// both captured as failures.
    pub async fn run_async<F, Fut, R>(self, operation: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
        R: Attempt,
    {
        let (matcher, on_complete) = self.validate()?;
        tracing::trace!(%matcher, "invoking async operation");
        let failure = match panic::catch_unwind(AssertUnwindSafe(operation)) {
            Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(value) => value.into_failure(),
                Err(payload) => Some(Failure::from_panic(payload)),
            },
            Err(payload) => Some(Failure::from_panic(payload)),
        };
        settle(classify(&matcher, failure), on_complete)
    }

    fn validate(self) -> Result<(Matcher, Option<Callback<'a>>)> {
        match self.matcher {
            Ok(matcher) => Ok((matcher, self.on_complete)),
            Err(err) => {
                tracing::debug!(error = %err, "rejecting malformed assertion");
                Err(err)
            }
        }
    }
}

fn classify(matcher: &Matcher, failure: Option<Failure>) -> Result<()> {
    let Some(failure) = failure else {
        tracing::debug!(%matcher, "operation did not fail");
        return Err(Error::NoErrorThrown);
    };
    let satisfied = matcher.matches(&failure);
    tracing::debug!(
        %matcher,
        error = failure.message(),
        panicked = failure.is_panic(),
        satisfied,
        "classified failure"
    );
    if satisfied {
        Ok(())
    } else {
        Err(Error::Mismatch {
            matcher: matcher.to_string(),
            message: failure.message().to_owned(),
        })
    }
}

/// Hands `outcome` to the callback, if any, and returns it.
fn settle(outcome: Result<()>, on_complete: Option<Callback<'_>>) -> Result<()> {
    if let Some(on_complete) = on_complete {
        on_complete(outcome.as_ref().err());
    }
    outcome
}

/// Runs `operation`, expecting it to fail in a way `matcher` accepts.
///
/// Returns `Ok(())` if it did, [`Error::NoErrorThrown`] if it did not fail,
/// and [`Error::Mismatch`] if it failed some other way.
pub fn catch_and_match<F, R>(operation: F, matcher: impl IntoMatcher) -> Result<()>
where
    F: FnOnce() -> R,
    R: Attempt,
{
    CatchAndMatch::new(matcher).run(operation)
}

/// Like [`catch_and_match`], additionally reporting the outcome to
/// `on_complete`.
pub fn catch_and_match_with<'a, F, R, C>(
    operation: F,
    matcher: impl IntoMatcher,
    on_complete: C,
) -> Result<()>
where
    F: FnOnce() -> R,
    R: Attempt,
    C: FnOnce(Option<&Error>) + Send + 'a,
{
    CatchAndMatch::new(matcher)
        .on_complete(on_complete)
        .run(operation)
}

/// Runs an asynchronous `operation`, expecting its future to fail in a way
/// `matcher` accepts.
pub fn catch_and_match_async<F, Fut, R>(
    operation: F,
    matcher: impl IntoMatcher,
) -> impl Future<Output = Result<()>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
    R: Attempt,
{
    CatchAndMatch::<'static>::new(matcher).run_async(operation)
}

/// Like [`catch_and_match_async`], additionally reporting the outcome to
/// `on_complete`.
pub fn catch_and_match_async_with<'a, F, Fut, R, C>(
    operation: F,
    matcher: impl IntoMatcher,
    on_complete: C,
) -> impl Future<Output = Result<()>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = R>,
    R: Attempt,
    C: FnOnce(Option<&Error>) + Send + 'a,
{
    CatchAndMatch::new(matcher)
        .on_complete(on_complete)
        .run_async(operation)
}

/// Panics unless `operation` fails in a way `matcher` accepts.
///
/// For use directly inside `#[test]` functions.
#[track_caller]
pub fn assert_catch_and_match<F, R>(operation: F, matcher: impl IntoMatcher)
where
    F: FnOnce() -> R,
    R: Attempt,
{
    if let Err(err) = catch_and_match(operation, matcher) {
        let err = anyhow::Error::from(err);
        let mut report = format!("catch-and-match assertion failed\nerror: {}", err);
        for cause in err.chain().skip(1) {
            let _ = writeln!(report, "\nCaused by:");
            let _ = write!(report, "  {}", cause);
        }
        panic!("\n{}", report);
    }
}
