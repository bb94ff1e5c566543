//! What counts as the expected failure.
//!
//! A [`Matcher`] is one of four kinds:
//!
//! - [`Matcher::Text`] is satisfied when the failure message *contains* the
//!   text. Plain text is never interpreted as a regular expression.
//! - [`Matcher::Pattern`] is satisfied when a regular expression finds a
//!   match anywhere in the failure message.
//! - [`Matcher::Predicate`] hands the whole [`Failure`] to a closure.
//! - [`Matcher::Type`] is satisfied when the captured error is of a given
//!   type.

use std::any::{self, Any};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::Failure;
use crate::error::{Error, Result};

/// Specification of the failure an operation is expected to produce.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// The failure message contains this text.
    Text(String),
    /// The failure message matches this regular expression.
    Pattern(Pattern),
    /// The closure returns `true` for the failure.
    Predicate(Predicate),
    /// The captured error is of this type.
    Type(ErrorType),
}

impl Matcher {
    /// A matcher satisfied when the failure message contains `text`.
    pub fn text(text: impl Into<String>) -> Matcher {
        Matcher::Text(text.into())
    }

    /// A regular expression matcher.
    ///
    /// The expression is compiled when the matcher is handed to
    /// [`catch_and_match`](crate::catch_and_match), which reports
    /// [`Error::InvalidPattern`] instead of running the operation if it does
    /// not compile.
    pub fn regex(source: impl Into<String>) -> Matcher {
        Matcher::Pattern(Pattern::new(source))
    }

    /// A matcher satisfied when `f` returns `true` for the failure.
    pub fn predicate<F>(f: F) -> Matcher
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Predicate::new(f))
    }

    /// Matches errors of type `E`, see [`ErrorType::of`].
    pub fn error_type<E>() -> Matcher
    where
        E: StdError + Send + Sync + 'static,
    {
        Matcher::Type(ErrorType::of::<E>())
    }

    /// Whether `failure` satisfies this matcher.
    ///
    /// A pattern that has not been compiled yet is compiled here; if that
    /// fails the pattern matches nothing.
    pub fn matches(&self, failure: &Failure) -> bool {
        match self {
            Matcher::Text(text) => failure.message().contains(text.as_str()),
            Matcher::Pattern(pattern) => pattern.is_match(failure.message()),
            Matcher::Predicate(predicate) => predicate.call(failure),
            Matcher::Type(ty) => ty.matches(failure),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Text(text) => write!(f, "text {:?}", text),
            Matcher::Pattern(pattern) => write!(f, "pattern /{}/", pattern.as_str()),
            Matcher::Predicate(_) => f.write_str("predicate"),
            Matcher::Type(ty) => write!(f, "type `{}`", ty.name()),
        }
    }
}

/// A regular expression, either already compiled or still in source form.
#[derive(Clone, Debug)]
pub struct Pattern(PatternRepr);

#[derive(Clone, Debug)]
enum PatternRepr {
    Source(String),
    Compiled(Regex),
}

impl Pattern {
    /// A pattern from regular expression source, compiled when handed to
    /// [`catch_and_match`](crate::catch_and_match).
    pub fn new(source: impl Into<String>) -> Pattern {
        Pattern(PatternRepr::Source(source.into()))
    }

    /// The source text of the regular expression.
    pub fn as_str(&self) -> &str {
        match &self.0 {
            PatternRepr::Source(src) => src,
            PatternRepr::Compiled(re) => re.as_str(),
        }
    }

    fn compile(self) -> Result<Pattern> {
        match self.0 {
            PatternRepr::Source(src) => match Regex::new(&src) {
                Ok(re) => Ok(Pattern(PatternRepr::Compiled(re))),
                Err(source) => Err(Error::InvalidPattern {
                    pattern: src,
                    source,
                }),
            },
            compiled @ PatternRepr::Compiled(_) => Ok(Pattern(compiled)),
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match &self.0 {
            PatternRepr::Compiled(re) => re.is_match(haystack),
            PatternRepr::Source(src) => Regex::new(src).is_ok_and(|re| re.is_match(haystack)),
        }
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Pattern {
        Pattern(PatternRepr::Compiled(re))
    }
}

/// A caller-supplied test on the captured [`Failure`].
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Failure) -> bool + Send + Sync>);

impl Predicate {
    /// Wraps a closure deciding whether a failure is the expected one.
    pub fn new<F>(f: F) -> Predicate
    where
        F: Fn(&Failure) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    fn call(&self, failure: &Failure) -> bool {
        (self.0)(failure)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A reference to an error type, used to check what kind of error an
/// operation failed with.
#[derive(Clone, Copy)]
pub struct ErrorType {
    name: &'static str,
    check: fn(&Failure) -> bool,
}

impl ErrorType {
    /// Matches a captured error of type `E`.
    ///
    /// Errors that are boxed as `Box<dyn Error + Send + Sync>` or wrapped in
    /// an [`anyhow::Error`] match too when the inner error is an `E`.
    pub fn of<E>() -> ErrorType
    where
        E: StdError + Send + Sync + 'static,
    {
        ErrorType {
            name: any::type_name::<E>(),
            check: is_error::<E>,
        }
    }

    /// Matches a captured value of exactly type `T`, without looking through
    /// any wrapper. Useful for panic payloads and for error types that do not
    /// implement [`std::error::Error`].
    ///
    /// The payload of a formatted `panic!` may be either a `String` or a
    /// `&'static str`: the compiler can fold constant arguments into a static
    /// message.
    pub fn of_any<T: Any>() -> ErrorType {
        ErrorType {
            name: any::type_name::<T>(),
            check: Failure::is::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn matches(&self, failure: &Failure) -> bool {
        (self.check)(failure)
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorType").field(&self.name).finish()
    }
}

fn is_error<E>(failure: &Failure) -> bool
where
    E: StdError + Send + Sync + 'static,
{
    if failure.is::<E>() {
        return true;
    }
    if let Some(err) = failure.downcast_ref::<Box<dyn StdError + Send + Sync>>() {
        return err.is::<E>();
    }
    if let Some(err) = failure.downcast_ref::<anyhow::Error>() {
        return err.is::<E>();
    }
    false
}

/// Conversion into a [`Matcher`], performed before the operation under test
/// runs.
///
/// This is where usage errors are detected: a pattern that does not compile
/// is reported as [`Error::InvalidPattern`].
pub trait IntoMatcher {
    fn into_matcher(self) -> Result<Matcher>;
}

impl IntoMatcher for Matcher {
    fn into_matcher(self) -> Result<Matcher> {
        match self {
            Matcher::Pattern(pattern) => pattern.compile().map(Matcher::Pattern),
            other => Ok(other),
        }
    }
}

impl IntoMatcher for &str {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::text(self))
    }
}

impl IntoMatcher for String {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::Text(self))
    }
}

impl IntoMatcher for &String {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::text(self.as_str()))
    }
}

impl IntoMatcher for Regex {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::Pattern(self.into()))
    }
}

impl IntoMatcher for Pattern {
    fn into_matcher(self) -> Result<Matcher> {
        Matcher::Pattern(self).into_matcher()
    }
}

impl IntoMatcher for Predicate {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::Predicate(self))
    }
}

impl IntoMatcher for ErrorType {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::Type(self))
    }
}
