use std::io;
use std::num::ParseIntError;

use anyhow::anyhow;
use catch_and_match::{
    CatchAndMatch, Error, ErrorType, Matcher, Predicate, assert_catch_and_match, catch_and_match,
    catch_and_match_with,
};
use regex::Regex;
use snapbox::assert_data_eq;
use snapbox::str;

// `RUST_LOG=catch_and_match=debug` shows how each failure was classified.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn boom() -> anyhow::Result<()> {
    Err(anyhow!("boom"))
}

fn quiet() -> anyhow::Result<u32> {
    Ok(1)
}

fn explode() -> anyhow::Result<()> {
    // A runtime argument keeps the payload a formatted `String`.
    let step = std::hint::black_box(3);
    panic!("kaboom at step {step}")
}

fn explode_static() -> anyhow::Result<()> {
    panic!("kaboom")
}

/// Runs with a callback and returns both channels.
#[track_caller]
fn both_channels(
    operation: impl FnOnce() -> anyhow::Result<()>,
    matcher: Matcher,
) -> (Result<(), Error>, Option<Option<String>>) {
    let mut seen = None;
    let result = catch_and_match_with(operation, matcher, |err| {
        assert!(seen.is_none(), "callback invoked twice");
        seen = Some(err.map(ToString::to_string));
    });
    (result, seen)
}

#[test]
fn text_matcher_accepts_substring() {
    init_logging();
    catch_and_match(boom, "boom").unwrap();
    catch_and_match(boom, "oo").unwrap();
    catch_and_match(boom, String::from("boom")).unwrap();
    catch_and_match(boom, &String::from("bo")).unwrap();
}

#[test]
fn text_matcher_is_not_a_regex() {
    let err = catch_and_match(boom, "b..m").unwrap_err();
    assert!(matches!(err, Error::Mismatch { .. }));
}

#[test]
fn no_error_thrown() {
    let err = catch_and_match(|| {}, Matcher::regex("x")).unwrap_err();
    assert!(matches!(err, Error::NoErrorThrown));
    assert_data_eq!(err.to_string(), str!["no error thrown"]);

    for matcher in [
        Matcher::text("boom"),
        Matcher::regex("."),
        Matcher::predicate(|_| true),
        Matcher::error_type::<io::Error>(),
    ] {
        let err = catch_and_match(quiet, matcher).unwrap_err();
        assert!(matches!(err, Error::NoErrorThrown));
        assert!(err.is_assertion());
    }
}

#[test]
fn pattern_mismatch() {
    let err = catch_and_match(boom, Regex::new("zzz").unwrap()).unwrap_err();
    assert_data_eq!(
        err.to_string(),
        str!["error does not satisfy matcher pattern /zzz/ (error message: `boom`)"]
    );
}

#[test]
fn pattern_match() {
    catch_and_match(boom, Matcher::regex("^b(o)+m$")).unwrap();
    catch_and_match(boom, Regex::new("o{2}").unwrap()).unwrap();
}

#[test]
fn predicate_matcher() {
    catch_and_match(boom, Matcher::predicate(|f| f.message() == "boom")).unwrap();
    catch_and_match(boom, Predicate::new(|f| f.is::<anyhow::Error>())).unwrap();

    let err = catch_and_match(boom, Matcher::predicate(|f| f.is_panic())).unwrap_err();
    assert_data_eq!(
        err.to_string(),
        str!["error does not satisfy matcher predicate (error message: `boom`)"]
    );
}

#[test]
fn type_matcher() {
    catch_and_match(|| "x".parse::<i32>(), ErrorType::of::<ParseIntError>()).unwrap();
    catch_and_match(|| "x".parse::<i32>(), Matcher::error_type::<ParseIntError>()).unwrap();

    // Through an `anyhow` wrapper.
    let wrapped = || -> anyhow::Result<i32> { Ok("x".parse::<i32>()?) };
    catch_and_match(wrapped, ErrorType::of::<ParseIntError>()).unwrap();

    let err = catch_and_match(|| "x".parse::<i32>(), ErrorType::of::<io::Error>()).unwrap_err();
    assert!(matches!(err, Error::Mismatch { .. }));
}

#[test]
fn panics_count_as_failures() {
    catch_and_match(explode, "kaboom at step 3").unwrap();
    catch_and_match(explode, Matcher::predicate(|f| f.is_panic())).unwrap();
    catch_and_match(explode, ErrorType::of_any::<String>()).unwrap();

    let err = catch_and_match(explode, "fizzle").unwrap_err();
    assert!(err.to_string().contains("kaboom at step 3"));

    catch_and_match(explode_static, ErrorType::of_any::<&'static str>()).unwrap();
}

#[test]
fn value_returning_operation_panics() {
    let values = vec![1u32, 2, 3];
    catch_and_match(|| values[10], "index out of bounds").unwrap();
    catch_and_match(|| u8::MAX.checked_add(1).expect("overflow"), "overflow").unwrap();
    catch_and_match(|| -> &'static str { panic!("no str") }, "no str").unwrap();
}

#[test]
fn value_returning_operation_is_no_error() {
    let values = vec![1u32, 2, 3];
    let err = catch_and_match(|| values[0], "index out of bounds").unwrap_err();
    assert!(matches!(err, Error::NoErrorThrown));

    for result in [
        catch_and_match(|| true, "x"),
        catch_and_match(|| 'c', "x"),
        catch_and_match(|| 1.5f64, "x"),
        catch_and_match(|| String::from("s"), "x"),
        catch_and_match(|| "s", "x"),
        catch_and_match(|| values.clone(), "x"),
        catch_and_match(|| values.first().copied(), "x"),
    ] {
        assert!(matches!(result, Err(Error::NoErrorThrown)));
    }
}

#[test]
fn invalid_pattern_is_rejected_before_running() {
    let mut invoked = false;
    let mut called_back = false;
    let err = catch_and_match_with(
        || {
            invoked = true;
        },
        Matcher::regex("(unclosed"),
        |_| called_back = true,
    )
    .unwrap_err();

    assert!(err.is_usage());
    assert!(matches!(err, Error::InvalidPattern { .. }));
    assert_data_eq!(err.to_string(), str!["invalid pattern matcher `(unclosed`"]);
    assert!(std::error::Error::source(&err).is_some());
    assert!(!invoked);
    assert!(!called_back);
}

#[test]
fn callback_agrees_with_result() {
    init_logging();
    let (result, seen) = both_channels(boom, Matcher::text("boom"));
    assert!(result.is_ok());
    assert_eq!(seen, Some(None));

    let (result, seen) = both_channels(|| Ok(()), Matcher::text("boom"));
    assert_eq!(result.unwrap_err().to_string(), "no error thrown");
    assert_eq!(seen, Some(Some("no error thrown".to_string())));

    let (result, seen) = both_channels(boom, Matcher::text("zzz"));
    let message = result.unwrap_err().to_string();
    assert!(message.starts_with("error does not satisfy matcher"));
    assert_eq!(seen, Some(Some(message)));
}

#[test]
fn operation_runs_once() {
    let mut calls = 0;
    catch_and_match(
        || {
            calls += 1;
            Err::<(), _>("once")
        },
        "once",
    )
    .unwrap();
    assert_eq!(calls, 1);
}

#[test]
fn builder() {
    let mut outcome = None;
    CatchAndMatch::new(Matcher::text("invalid digit"))
        .on_complete(|err| outcome = Some(err.is_none()))
        .run(|| "q".parse::<u8>())
        .unwrap();
    assert_eq!(outcome, Some(true));
}

#[test]
fn assert_adapter_passes() {
    assert_catch_and_match(boom, "boom");
}

#[test]
#[should_panic(expected = "error: no error thrown")]
fn assert_adapter_panics_on_no_error() {
    assert_catch_and_match(quiet, "boom");
}

#[test]
#[should_panic(expected = "Caused by:")]
fn assert_adapter_reports_cause() {
    assert_catch_and_match(boom, Matcher::regex("["));
}
