//!
//! Pattern assertion used by validation tests, modeled on the nightly
//! `assert_matches!` macro.
//!

use std::fmt;

/// Asserts that an expression matches one of the given patterns, with an optional `if` guard.
///
/// On failure the value is printed with its `Debug` representation, which for rule errors
/// includes the structured payload (missing parents, offending outpoints and so on).
///
/// ```ignore
/// use kestrel_core::assert_match;
///
/// let res: Result<(), RuleError> = Err(RuleError::NoParents);
/// assert_match!(res, Err(RuleError::NoParents));
/// assert_match!(Some(3), Some(x) if x > 2, "unexpected value");
/// ```
#[macro_export]
macro_rules! assert_match {
    ($left:expr, $(|)? $( $pattern:pat_param )|+ $( if $guard: expr )? $(,)?) => {
        match $left {
            $( $pattern )|+ $( if $guard )? => {}
            ref left_val => {
                $crate::assert::match_failed(left_val, stringify!($($pattern)|+ $(if $guard)?), None);
            }
        }
    };
    ($left:expr, $(|)? $( $pattern:pat_param )|+ $( if $guard: expr )?, $($arg:tt)+) => {
        match $left {
            $( $pattern )|+ $( if $guard )? => {}
            ref left_val => {
                $crate::assert::match_failed(
                    left_val,
                    stringify!($($pattern)|+ $(if $guard)?),
                    Some(format_args!($($arg)+)),
                );
            }
        }
    };
}

#[cold]
#[track_caller]
#[doc(hidden)]
pub fn match_failed<T: fmt::Debug + ?Sized>(value: &T, pattern: &str, args: Option<fmt::Arguments<'_>>) -> ! {
    match args {
        Some(args) => panic!("assertion failed: `value matches {pattern}`\n  value: `{value:?}`: {args}"),
        None => panic!("assertion failed: `value matches {pattern}`\n  value: `{value:?}`"),
    }
}
