/*
 * unwrap.rs
 *
 * Where recoverable failures turn into panics: unwrapping an Option that is
 * None, or a Result that is Err, through our entry point instead of std's.
 *
 * #[track_caller] all the way, so the reported location is the unwrap, not
 * this file. For Result the Debug form of the error rides along as the
 * payload.
 */

use core::fmt::{Debug, Write as _};

use crate::location::SourceLocation;
use crate::panic::panic;
use crate::payload::ReportPayload;

pub trait OrPanic<T> {
    /// The value, or a panic with a stock message.
    fn or_panic(self) -> T;

    /// The value, or a panic with `message`.
    fn or_panic_with(self, message: &str) -> T;
}

impl<T> OrPanic<T> for Option<T> {
    #[track_caller]
    #[inline]
    fn or_panic(self) -> T {
        self.or_panic_with("called `Option::or_panic()` on a `None` value")
    }

    #[track_caller]
    #[inline]
    fn or_panic_with(self, message: &str) -> T {
        match self {
            Some(value) => value,
            None => panic(message, ReportPayload::empty(), SourceLocation::caller()),
        }
    }
}

impl<T, E: Debug> OrPanic<T> for Result<T, E> {
    #[track_caller]
    #[inline]
    fn or_panic(self) -> T {
        self.or_panic_with("called `Result::or_panic()` on an `Err` value")
    }

    #[track_caller]
    #[inline]
    fn or_panic_with(self, message: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => err_panic(message, &err, SourceLocation::caller()),
        }
    }
}

#[cold]
#[inline(never)]
fn err_panic(message: &str, err: &dyn Debug, location: SourceLocation<'_>) -> ! {
    let mut detail = String::new();
    /* Debug impls can fail; whatever made it into the string is enough */
    let _ = write!(detail, "{err:?}");
    panic(message, ReportPayload::from(detail.as_str()), location)
}
