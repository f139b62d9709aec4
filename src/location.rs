/*
 * location.rs
 *
 * Where did the panic come from. file, function, line, column.
 *
 * Rust gives us file/line/column for free through #[track_caller], but not
 * the enclosing function name. The location! macro fills that in with the
 * type_name trick; SourceLocation::caller() leaves it as "<unknown>".
 *
 * 0 is the "unknown" sentinel for line and column. Nothing here allocates,
 * the strings are borrowed for the duration of the panic call only.
 */

use core::panic::Location;

/// Placeholder for names we could not capture.
pub const UNKNOWN_NAME: &str = "<unknown>";

/// Call site of a panic. Borrowed, immutable, `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    file_name: &'a str,
    function_name: &'a str,
    line: u32,
    column: u32,
}

impl<'a> SourceLocation<'a> {
    #[must_use]
    pub const fn new(file_name: &'a str, function_name: &'a str, line: u32, column: u32) -> Self {
        Self {
            file_name,
            function_name,
            line,
            column,
        }
    }

    /// Location with every field unknown. Renders as `<unknown>:unknown:unknown`.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(UNKNOWN_NAME, UNKNOWN_NAME, 0, 0)
    }

    #[must_use]
    pub const fn file_name(&self) -> &'a str {
        self.file_name
    }

    #[must_use]
    pub const fn function_name(&self) -> &'a str {
        self.function_name
    }

    /// Line number, 0 if unknown.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Column number, 0 if unknown.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl SourceLocation<'static> {
    /// The caller's location. Propagates through `#[track_caller]` frames,
    /// so a helper marked with it reports *its* caller.
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }
}

impl<'a> From<&'a Location<'a>> for SourceLocation<'a> {
    fn from(loc: &'a Location<'a>) -> Self {
        Self::new(loc.file(), UNKNOWN_NAME, loc.line(), loc.column())
    }
}

impl Default for SourceLocation<'_> {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Path of the enclosing function, e.g. `my_crate::module::func`.
///
/// Inside closures the path ends in `{{closure}}`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::core::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        match name.strip_suffix("::__here") {
            Some(stripped) => stripped,
            None => name,
        }
    }};
}

/// Full [`SourceLocation`] of the macro invocation site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::location::SourceLocation::new(
            ::core::file!(),
            $crate::function_name!(),
            ::core::line!(),
            ::core::column!(),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_macro_captures_function() {
        let loc = crate::location!();
        assert!(loc.file_name().ends_with("location.rs"));
        assert!(
            loc.function_name()
                .ends_with("test_location_macro_captures_function"),
            "got {}",
            loc.function_name()
        );
        assert!(loc.line() > 0);
        assert!(loc.column() > 0);
    }

    #[test]
    fn test_caller_has_no_function_name() {
        let loc = SourceLocation::caller();
        assert_eq!(loc.function_name(), UNKNOWN_NAME);
        assert!(loc.file_name().ends_with("location.rs"));
        assert_eq!(loc.line(), line!() - 3);
    }

    #[test]
    fn test_caller_propagates_through_track_caller() {
        #[track_caller]
        fn helper() -> SourceLocation<'static> {
            SourceLocation::caller()
        }

        let expected = line!() + 1;
        let loc = helper();
        assert_eq!(loc.line(), expected);
    }

    #[test]
    fn test_unknown_uses_sentinels() {
        let loc = SourceLocation::unknown();
        assert_eq!(loc.line(), 0);
        assert_eq!(loc.column(), 0);
        assert_eq!(loc.file_name(), UNKNOWN_NAME);
        assert_eq!(SourceLocation::default(), loc);
    }
}
