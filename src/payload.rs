/*
 * payload.rs
 *
 * Extra bytes attached to a panic. Opaque: no encoding, no NUL terminator,
 * never copied. Lives as long as the panic call that carries it.
 */

/// Borrowed, read-only diagnostic bytes. May be empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportPayload<'a> {
    data: &'a [u8],
}

impl<'a> ReportPayload<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { data: &[] }
    }

    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<'a> From<&'a [u8]> for ReportPayload<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ReportPayload<'a> {
    fn from(data: &'a [u8; N]) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a str> for ReportPayload<'a> {
    fn from(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload() {
        let payload = ReportPayload::empty();
        assert!(payload.is_empty());
        assert_eq!(payload.data(), b"");
        assert_eq!(payload, ReportPayload::default());
    }

    #[test]
    fn test_payload_is_a_view_not_a_copy() {
        let bytes = [0x01u8, 0x00, 0xff];
        let payload = ReportPayload::from(&bytes);
        assert_eq!(payload.data().as_ptr(), bytes.as_ptr());
        /* interior NUL and non-UTF-8 bytes survive */
        assert_eq!(payload.data(), &[0x01, 0x00, 0xff]);
    }

    #[test]
    fn test_from_str() {
        let payload = ReportPayload::from("errno=28");
        assert_eq!(payload.data(), b"errno=28");
    }
}
