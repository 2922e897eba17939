//! Line sanitizer.
//!
//! Normalizes line terminators and classifies a received chunk as blank or
//! non-blank. Pure; the caller retains the raw buffer.

/// A normalized view of one received chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedLine {
    /// Text with every CR and LF replaced by a space (lossy UTF-8).
    pub text: String,
    /// True iff at least one byte exceeds 0x20 after replacement.
    pub non_blank: bool,
}

/// Sanitizes a raw chunk. A NUL byte terminates the line early; bytes past
/// it are ignored.
pub fn sanitize(raw: &[u8]) -> SanitizedLine {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut bytes = raw[..end].to_vec();

    let mut non_blank = false;
    for b in &mut bytes {
        if *b == b'\r' || *b == b'\n' {
            *b = b' ';
        } else if *b > 0x20 {
            non_blank = true;
        }
    }

    SanitizedLine {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        non_blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_cr_and_lf_with_spaces() {
        let line = sanitize(b"HELLO\r\n");
        assert_eq!(line.text, "HELLO  ");
        assert!(!line.text.contains('\r'));
        assert!(!line.text.contains('\n'));
        assert!(line.non_blank);
    }

    #[test]
    fn crlf_only_is_blank() {
        let line = sanitize(b"\r\n");
        assert_eq!(line.text, "  ");
        assert!(!line.non_blank);
    }

    #[test]
    fn bytes_at_or_below_space_are_blank() {
        let line = sanitize(&[0x01, 0x09, 0x20, b'\r', b'\n']);
        assert!(!line.non_blank);
    }

    #[test]
    fn single_printable_byte_is_non_blank() {
        let line = sanitize(&[0x20, 0x20, b'!']);
        assert!(line.non_blank);
    }

    #[test]
    fn empty_input_is_blank() {
        let line = sanitize(b"");
        assert_eq!(line.text, "");
        assert!(!line.non_blank);
    }

    #[test]
    fn nul_terminates_the_line() {
        let line = sanitize(b"OK\0garbage");
        assert_eq!(line.text, "OK");
        assert!(line.non_blank);
    }

    #[test]
    fn nul_hides_trailing_printables() {
        let line = sanitize(b"\r\n\0X");
        assert!(!line.non_blank);
    }

    #[test]
    fn non_utf8_bytes_are_replaced_not_dropped() {
        let line = sanitize(&[0xFF, b'A', b'\n']);
        assert!(line.non_blank);
        assert!(line.text.ends_with("A "));
    }
}
