/// `[+-]?[0-9]+`
pub fn is_integer_text(bytes: &[u8]) -> bool {
    let digits = match bytes.first() {
        Some(b'+' | b'-') => &bytes[1..],
        _ => bytes,
    };
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Optional sign, then a digit or a `.` followed by a digit. Keeps words such as
/// `inf` or `nan` out of the float parser.
pub fn looks_numeric(bytes: &[u8]) -> bool {
    let rest = match bytes.first() {
        Some(b'+' | b'-') => &bytes[1..],
        _ => bytes,
    };
    match rest {
        [first, ..] if first.is_ascii_digit() => true,
        [b'.', second, ..] => second.is_ascii_digit(),
        _ => false,
    }
}

pub fn has_float_marker(bytes: &[u8]) -> bool {
    bytes.iter().any(|byte| matches!(byte, b'.' | b'e' | b'E'))
}

pub fn parse_int(token: &str) -> Option<i64> {
    if !is_integer_text(token.as_bytes()) {
        return None;
    }
    token.parse().ok()
}

pub fn parse_float(token: &str) -> Option<f64> {
    if !looks_numeric(token.as_bytes()) {
        return None;
    }
    token.parse().ok()
}

pub fn write_int_into(out: &mut Vec<u8>, value: i64) {
    let mut buffer = itoa::Buffer::new();
    out.extend_from_slice(buffer.format(value).as_bytes());
}

/// Writes a float so that it reads back as a float (`ryu` always keeps a `.` or an
/// exponent). Returns false for non-finite values, which have no text form.
pub fn write_float_into(out: &mut Vec<u8>, value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let mut buffer = ryu::Buffer::new();
    out.extend_from_slice(buffer.format_finite(value).as_bytes());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("42", Some(42))]
    #[case("-7", Some(-7))]
    #[case("+3", Some(3))]
    #[case("007", Some(7))]
    #[case("1.0", None)]
    #[case("99999999999999999999", None)]
    #[case("-", None)]
    #[case("", None)]
    fn test_parse_int(#[case] token: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_int(token), expected);
    }

    #[rstest::rstest]
    #[case("1.5", Some(1.5))]
    #[case("-2e3", Some(-2000.0))]
    #[case(".25", Some(0.25))]
    #[case("10", Some(10.0))]
    #[case("inf", None)]
    #[case("NaN", None)]
    #[case("1e", None)]
    #[case("abc", None)]
    fn test_parse_float(#[case] token: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_float(token), expected);
    }

    #[rstest::rstest]
    fn test_write_numbers() {
        let mut out = Vec::new();
        write_int_into(&mut out, -91);
        out.push(b' ');
        assert!(write_float_into(&mut out, 1.0));
        out.push(b' ');
        assert!(write_float_into(&mut out, 0.1));
        assert_eq!(out, b"-91 1.0 0.1");
        assert!(!write_float_into(&mut out, f64::NAN));
    }

    #[rstest::rstest]
    fn test_written_float_reads_back() {
        for value in [1e300, -4.5e-12, 123456.789, 0.0] {
            let mut out = Vec::new();
            assert!(write_float_into(&mut out, value));
            let text = std::str::from_utf8(&out).unwrap();
            assert!(has_float_marker(text.as_bytes()));
            assert_eq!(parse_float(text), Some(value));
        }
    }
}
