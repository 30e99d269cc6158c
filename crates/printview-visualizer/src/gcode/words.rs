//! Parameter words of a single G-code line
//!
//! Each recognized letter gets its own slot, so an absent word (`None`) is
//! distinct from a zero value. Values are read with a permissive
//! numeric-prefix parser: `X12.5mm` reads 12.5, and a word with no numeric
//! prefix at all reads NaN.

/// Parse the leading decimal number of `text`
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Trailing garbage is ignored. Returns NaN when no
/// number can be read.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if text[end..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - digits_start;

    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        let fraction_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        digits += end - fraction_start;
    }

    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

/// Recognized parameter words of one command line
///
/// Later occurrences of a letter replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Words {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    /// Feedrate
    pub f: Option<f64>,
    /// Dwell milliseconds, or print acceleration for M204
    pub p: Option<f64>,
    /// Dwell seconds, min feedrate for M205, percentage for M221
    pub s: Option<f64>,
    /// Retract acceleration (M204)
    pub r: Option<f64>,
    /// Travel acceleration (M204) or min travel feedrate (M205)
    pub t: Option<f64>,
    /// Words whose value had no numeric prefix
    pub malformed: Vec<String>,
}

impl Words {
    /// Parse the parameter tokens that follow the command token
    pub fn parse<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut words = Self::default();

        for token in tokens {
            let mut chars = token.chars();
            let Some(letter) = chars.next() else {
                continue;
            };
            let value = parse_number(chars.as_str());

            let slot = match letter.to_ascii_uppercase() {
                'X' => &mut words.x,
                'Y' => &mut words.y,
                'Z' => &mut words.z,
                'E' => &mut words.e,
                'F' => &mut words.f,
                'P' => &mut words.p,
                'S' => &mut words.s,
                'R' => &mut words.r,
                'T' => &mut words.t,
                _ => continue,
            };

            if value.is_nan() {
                words.malformed.push(token.to_string());
            }
            *slot = Some(value);
        }

        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_plain_values() {
        assert_eq!(parse_number("10"), 10.0);
        assert_eq!(parse_number("-2.5"), -2.5);
        assert_eq!(parse_number("+.5"), 0.5);
        assert_eq!(parse_number("3."), 3.0);
        assert_eq!(parse_number("1E3"), 1000.0);
        assert_eq!(parse_number("1e-1"), 0.1);
    }

    #[test]
    fn test_parse_number_reads_prefix_only() {
        assert_eq!(parse_number("0.4,0.4"), 0.4);
        assert_eq!(parse_number("12.5mm"), 12.5);
        assert_eq!(parse_number("2E"), 2.0);
        assert_eq!(parse_number("7e+"), 7.0);
        assert_eq!(parse_number("0.4\r"), 0.4);
    }

    #[test]
    fn test_parse_number_without_digits_is_nan() {
        assert!(parse_number("").is_nan());
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("-").is_nan());
        assert!(parse_number(".").is_nan());
        assert!(parse_number("e5").is_nan());
    }

    #[test]
    fn test_parse_number_infinity() {
        assert_eq!(parse_number("Infinity"), f64::INFINITY);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_words_absent_vs_zero() {
        let words = Words::parse(["X0", "E1.5"]);
        assert_eq!(words.x, Some(0.0));
        assert_eq!(words.y, None);
        assert_eq!(words.e, Some(1.5));
        assert!(words.malformed.is_empty());
    }

    #[test]
    fn test_words_are_case_insensitive_and_skip_unknown_letters() {
        let words = Words::parse(["x1", "y2", "Q9", "f1200"]);
        assert_eq!(words.x, Some(1.0));
        assert_eq!(words.y, Some(2.0));
        assert_eq!(words.f, Some(1200.0));
    }

    #[test]
    fn test_words_record_malformed_tokens() {
        let words = Words::parse(["Xabc", "Y", "Q?"]);
        assert!(words.x.is_some_and(f64::is_nan));
        assert!(words.y.is_some_and(f64::is_nan));
        assert_eq!(words.malformed, vec!["Xabc".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_words_last_occurrence_wins() {
        let words = Words::parse(["X1", "X2"]);
        assert_eq!(words.x, Some(2.0));
    }
}
