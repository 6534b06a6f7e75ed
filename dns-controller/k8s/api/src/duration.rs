use std::{fmt, str::FromStr, time::Duration};

/// A record TTL, in whole seconds.
///
/// Written either as a bare number of seconds (`300`) or as a Go duration (`5m`, `1h30m`). Values
/// must lie in `1..=2^31-1` seconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ttl(u32);

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid unit: {}", EXPECTED_UNITS)]
    InvalidUnit,

    #[error("missing a unit: {}", EXPECTED_UNITS)]
    NoUnit,

    #[error("invalid floating-point number: {}", .0)]
    NotANumber(#[from] std::num::ParseFloatError),

    #[error("TTL must not be negative")]
    Negative,

    #[error("TTL of {0}s is out of range {min}..={max}", min = Ttl::MIN, max = Ttl::MAX)]
    OutOfRange(u64),
}

const EXPECTED_UNITS: &str = "expected one of 'ns', 'us', '\u{00b5}s', 'ms', 's', 'm', or 'h'";

impl Ttl {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = i32::MAX as u32;

    pub fn as_secs(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u64> for Ttl {
    type Error = ParseError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        match u32::try_from(secs) {
            Ok(secs) if (Self::MIN..=Self::MAX).contains(&secs) => Ok(Self(secs)),
            _ => Err(ParseError::OutOfRange(secs)),
        }
    }
}

impl From<Ttl> for Duration {
    fn from(Ttl(secs): Ttl) -> Self {
        Duration::from_secs(secs.into())
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for Ttl {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<i64>() {
            return u64::try_from(secs)
                .map_err(|_| ParseError::OutOfRange(0))
                .and_then(Self::try_from);
        }

        if s.starts_with('-') {
            return Err(ParseError::Negative);
        }
        // Fractional seconds are truncated.
        Self::try_from(parse_duration(s)?.as_secs())
    }
}

/// Parses a duration in Go's `time.ParseDuration` format.
fn parse_duration(mut s: &str) -> Result<Duration, ParseError> {
    fn duration_from_units(val: f64, unit: &str) -> Result<Duration, ParseError> {
        const MINUTE: Duration = Duration::from_secs(60);
        let base = match unit {
            "ns" => Duration::from_nanos(1),
            // U+00B5 is the "micro sign" while U+03BC is "Greek letter mu"
            "us" | "\u{00b5}s" | "\u{03bc}s" => Duration::from_micros(1),
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => MINUTE,
            "h" => MINUTE * 60,
            _ => return Err(ParseError::InvalidUnit),
        };
        Ok(base.mul_f64(val))
    }

    s = s.trim_start_matches('+');

    let mut total = Duration::from_secs(0);
    while !s.is_empty() {
        if let Some(unit_start) = s.find(|c: char| c.is_alphabetic()) {
            let (val, rest) = s.split_at(unit_start);
            let val = val.parse::<f64>()?;
            let unit = if let Some(next_numeric_start) = rest.find(|c: char| !c.is_alphabetic()) {
                let (unit, rest) = rest.split_at(next_numeric_start);
                s = rest;
                unit
            } else {
                s = "";
                rest
            };
            total += duration_from_units(val, unit)?;
        } else {
            return Err(ParseError::NoUnit);
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("300", 300)]
    #[case(" 60 ", 60)]
    #[case("5s", 5)]
    #[case("5.6s", 5)]
    #[case("15m", 15 * 60)]
    #[case("1h30m", 90 * 60)]
    #[case("10.5s4m", 250)]
    #[case("+1m", 60)]
    #[case("2147483647", 2147483647)]
    fn parses_ttls(#[case] input: &str, #[case] secs: u32) {
        assert_eq!(input.parse::<Ttl>().map(|ttl| ttl.as_secs()), Ok(secs));
    }

    #[rstest]
    #[case("0", ParseError::OutOfRange(0))]
    #[case("-5", ParseError::OutOfRange(0))]
    #[case("-5s", ParseError::Negative)]
    #[case("500ms", ParseError::OutOfRange(0))]
    #[case("2147483648", ParseError::OutOfRange(2147483648))]
    #[case("5d", ParseError::InvalidUnit)]
    #[case("5.5", ParseError::NoUnit)]
    fn rejects_ttls(#[case] input: &str, #[case] error: ParseError) {
        assert_eq!(input.parse::<Ttl>(), Err(error));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "abc".parse::<Ttl>(),
            Err(ParseError::NotANumber(_))
        ));
        assert!("".parse::<Ttl>().is_err());
    }
}
