//! Cap on how long one recording may run

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::MaxDurationParseError;

/// Cap applied when nothing is configured
pub const DEFAULT_MAX_DURATION: StdDuration = StdDuration::from_secs(5 * 60);

/// Words that switch the cap off
const UNLIMITED_WORDS: [&str; 3] = ["none", "off", "unlimited"];

/// Unit symbols, largest first, with their length in seconds
const UNITS: [(char, u64); 3] = [('h', 3600), ('m', 60), ('s', 1)];

/// How long the CLI keeps a recording open before stopping it itself.
///
/// Written as unit segments, largest unit first: `45s`, `2m30s`, `1h`.
/// `none` (or `off`, `unlimited`) records until stopped by hand. A zero
/// cap is rejected rather than read as "stop immediately".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxDuration {
    /// Record until stopped by hand
    Unlimited,
    /// Stop once this much time has passed
    Limit(StdDuration),
}

impl MaxDuration {
    pub fn limit(&self) -> Option<StdDuration> {
        match self {
            Self::Unlimited => None,
            Self::Limit(limit) => Some(*limit),
        }
    }

    /// Whether a recording running for `elapsed` has hit the cap
    pub fn is_reached_by(&self, elapsed: StdDuration) -> bool {
        self.limit().is_some_and(|limit| elapsed >= limit)
    }
}

impl Default for MaxDuration {
    fn default() -> Self {
        Self::Limit(DEFAULT_MAX_DURATION)
    }
}

impl FromStr for MaxDuration {
    type Err = MaxDurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        if UNLIMITED_WORDS.contains(&input.as_str()) {
            return Ok(Self::Unlimited);
        }

        let malformed = || MaxDurationParseError::Malformed(s.trim().to_string());
        if input.is_empty() {
            return Err(malformed());
        }

        let mut rest = input.as_str();
        let mut total_secs: u64 = 0;
        let mut previous_unit: Option<usize> = None;

        while !rest.is_empty() {
            // a number with no unit after it has no digit boundary
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(malformed)?;
            if digits == 0 {
                return Err(malformed());
            }
            let amount: u64 = rest[..digits].parse().map_err(|_| malformed())?;

            let symbol = rest[digits..].chars().next().ok_or_else(malformed)?;
            let unit = UNITS
                .iter()
                .position(|(unit, _)| *unit == symbol)
                .ok_or_else(malformed)?;
            if previous_unit.is_some_and(|previous| unit <= previous) {
                return Err(malformed());
            }
            previous_unit = Some(unit);

            total_secs = amount
                .checked_mul(UNITS[unit].1)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(malformed)?;
            rest = &rest[digits + symbol.len_utf8()..];
        }

        if total_secs == 0 {
            return Err(MaxDurationParseError::Zero(s.trim().to_string()));
        }
        Ok(Self::Limit(StdDuration::from_secs(total_secs)))
    }
}

impl fmt::Display for MaxDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Limit(limit) = self else {
            return f.write_str("none");
        };

        let mut secs = limit.as_secs();
        if secs == 0 {
            return f.write_str("0s");
        }
        for (symbol, size) in UNITS {
            let amount = secs / size;
            secs %= size;
            if amount > 0 {
                write!(f, "{}{}", amount, symbol)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(secs: u64) -> MaxDuration {
        MaxDuration::Limit(StdDuration::from_secs(secs))
    }

    #[test]
    fn parses_typical_caps() {
        assert_eq!("45s".parse::<MaxDuration>().unwrap(), limit(45));
        assert_eq!("2m30s".parse::<MaxDuration>().unwrap(), limit(150));
        assert_eq!("1h".parse::<MaxDuration>().unwrap(), limit(3600));
        assert_eq!("1h0m5s".parse::<MaxDuration>().unwrap(), limit(3605));
    }

    #[test]
    fn config_style_input_is_trimmed_and_case_insensitive() {
        assert_eq!(" 10M ".parse::<MaxDuration>().unwrap(), limit(600));
    }

    #[test]
    fn no_limit_words() {
        for word in ["none", "off", "Unlimited"] {
            assert_eq!(word.parse::<MaxDuration>().unwrap(), MaxDuration::Unlimited);
        }
    }

    #[test]
    fn zero_cap_is_rejected() {
        assert!(matches!(
            "0s".parse::<MaxDuration>(),
            Err(MaxDurationParseError::Zero(_))
        ));
        assert!(matches!(
            "0h0m".parse::<MaxDuration>(),
            Err(MaxDurationParseError::Zero(_))
        ));
    }

    #[test]
    fn malformed_caps_are_rejected() {
        for input in ["", "90", "soon", "5x", "m5", "30s1m", "1m1m", "-5s"] {
            assert!(
                matches!(
                    input.parse::<MaxDuration>(),
                    Err(MaxDurationParseError::Malformed(_))
                ),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn overflowing_cap_is_rejected() {
        assert!("99999999999999999999h".parse::<MaxDuration>().is_err());
        assert!("5124095576030432h".parse::<MaxDuration>().is_err());
    }

    #[test]
    fn stored_form_is_compact() {
        assert_eq!(limit(90).to_string(), "1m30s");
        assert_eq!(limit(300).to_string(), "5m");
        assert_eq!(limit(3660).to_string(), "1h1m");
        assert_eq!(MaxDuration::Unlimited.to_string(), "none");
    }

    #[test]
    fn stored_form_parses_back() {
        for cap in [limit(7), limit(3725), MaxDuration::Unlimited] {
            assert_eq!(cap.to_string().parse::<MaxDuration>().unwrap(), cap);
        }
    }

    #[test]
    fn default_is_five_minutes() {
        assert_eq!(MaxDuration::default(), limit(300));
    }

    #[test]
    fn cap_is_reached_at_the_limit() {
        let cap = limit(2);
        assert!(!cap.is_reached_by(StdDuration::from_millis(1999)));
        assert!(cap.is_reached_by(StdDuration::from_secs(2)));
    }

    #[test]
    fn unlimited_is_never_reached() {
        assert!(!MaxDuration::Unlimited.is_reached_by(StdDuration::from_secs(86_400)));
        assert_eq!(MaxDuration::Unlimited.limit(), None);
    }
}
