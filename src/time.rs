use std::{ops::Add, ops::AddAssign, str::FromStr, sync::OnceLock};

use regex::Regex;

use crate::error::{ReelplanError, ReelplanResult};

/// A span of media time in milliseconds.
///
/// Used both for durations and for positions measured from the start of a
/// track; millisecond precision is what the script grammar can express.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000)
    }

    /// Nanosecond value for the engine handoff.
    pub fn as_nanos(self) -> u64 {
        self.0 * 1_000_000
    }
}

impl Add for Millis {
    type Output = Millis;

    fn add(self, rhs: Millis) -> Millis {
        Millis(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Millis {
    fn add_assign(&mut self, rhs: Millis) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for Millis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (s, ms) = (self.0 / 1_000, self.0 % 1_000);
        match (s, ms) {
            (0, ms) => write!(f, "{ms}ms"),
            (s, 0) => write!(f, "{s}s"),
            (s, ms) => write!(f, "{s}s{ms}ms"),
        }
    }
}

/// Duration literal grammar: `(<int>s)?(<int>ms)?`, both groups optional.
///
/// The empty string parses to zero; anything that is not fully covered by the
/// two groups is a parse error.
impl FromStr for Millis {
    type Err = ReelplanError;

    fn from_str(s: &str) -> ReelplanResult<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^(?:([0-9]+)s)?(?:([0-9]+)ms)?$").expect("duration literal regex")
        });

        let caps = re
            .captures(s)
            .ok_or_else(|| ReelplanError::parse(format!("invalid time delta: '{s}'")))?;

        let group = |i: usize| -> ReelplanResult<u64> {
            match caps.get(i) {
                None => Ok(0),
                Some(m) => m
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| ReelplanError::parse(format!("time delta out of range: '{s}'"))),
            }
        };

        Ok(Millis(group(1)?.saturating_mul(1_000) + group(2)?))
    }
}
