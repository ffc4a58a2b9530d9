use crate::error::CoreError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Markers a timing sheet prints instead of a time, compared case-insensitively.
const NON_FINISH_MARKERS: [&str; 6] = ["DNF", "DNS", "DSQ", "DQ", "NC", "NAN"];

/// A session time as it is stored: seconds, or the marker that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultTime {
    /// Elapsed seconds. On a Race/Sprint sheet this is a gap until ingestion
    /// adds the winner's time to it.
    Elapsed(Decimal),
    /// No numeric value. Excluded from every time or points computation.
    Marker(String),
}

impl ResultTime {
    /// Parses a sheet value.
    ///
    /// Accepts `H:MM:SS.fff`, `M:SS.fff` and `SS.fff`, each optionally written as
    /// a gap (`+7.313s`). Non-finish markers and lapped gaps (`+1 Lap`) become
    /// [`ResultTime::Marker`]. Anything else is [`CoreError::UnparsableTime`].
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if is_non_finish(trimmed) {
            return Ok(ResultTime::Marker(trimmed.to_string()));
        }
        parse_seconds(trimmed)
            .map(ResultTime::Elapsed)
            .ok_or_else(|| CoreError::UnparsableTime(raw.to_string()))
    }

    /// Rebuilds a value written by [`ResultTime::to_stored`]. Never fails.
    ///
    /// Only the plain decimal that [`ResultTime::to_stored`] writes for
    /// [`ResultTime::Elapsed`] reads back as seconds. Anything else, including
    /// text that [`ResultTime::parse`] would accept such as `+3.000s`, is a marker.
    pub fn from_stored(stored: &str) -> Self {
        match decimal_seconds(stored) {
            Some(seconds) => ResultTime::Elapsed(seconds),
            None => ResultTime::Marker(stored.to_string()),
        }
    }

    pub fn to_stored(&self) -> String {
        self.to_string()
    }

    pub fn seconds(&self) -> Option<Decimal> {
        match self {
            ResultTime::Elapsed(seconds) => Some(*seconds),
            ResultTime::Marker(_) => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, ResultTime::Marker(_))
    }

    /// Turns a gap into an absolute time. Markers are returned unchanged.
    pub fn behind(self, leader: Decimal) -> Self {
        match self {
            ResultTime::Elapsed(gap) => ResultTime::Elapsed(leader + gap),
            marker => marker,
        }
    }
}

impl fmt::Display for ResultTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultTime::Elapsed(seconds) => write!(f, "{}", seconds.normalize()),
            ResultTime::Marker(marker) => f.write_str(marker),
        }
    }
}

fn is_non_finish(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    let upper = value.to_ascii_uppercase();
    NON_FINISH_MARKERS.contains(&upper.as_str())
        || (upper.starts_with('+') && upper.contains("LAP"))
}

fn parse_seconds(value: &str) -> Option<Decimal> {
    let unsigned = value.strip_prefix('+').unwrap_or(value);
    let bare = unsigned.strip_suffix('s').unwrap_or(unsigned);
    let parts: Vec<&str> = bare.split(':').collect();

    match parts.as_slice() {
        [hours, minutes, seconds] => {
            let hours = whole_number(hours)?;
            let minutes = whole_number(minutes).filter(|m| *m < 60)?;
            let seconds = decimal_seconds(seconds).filter(|s| *s < dec!(60))?;
            let whole = Decimal::from(hours) * dec!(3600) + Decimal::from(minutes) * dec!(60);
            Some(whole + seconds)
        }
        [minutes, seconds] => {
            let minutes = whole_number(minutes)?;
            let seconds = decimal_seconds(seconds).filter(|s| *s < dec!(60))?;
            Some(Decimal::from(minutes) * dec!(60) + seconds)
        }
        [seconds] => decimal_seconds(seconds),
        _ => None,
    }
}

fn whole_number(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn decimal_seconds(part: &str) -> Option<Decimal> {
    let well_formed = part.bytes().any(|b| b.is_ascii_digit())
        && part.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    if !well_formed {
        return None;
    }
    Decimal::from_str(part).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seconds(raw: &str) -> Decimal {
        ResultTime::parse(raw).unwrap().seconds().unwrap()
    }

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(seconds("1:42:06.304"), dec!(6126.304));
    }

    #[test]
    fn parses_minutes_seconds() {
        assert_eq!(seconds("1:15.096"), dec!(75.096));
    }

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(seconds("22.500"), dec!(22.5));
    }

    #[test]
    fn parses_gap_notation() {
        assert_eq!(seconds("+7.313s"), dec!(7.313));
        assert_eq!(seconds("+1:02.100"), dec!(62.1));
    }

    #[test]
    fn non_finish_markers_are_not_errors() {
        for marker in ["DNF", "DNS", "DSQ", "nan", "NC", "", "+1 Lap", "+3 laps"] {
            let parsed = ResultTime::parse(marker).unwrap();
            assert!(parsed.is_marker(), "{marker:?} should be a marker");
            assert_eq!(parsed.seconds(), None);
        }
        assert_eq!(
            ResultTime::parse("DNF").unwrap(),
            ResultTime::Marker("DNF".to_string())
        );
    }

    #[test]
    fn garbage_is_unparsable() {
        for raw in ["abc", "-3.0", "1:75.000", "1:2:3:4", "1::05.0", "12.5.3"] {
            assert_eq!(
                ResultTime::parse(raw),
                Err(CoreError::UnparsableTime(raw.to_string())),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn gaps_become_absolute_behind_the_leader() {
        let gap = ResultTime::parse("+7.313s").unwrap();
        assert_eq!(gap.behind(dec!(6126.304)), ResultTime::Elapsed(dec!(6133.617)));

        let lapped = ResultTime::parse("+1 Lap").unwrap();
        assert_eq!(lapped.clone().behind(dec!(6126.304)), lapped);
    }

    #[test]
    fn stored_form_is_read_back() {
        assert_eq!(ResultTime::Elapsed(dec!(75.0960)).to_stored(), "75.096");
        assert_eq!(ResultTime::from_stored("75.096"), ResultTime::Elapsed(dec!(75.096)));
        assert_eq!(
            ResultTime::from_stored("DNS"),
            ResultTime::Marker("DNS".to_string())
        );
    }

    #[test]
    fn markers_that_look_like_times_survive_storage() {
        for raw in ["+3.000s", "+1:02.100", "1:29.421", "3.000s"] {
            let marker = ResultTime::Marker(raw.to_string());
            assert_eq!(ResultTime::from_stored(&marker.to_stored()), marker, "{raw:?}");
        }
    }

    #[test]
    fn elapsed_times_survive_storage() {
        for seconds in [dec!(5400), dec!(5401.5), dec!(89.4210), dec!(0.001)] {
            let elapsed = ResultTime::Elapsed(seconds);
            assert_eq!(
                ResultTime::from_stored(&elapsed.to_stored()),
                ResultTime::Elapsed(seconds.normalize())
            );
        }
    }
}
