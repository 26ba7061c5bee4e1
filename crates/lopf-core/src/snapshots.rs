//! The snapshot index: the ordered time points a network is optimized over.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{LopfError, LopfResult};

/// Strictly increasing, non-empty sequence of time points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SnapshotIndex {
    timestamps: Vec<NaiveDateTime>,
}

impl SnapshotIndex {
    /// Every `frequency` step from `start` up to and including `end`.
    pub fn date_range(
        start: NaiveDateTime,
        end: NaiveDateTime,
        frequency: Duration,
    ) -> LopfResult<Self> {
        if frequency <= Duration::zero() {
            return Err(LopfError::InvalidSnapshots(format!(
                "frequency must be positive, got {frequency}"
            )));
        }
        if end < start {
            return Err(LopfError::InvalidSnapshots(format!(
                "end {end} is before start {start}"
            )));
        }

        let mut timestamps = Vec::new();
        let mut current = start;
        while current <= end {
            timestamps.push(current);
            current = current.checked_add_signed(frequency).ok_or_else(|| {
                LopfError::InvalidSnapshots(format!("timestamp overflow after {current}"))
            })?;
        }
        Ok(Self { timestamps })
    }

    /// `count` hourly snapshots starting at `start`.
    pub fn hourly(start: NaiveDateTime, count: usize) -> LopfResult<Self> {
        if count == 0 {
            return Err(LopfError::InvalidSnapshots(
                "at least one snapshot is required".into(),
            ));
        }
        let end = i64::try_from(count - 1)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(|| {
                LopfError::InvalidSnapshots(format!("{count} hourly snapshots overflow the calendar"))
            })?;
        Self::date_range(start, end, Duration::hours(1))
    }

    pub fn from_timestamps(timestamps: Vec<NaiveDateTime>) -> LopfResult<Self> {
        if timestamps.is_empty() {
            return Err(LopfError::InvalidSnapshots(
                "at least one snapshot is required".into(),
            ));
        }
        if let Some(pair) = timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(LopfError::InvalidSnapshots(format!(
                "timestamps must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { timestamps })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn get(&self, t: usize) -> Option<NaiveDateTime> {
        self.timestamps.get(t).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.timestamps.iter()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.timestamps[0]
    }

    pub fn end(&self) -> NaiveDateTime {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// The common spacing, if there are at least two snapshots and all gaps match.
    pub fn frequency(&self) -> Option<Duration> {
        let mut gaps = self.timestamps.windows(2).map(|w| w[1] - w[0]);
        let first = gaps.next()?;
        gaps.all(|gap| gap == first).then_some(first)
    }

    /// Mean of a snapshot-aligned series per calendar day, in date order.
    pub fn daily_means(&self, values: &[f64]) -> LopfResult<Vec<(NaiveDate, f64)>> {
        if values.len() != self.len() {
            return Err(LopfError::Validation(format!(
                "series has {} values but the snapshot index has {}",
                values.len(),
                self.len()
            )));
        }

        let mut out: Vec<(NaiveDate, f64, usize)> = Vec::new();
        for (ts, value) in self.timestamps.iter().zip(values) {
            let day = ts.date();
            match out.last_mut() {
                Some((d, sum, n)) if *d == day => {
                    *sum += value;
                    *n += 1;
                }
                _ => out.push((day, *value, 1)),
            }
        }
        Ok(out
            .into_iter()
            .map(|(day, sum, n)| (day, sum / n as f64))
            .collect())
    }
}

/// Parse a frequency string such as `h`, `3h`, `30min`, `15s` or `1d`.
pub fn parse_frequency(text: &str) -> LopfResult<Duration> {
    let text = text.trim().to_ascii_lowercase();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| LopfError::InvalidSnapshots(format!("frequency '{text}' has no unit")))?;
    let (count, unit) = text.split_at(split);
    let count: i64 = if count.is_empty() {
        1
    } else {
        count
            .parse()
            .map_err(|_| LopfError::InvalidSnapshots(format!("bad frequency count in '{text}'")))?
    };

    let seconds_per_unit = match unit {
        "s" | "sec" => 1,
        "min" | "t" => 60,
        "h" | "hr" | "hour" => 3_600,
        "d" | "day" => 86_400,
        other => {
            return Err(LopfError::InvalidSnapshots(format!(
                "unknown frequency unit '{other}'"
            )))
        }
    };
    if count == 0 {
        return Err(LopfError::InvalidSnapshots(
            "frequency must be positive".into(),
        ));
    }
    count
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| LopfError::InvalidSnapshots(format!("frequency '{text}' is too large")))
}

/// Inverse of [`parse_frequency`], choosing the largest exact unit.
pub fn format_frequency(frequency: Duration) -> String {
    let secs = frequency.num_seconds();
    if secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs % 60 == 0 {
        format!("{}min", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Accepts RFC3339-like `2024-01-01T00:00:00`, `2024-01-01 00:00:00`
/// (either with optional fractional seconds), `2024-01-01 00:00`, or a bare
/// date (midnight).
pub fn parse_timestamp(text: &str) -> LopfResult<NaiveDateTime> {
    let text = text.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| LopfError::InvalidSnapshots(format!("unrecognised timestamp '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(text: &str) -> NaiveDateTime {
        parse_timestamp(text).unwrap()
    }

    #[test]
    fn test_date_range_includes_end() {
        let index = SnapshotIndex::date_range(
            ts("2024-01-01 00:00:00"),
            ts("2024-01-01 23:00:00"),
            Duration::hours(1),
        )
        .unwrap();
        assert_eq!(index.len(), 24);
        assert_eq!(index.end(), ts("2024-01-01 23:00:00"));
        assert_eq!(index.frequency(), Some(Duration::hours(1)));
    }

    #[test]
    fn test_date_range_rejects_bad_inputs() {
        let start = ts("2024-01-02");
        assert!(SnapshotIndex::date_range(start, ts("2024-01-01"), Duration::hours(1)).is_err());
        assert!(SnapshotIndex::date_range(start, start, Duration::zero()).is_err());
    }

    #[test]
    fn test_from_timestamps_requires_increasing() {
        let err = SnapshotIndex::from_timestamps(vec![ts("2024-01-01 01:00"), ts("2024-01-01")])
            .unwrap_err();
        assert!(matches!(err, LopfError::InvalidSnapshots(_)));
        assert!(SnapshotIndex::from_timestamps(vec![]).is_err());
    }

    #[test]
    fn test_irregular_index_has_no_frequency() {
        let index = SnapshotIndex::from_timestamps(vec![
            ts("2024-01-01 00:00"),
            ts("2024-01-01 01:00"),
            ts("2024-01-01 03:00"),
        ])
        .unwrap();
        assert_eq!(index.frequency(), None);
    }

    #[test]
    fn test_frequency_strings() {
        assert_eq!(parse_frequency("h").unwrap(), Duration::hours(1));
        assert_eq!(parse_frequency("3H").unwrap(), Duration::hours(3));
        assert_eq!(parse_frequency("30min").unwrap(), Duration::minutes(30));
        assert_eq!(parse_frequency("1d").unwrap(), Duration::days(1));
        assert!(parse_frequency("5 fortnights").is_err());
        assert!(parse_frequency("0h").is_err());

        for text in ["1h", "30min", "2d", "45s"] {
            assert_eq!(format_frequency(parse_frequency(text).unwrap()), text);
        }
    }

    #[test]
    fn test_oversized_spans_are_errors() {
        for text in ["9999999999999h", "9223372036854775807d"] {
            assert!(matches!(
                parse_frequency(text),
                Err(LopfError::InvalidSnapshots(_))
            ));
        }
        assert!(matches!(
            SnapshotIndex::hourly(ts("2024-01-01"), usize::MAX),
            Err(LopfError::InvalidSnapshots(_))
        ));
    }

    #[test]
    fn test_daily_means() {
        let index = SnapshotIndex::hourly(ts("2024-01-01"), 48).unwrap();
        let values: Vec<f64> = (0..48).map(|t| if t < 24 { 100.0 } else { 200.0 }).collect();
        let means = index.daily_means(&values).unwrap();
        assert_eq!(means.len(), 2);
        assert_eq!(means[0], (NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 100.0));
        assert!((means[1].1 - 200.0).abs() < 1e-12);
        assert!(index.daily_means(&values[..10]).is_err());
    }
}
