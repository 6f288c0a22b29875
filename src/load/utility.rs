use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

/// Width of the time buckets every signal is aligned on. Matches the weather cadence.
pub const BUCKET_HOURS: u32 = 3;

/// Linear interpolation of `x` from `domain` onto `range`, clamped at the domain edges.
///
/// The range may be descending (e.g. `(1.0, 0.0)`).
pub fn interp_clamped(x: f64, domain: (f64, f64), range: (f64, f64)) -> f64 {
    let (x0, x1) = domain;
    let (y0, y1) = range;
    if x <= x0 {
        return y0;
    }
    if x >= x1 {
        return y1;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Rounds to the nearest integer, ties to even (2.5 -> 2, 3.5 -> 4).
pub fn round_half_even(x: f64) -> f64 {
    x.round_ties_even()
}

/// Start of the 3-hour bucket containing `t`, anchored at the UTC day boundary.
pub fn bucket_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let day = t.date_naive().and_time(NaiveTime::MIN).and_utc();
    let hour = t.hour() - t.hour() % BUCKET_HOURS;
    day + Duration::hours(hour as i64)
}

/// Every bucket start from `first` to `last` inclusive.
pub fn bucket_range(first: DateTime<Utc>, last: DateTime<Utc>) -> impl Iterator<Item = DateTime<Utc>> {
    let step = Duration::hours(BUCKET_HOURS as i64);
    std::iter::successors(Some(first), move |t| Some(*t + step)).take_while(move |t| *t <= last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interp_inside_domain() {
        assert_eq!(interp_clamped(6.0, (0.0, 12.0), (1.0, 0.0)), 0.5);
        assert_eq!(interp_clamped(5.0, (-5.0, 15.0), (0.0, 1.0)), 0.5);
    }

    #[test]
    fn test_interp_clamps_outside_domain() {
        assert_eq!(interp_clamped(-3.0, (0.0, 12.0), (1.0, 0.0)), 1.0);
        assert_eq!(interp_clamped(40.0, (0.0, 12.0), (1.0, 0.0)), 0.0);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(1.652), 2.0);
        assert_eq!(round_half_even(3.304), 3.0);
        assert_eq!(round_half_even(2.5), 2.0);
        assert_eq!(round_half_even(3.5), 4.0);
    }

    #[test]
    fn test_bucket_start() {
        let t = Utc.with_ymd_and_hms(2024, 4, 8, 17, 45, 12).unwrap();
        assert_eq!(bucket_start(t), Utc.with_ymd_and_hms(2024, 4, 8, 15, 0, 0).unwrap());

        let midnight = Utc.with_ymd_and_hms(2024, 4, 8, 0, 0, 0).unwrap();
        assert_eq!(bucket_start(midnight), midnight);
    }

    #[test]
    fn test_bucket_range_inclusive() {
        let first = Utc.with_ymd_and_hms(2024, 4, 8, 21, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 4, 9, 3, 0, 0).unwrap();
        let hours: Vec<_> = bucket_range(first, last).map(|t| t.hour()).collect();
        assert_eq!(hours, vec![21, 0, 3]);
    }
}
