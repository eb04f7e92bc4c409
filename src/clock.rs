use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Time source for stored timestamps and aggregation windows.
///
/// Injected rather than read ambiently so window boundaries are testable.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

pub fn to_rfc3339(moment: OffsetDateTime) -> String {
    moment
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

/// `YYYY-MM-DD` key for a calendar day. Matches the date component of stored
/// RFC3339 UTC timestamps, so the two compare directly as strings.
pub fn date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
pub struct FixedClock(pub OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

#[cfg(test)]
pub fn parse_rfc3339(raw: &str) -> OffsetDateTime {
    OffsetDateTime::parse(raw, &Rfc3339).expect("test timestamp should be RFC3339")
}

#[cfg(test)]
mod tests {
    use super::{date_key, parse_rfc3339, to_rfc3339};

    #[test]
    fn date_key_matches_rfc3339_prefix() {
        let moment = parse_rfc3339("2026-03-05T23:59:59Z");
        assert_eq!(date_key(moment.date()), "2026-03-05");
        assert!(to_rfc3339(moment).starts_with("2026-03-05"));
    }
}
