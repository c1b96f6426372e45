#![forbid(unsafe_code)]

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

use crate::jar::error::{JarError, JarResult};

/// The single instant stamped on every entry of a normalized archive.
///
/// All conversions happen in UTC; the host timezone never leaks into the
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTime {
    at: DateTime<Utc>,
}

impl ReferenceTime {
    pub fn from_unix_seconds(secs: i64) -> JarResult<Self> {
        let at = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| JarError::Timestamp(format!("out of range: {secs}")))?;
        Ok(Self { at })
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        // Sub-second precision has no place in either zip encoding.
        let at = at.with_nanosecond(0).unwrap_or(at);
        Self { at }
    }

    /// Accepts Unix seconds, RFC 3339, or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn parse(s: &str) -> JarResult<Self> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<i64>() {
            return Self::from_unix_seconds(secs);
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(at.with_timezone(&Utc)));
        }
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let midnight = day
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| JarError::Timestamp(s.to_string()))?;
            return Ok(Self::from_datetime(Utc.from_utc_datetime(&midnight)));
        }
        Err(JarError::Timestamp(format!(
            "expected unix seconds, RFC 3339 or YYYY-MM-DD, got {s:?}"
        )))
    }

    pub fn unix_seconds(&self) -> i64 {
        self.at.timestamp()
    }

    /// Value for the extended timestamp extra field, if it fits.
    pub fn extended_mtime(&self) -> Option<u32> {
        u32::try_from(self.at.timestamp()).ok()
    }

    /// DOS date/time in UTC, clamped to the representable range and
    /// rounded down to an even second.
    pub fn dos_time(&self) -> JarResult<zip::DateTime> {
        let year = self.at.year();
        let (year, month, day, hour, minute, second) = if year < 1980 {
            (1980, 1, 1, 0, 0, 0)
        } else if year > 2107 {
            (2107, 12, 31, 23, 59, 58)
        } else {
            (
                year as u16,
                self.at.month() as u8,
                self.at.day() as u8,
                self.at.hour() as u8,
                self.at.minute() as u8,
                (self.at.second() as u8) & !1,
            )
        };
        zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
            .map_err(|_| JarError::Timestamp(format!("no DOS encoding for {}", self.at)))
    }

    /// Payload of the extended timestamp field: flags (mtime only) + mtime.
    pub(crate) fn extended_field(&self) -> Option<Box<[u8]>> {
        let mtime = self.extended_mtime()?;
        let mut data = Vec::with_capacity(5);
        data.push(0x01);
        data.extend_from_slice(&mtime.to_le_bytes());
        Some(data.into_boxed_slice())
    }
}

impl std::fmt::Display for ReferenceTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.at.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl std::str::FromStr for ReferenceTime {
    type Err = JarError;

    fn from_str(s: &str) -> JarResult<Self> {
        Self::parse(s)
    }
}

pub(crate) fn render_dos(t: &zip::DateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        t.year(),
        t.month(),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}
