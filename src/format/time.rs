//! Timestamp decoding: RFC 2579 DateAndTime, NTP timestamps and
//! pattern-driven text parsing. All results are UNIX seconds.

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

/// Seconds between the NTP epoch (1900) and the UNIX epoch (1970).
pub const NTP_EPOCH_OFFSET: i64 = 2_208_988_800;

fn octets<'a>(value: &'a Value, what: &'static str) -> Result<&'a [u8]> {
    value.as_bytes().ok_or_else(|| {
        Error::NotOctetString {
            what,
            found: value.type_name(),
        }
        .boxed()
    })
}

/// Decode an RFC 2579 DateAndTime.
///
/// 8 bytes are taken as UTC. 11 bytes carry a `+`/`-` direction byte and an
/// hours/minutes offset from UTC. Deci-seconds do not affect the result.
/// Time-of-day fields past their range roll over into the next unit.
///
/// ```
/// use snmp_exporter::format::time::date_and_time;
/// use snmp_exporter::Value;
///
/// let utc = Value::from(vec![0x07, 0xE2, 8, 15, 8, 1, 15, 0]);
/// assert_eq!(date_and_time(&utc).unwrap(), 1534320075.0);
///
/// let plus_two = Value::from(vec![0x07, 0xE2, 8, 15, 8, 1, 15, 0, b'+', 2, 0]);
/// assert_eq!(date_and_time(&plus_two).unwrap(), 1534312875.0);
/// ```
pub fn date_and_time(value: &Value) -> Result<f64> {
    let v = octets(value, "DateAndTime")?;

    let offset_secs = match v.len() {
        8 => 0,
        11 => {
            let sign = match v[8] {
                b'+' => 1,
                b'-' => -1,
                other => {
                    return Err(Error::DateAndTimeRange {
                        message: format!("invalid direction from UTC {:?}", other as char).into(),
                    }
                    .boxed());
                }
            };
            let (hours, minutes) = (i64::from(v[9]), i64::from(v[10]));
            if hours > 24 || minutes > 60 {
                return Err(Error::DateAndTimeRange {
                    message: format!("invalid offset from UTC {hours:02}:{minutes:02}").into(),
                }
                .boxed());
            }
            sign * (hours * 3600 + minutes * 60)
        }
        len => return Err(Error::InvalidDateAndTime { len }.boxed()),
    };

    let year = i32::from(u16::from_be_bytes([v[0], v[1]]));
    let date = NaiveDate::from_ymd_opt(year, u32::from(v[2]), u32::from(v[3])).ok_or_else(|| {
        Error::DateAndTimeRange {
            message: format!("no such date {year}-{:02}-{:02}", v[2], v[3]).into(),
        }
        .boxed()
    })?;
    let time_of_day = TimeDelta::seconds(
        i64::from(v[4]) * 3600 + i64::from(v[5]) * 60 + i64::from(v[6]),
    );

    let local = date.and_time(chrono::NaiveTime::MIN) + time_of_day;
    Ok((local.and_utc().timestamp() - offset_secs) as f64)
}

/// Decode an 8-byte NTP timestamp (seconds and fraction since 1900, big-endian).
///
/// ```
/// use snmp_exporter::format::time::ntp_timestamp;
/// use snmp_exporter::Value;
///
/// let v = Value::from(vec![235, 6, 119, 246, 48, 209, 11, 59]);
/// assert_eq!(ntp_timestamp(&v).unwrap(), 1734080886.0);
/// ```
pub fn ntp_timestamp(value: &Value) -> Result<f64> {
    let data = octets(value, "NTPTimeStamp")?;
    let Ok(raw) = <[u8; 8]>::try_from(data) else {
        return Err(Error::InvalidNtpTimestamp { len: data.len() }.boxed());
    };
    // The fraction never reaches a whole second.
    let secs = i64::from(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]));
    Ok((secs - NTP_EPOCH_OFFSET) as f64)
}

/// Parse `text` with a strftime-style `pattern`.
///
/// Patterns with a UTC offset yield that instant; patterns without one are
/// taken as UTC. Date-only patterns yield midnight.
///
/// ```
/// use snmp_exporter::format::time::parse_with_pattern;
///
/// assert_eq!(parse_with_pattern("Apr 01 2025", "%b %d %Y").unwrap(), 1743465600.0);
/// assert!(parse_with_pattern("ABC", "%b %d %Y").is_err());
/// ```
pub fn parse_with_pattern(text: &str, pattern: &str) -> Result<f64> {
    if let Ok(t) = DateTime::parse_from_str(text, pattern) {
        return Ok(t.timestamp() as f64);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, pattern) {
        return Ok(t.and_utc().timestamp() as f64);
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, pattern) {
        return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc().timestamp() as f64);
    }
    Err(Error::DateTimePattern {
        value: text.into(),
        pattern: pattern.into(),
    }
    .boxed())
}
