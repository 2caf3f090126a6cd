use crate::error::{AgendaError, AgendaResult};
use time::{
    Date, Month, OffsetDateTime, PrimitiveDateTime, Time,
    format_description::BorrowedFormatItem, macros::format_description,
};

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
pub const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

macro_rules! text_serde {
    ($name:ident, $ty:ty, $format:expr, $error:expr) => {
        pub mod $name {
            use serde::{Deserialize, Deserializer, Serializer, de::Error};

            pub fn serialize<S: Serializer>(value: &$ty, serializer: S) -> Result<S::Ok, S::Error> {
                let text = value
                    .format($format)
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                serializer.serialize_str(&text)
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$ty, D::Error> {
                let text = String::deserialize(deserializer)?;
                <$ty>::parse(&text, $format).map_err(|_| D::Error::custom(($error)(text)))
            }
        }
    };
}

text_serde!(iso_date, time::Date, super::DATE_FORMAT, crate::error::AgendaError::InvalidDate);
text_serde!(clock_time, time::Time, super::TIME_FORMAT, crate::error::AgendaError::InvalidTime);
text_serde!(
    local_datetime,
    time::PrimitiveDateTime,
    super::DATETIME_FORMAT,
    crate::error::AgendaError::InvalidDate
);

pub fn parse_date(input: &str) -> AgendaResult<Date> {
    Date::parse(input.trim(), DATE_FORMAT).map_err(|_| AgendaError::InvalidDate(input.to_string()))
}

pub fn parse_time(input: &str) -> AgendaResult<Time> {
    Time::parse(input.trim(), TIME_FORMAT).map_err(|_| AgendaError::InvalidTime(input.to_string()))
}

/// Parses `YYYY-MM` into a year and month.
pub fn parse_month(input: &str) -> AgendaResult<(i32, Month)> {
    let invalid = || AgendaError::InvalidDate(input.to_string());

    let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;

    Ok((year, Month::try_from(month).map_err(|_| invalid())?))
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn format_time(time: Time) -> String {
    time.format(TIME_FORMAT).unwrap_or_else(|_| time.to_string())
}

pub fn format_datetime(at: PrimitiveDateTime) -> String {
    at.format(DATETIME_FORMAT).unwrap_or_else(|_| at.to_string())
}

/// Current wall-clock time in the local offset.
///
/// Falls back to UTC when the local offset cannot be determined.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|error| {
        tracing::debug!("Local offset unavailable ({error}), using UTC");
        OffsetDateTime::now_utc()
    });

    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn parses_iso_dates_and_clock_times() {
        assert_eq!(parse_date("2024-03-01").unwrap(), date!(2024 - 03 - 01));
        assert_eq!(parse_time("09:00").unwrap(), time!(09:00));
        assert_eq!(parse_time("23:59").unwrap(), time!(23:59));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse_date("2024-13-01"), Err(AgendaError::InvalidDate(_))));
        assert!(matches!(parse_date("01/03/2024"), Err(AgendaError::InvalidDate(_))));
        assert!(matches!(parse_time("24:00"), Err(AgendaError::InvalidTime(_))));
        assert!(matches!(parse_time("9h"), Err(AgendaError::InvalidTime(_))));
    }

    #[test]
    fn formats_zero_padded() {
        assert_eq!(format_date(date!(2024 - 03 - 01)), "2024-03-01");
        assert_eq!(format_time(time!(07:05)), "07:05");
        assert_eq!(format_datetime(datetime!(2024-03-01 08:55)), "2024-03-01T08:55");
    }

    #[test]
    fn parses_months() {
        assert_eq!(parse_month("2024-03").unwrap(), (2024, Month::March));
        assert!(parse_month("2024-00").is_err());
        assert!(parse_month("march").is_err());
    }
}
