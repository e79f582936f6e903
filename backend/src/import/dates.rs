use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Four-digit-year layouts, tried in order. Month-first wins over day-first
/// when both would parse.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
];

const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%d/%m/%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a spreadsheet date cell into a calendar date.
///
/// Date-times keep the day as written in the cell; an offset never moves the
/// date to a neighbouring day. Returns `None` for anything unrecognised.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if is_short_year(value) {
        return SHORT_YEAR_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok());
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })?;

    // `%Y` happily reads "24" as the year 24.
    (date.year() >= 1000).then_some(date)
}

/// `M/D/YY`: three numeric slash-separated parts, the first and last ones at
/// most two digits. `YYYY/MM/DD` never matches.
fn is_short_year(value: &str) -> bool {
    let parts: Vec<&str> = value.split('/').collect();
    parts.len() == 3
        && parts[0].len() <= 2
        && parts[2].len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
