use chrono::{NaiveTime, Weekday};
use std::str::FromStr;

/// The days a timetable can place a class on, in week order
pub const TEACHING_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Day-to-char mapping used by older timetable exports
const DAY_CHARS: [(Weekday, char); 7] = [
    (Weekday::Mon, 'M'),
    (Weekday::Tue, 'T'),
    (Weekday::Wed, 'W'),
    (Weekday::Thu, 'R'),
    (Weekday::Fri, 'F'),
    (Weekday::Sat, 'S'),
    (Weekday::Sun, 'U'),
];

/// Maps an ISO weekday number (Monday = 1, Sunday = 7)
fn iso_weekday(number: u32) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parses a weekday written as a full name, a three-letter name, a
/// single-letter code (`M T W R F S U`) or an ISO number.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();

    match (chars.next(), chars.next()) {
        (None, _) => None,
        (Some(c), None) if c.is_ascii_digit() => c.to_digit(10).and_then(iso_weekday),
        (Some(c), None) => {
            let c = c.to_ascii_uppercase();
            DAY_CHARS
                .iter()
                .find(|&&(_, day_char)| day_char == c)
                .map(|&(day, _)| day)
        }
        _ => Weekday::from_str(trimmed).ok(),
    }
}

/// Position of `day` inside [`TEACHING_DAYS`]; `None` for Sunday
pub fn teaching_day_index(day: Weekday) -> Option<usize> {
    match day {
        Weekday::Sun => None,
        day => Some(day.num_days_from_monday() as usize),
    }
}

/// Parses a clock time in 24-hour (`09:00`, `09:00:00`) or 12-hour
/// (`9:00 AM`, `9:00AM`) notation.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    let compact = trimmed.replace(' ', "").to_uppercase();

    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .or_else(|_| NaiveTime::parse_from_str(&compact, "%I:%M%p"))
        .ok()
}

/// Serde adapter for weekdays stored as names, letter codes or numbers
pub mod weekday_format {
    use super::parse_weekday;
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWeekday {
        Number(u32),
        Text(String),
    }

    pub fn serialize<S: Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(day)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let parsed = match RawWeekday::deserialize(deserializer)? {
            RawWeekday::Number(number) => super::iso_weekday(number),
            RawWeekday::Text(text) => parse_weekday(&text),
        };

        parsed.ok_or_else(|| D::Error::custom("unrecognised weekday"))
    }
}

/// Serde adapter for clock times, written back as `HH:MM`
pub mod clock_format {
    use super::parse_clock;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_clock(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised time `{raw}`")))
    }
}
