use crate::days::{TEACHING_DAYS, teaching_day_index};
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Weekday};

/// Number of teaching days materialized per week (Monday through Saturday)
pub const WEEK_LENGTH: usize = TEACHING_DAYS.len();

/// Returns Monday through Saturday of the week containing `now`.
///
/// The week is taken from the local calendar date of `now` in its own time
/// zone, so two instants on the same local day always land in the same week.
/// Sunday belongs to the week that started six days earlier. `None` when part
/// of that week lies outside the representable calendar.
pub fn week_dates<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<[NaiveDate; WEEK_LENGTH]> {
    week_dates_for(now.date_naive())
}

/// Same as [`week_dates`] for a plain calendar date
pub fn week_dates_for(date: NaiveDate) -> Option<[NaiveDate; WEEK_LENGTH]> {
    // Sunday counts as the last day of the week
    let monday_offset = (date.weekday().num_days_from_sunday() + 6) % 7;
    let monday = date.checked_sub_days(Days::new(u64::from(monday_offset)))?;

    let mut week = [monday; WEEK_LENGTH];
    for (offset, day) in week.iter_mut().enumerate() {
        *day = monday.checked_add_days(Days::new(offset as u64))?;
    }
    Some(week)
}

/// The date `day` falls on within `week`, if it is a teaching day
pub fn date_in_week(week: &[NaiveDate; WEEK_LENGTH], day: Weekday) -> Option<NaiveDate> {
    teaching_day_index(day).map(|index| week[index])
}

#[cfg(test)]
mod test {
    use crate::week::{WEEK_LENGTH, date_in_week, week_dates, week_dates_for};
    use chrono::{Datelike, FixedOffset, NaiveDate, TimeZone, Utc, Weekday};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_wednesday_maps_to_its_week() {
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 10, 0, 0).unwrap();
        let expected: Vec<NaiveDate> = (13..=18).map(|day| date(2024, 5, day)).collect();

        assert_eq!(week_dates(&now).unwrap().to_vec(), expected);
    }

    #[test]
    fn test_week_is_six_consecutive_days_from_monday() {
        let mut day = date(2023, 12, 20);

        // Covers a year boundary and a leap day
        while day < date(2024, 3, 10) {
            let week = week_dates_for(day).unwrap();

            assert_eq!(week.len(), WEEK_LENGTH);
            assert_eq!(week[0].weekday(), Weekday::Mon);
            for pair in week.windows(2) {
                assert_eq!(pair[0].succ_opt(), Some(pair[1]));
            }

            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_sunday_belongs_to_previous_monday() {
        let week = week_dates_for(date(2024, 5, 19)).unwrap();
        assert_eq!(week[0], date(2024, 5, 13));
        assert_eq!(week[5], date(2024, 5, 18));
    }

    #[test]
    fn test_monday_and_saturday_boundaries() {
        assert_eq!(week_dates_for(date(2024, 5, 13)).unwrap()[0], date(2024, 5, 13));
        assert_eq!(week_dates_for(date(2024, 5, 18)).unwrap()[0], date(2024, 5, 13));
        assert_eq!(week_dates_for(date(2024, 12, 31)).unwrap()[0], date(2024, 12, 30));
    }

    #[test]
    fn test_local_calendar_date_decides_the_week() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        // 20:00 UTC on Sunday is already Monday 01:30 in UTC+05:30
        let instant = Utc.with_ymd_and_hms(2024, 5, 19, 20, 0, 0).unwrap();
        let local = instant.with_timezone(&ist);

        assert_eq!(week_dates(&instant).unwrap()[0], date(2024, 5, 13));
        assert_eq!(week_dates(&local).unwrap()[0], date(2024, 5, 20));
    }

    #[test]
    fn test_calendar_edges_do_not_panic() {
        let last = NaiveDate::MAX.and_hms_opt(23, 59, 59).unwrap().and_utc();
        // Saturday or Sunday: the whole week up to Saturday still fits
        let week_fits = NaiveDate::MAX.weekday().num_days_from_monday() >= 5;

        assert_eq!(week_dates(&last).is_some(), week_fits);
        assert_eq!(week_dates_for(NaiveDate::MAX).is_some(), week_fits);
        assert_eq!(
            week_dates_for(NaiveDate::MIN).is_some(),
            NaiveDate::MIN.weekday() == Weekday::Mon
        );
    }

    #[test]
    fn test_date_in_week() {
        let week = week_dates_for(date(2024, 5, 15)).unwrap();

        assert_eq!(date_in_week(&week, Weekday::Fri), Some(date(2024, 5, 17)));
        assert_eq!(date_in_week(&week, Weekday::Sun), None);
    }
}
