//! Wall-clock time for the desk, which always runs on Mexico City time.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::Mexico_City;
use chrono_tz::Tz;

/// The current time in Mexico City.
pub fn now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Mexico_City)
}

/// The calendar date that folios are issued against.
pub fn folio_date(t: &DateTime<Tz>) -> NaiveDate {
    t.date_naive()
}

/// The timestamp written in the ledger, e.g. `2025-06-01 14:03:59`.
pub fn ledger_timestamp(t: &DateTime<Tz>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The prefix that keeps uploaded receipt names unique, e.g. `20250601_140359`.
pub fn upload_stamp(t: &DateTime<Tz>) -> String {
    t.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats() {
        let t = Mexico_City
            .with_ymd_and_hms(2025, 6, 1, 14, 3, 59)
            .single()
            .unwrap();
        assert_eq!(ledger_timestamp(&t), "2025-06-01 14:03:59");
        assert_eq!(upload_stamp(&t), "20250601_140359");
        assert_eq!(folio_date(&t), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn test_folio_date_is_mexico_city_date() {
        // 03:00 UTC on June 2nd is still June 1st in Mexico City.
        let utc = Utc.with_ymd_and_hms(2025, 6, 2, 3, 0, 0).single().unwrap();
        let local = utc.with_timezone(&Mexico_City);
        assert_eq!(
            folio_date(&local),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
    }
}
