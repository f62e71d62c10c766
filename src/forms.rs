/// Parsed form input.
///
/// The web-delivery collaborator hands the core plain string key/value
/// pairs; `FormFields` wraps them and does the typed coercion in one
/// place so the pipelines never touch raw strings.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        FormFields::default()
    }

    /// Builder-style insert, handy for tests and the CLI.
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Get a trimmed field value. Blank fields count as missing.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.parse().ok()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key)?.parse().ok()
    }

    pub fn get_uuid(&self, key: &str) -> Option<Uuid> {
        Uuid::parse_str(self.get(key)?).ok()
    }

    /// Assemble a date from separate year/month/day fields, the way the
    /// signup form submits a birth date.
    pub fn get_date_parts(&self, year: &str, month: &str, day: &str) -> Option<NaiveDate> {
        let y: i32 = self.get(year)?.parse().ok()?;
        let m: u32 = self.get(month)?.parse().ok()?;
        let d: u32 = self.get(day)?.parse().ok()?;
        NaiveDate::from_ymd_opt(y, m, d)
    }

    /// Combine a "YYYY-MM-DD" date field and an "HH:MM" time field into a
    /// local instant. Ambiguous or nonexistent local times (DST edges)
    /// count as unparseable.
    pub fn get_datetime(&self, date_key: &str, time_key: &str) -> Option<DateTime<Local>> {
        let date = NaiveDate::parse_from_str(self.get(date_key)?, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.get(time_key)?, "%H:%M").ok()?;
        Local.from_local_datetime(&date.and_time(time)).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_missing() {
        let fields = FormFields::new().set("name", "  ").set("email", "jd@sacredheart.org");
        assert_eq!(fields.get("name"), None);
        assert_eq!(fields.get("email"), Some("jd@sacredheart.org"));
        assert!(!fields.contains("name"));
    }

    #[test]
    fn test_integer_coercion() {
        let fields = FormFields::new().set("duration", "1800").set("bad", "30m");
        assert_eq!(fields.get_i64("duration"), Some(1800));
        assert_eq!(fields.get_i64("bad"), None);
    }

    #[test]
    fn test_date_from_parts() {
        let fields = FormFields::new()
            .set("birth_year", "1991")
            .set("birth_month", "3")
            .set("birth_day", "29");
        assert_eq!(
            fields.get_date_parts("birth_year", "birth_month", "birth_day"),
            NaiveDate::from_ymd_opt(1991, 3, 29)
        );

        let bad = FormFields::new()
            .set("birth_year", "1991")
            .set("birth_month", "13")
            .set("birth_day", "29");
        assert_eq!(bad.get_date_parts("birth_year", "birth_month", "birth_day"), None);
    }

    #[test]
    fn test_datetime_parsing() {
        let fields = FormFields::new().set("date", "2026-09-14").set("time", "09:30");
        let parsed = fields.get_datetime("date", "time").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2026-09-14 09:30");

        let bad = FormFields::new().set("date", "next tuesday").set("time", "09:30");
        assert_eq!(bad.get_datetime("date", "time"), None);
    }
}
