use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a period bound given either as `YYYY-MM` or `YYYY-MM-DD`.
pub fn parse_period_bound(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), DATE_FORMAT))
        .ok()
}

fn parse_optional_date<E: serde::de::Error>(raw: Option<String>) -> Result<Option<NaiveDate>, E> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|err| E::custom(format!("invalid date `{value}`, expected YYYY-MM-DD: {err}"))),
    }
}

/// `null`, `""` and a missing field all mean "no date".
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    parse_optional_date(raw)
}

/// Patch semantics: a missing field is `None` (keep), `null` or `""` is
/// `Some(None)` (clear), a date is `Some(Some(date))`.
///
/// Must be combined with `#[serde(default)]`.
pub fn deserialize_patch_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    parse_optional_date(raw).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn period_bound_accepts_month_and_day_forms() {
        assert_eq!(parse_period_bound("2025-07"), Some(date(2025, 7, 1)));
        assert_eq!(parse_period_bound("2025-07-19"), Some(date(2025, 7, 19)));
        assert_eq!(parse_period_bound(" 2025-07 "), Some(date(2025, 7, 1)));
    }

    #[test]
    fn period_bound_rejects_garbage() {
        for raw in ["", "2025", "07-2025", "2025-13", "2025-02-30", "yesterday"] {
            assert_eq!(parse_period_bound(raw), None, "expected `{raw}` to be rejected");
        }
    }
}
