use super::classify::{is_date, is_datetime};
use super::document::Clause;
use super::error::PeriodParseError;
use crate::clock::Clock;
use crate::config::DateFields;
use crate::query::RawQuery;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::json;
use std::str::FromStr;
use std::sync::LazyLock;

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([dwmy])$").expect("valid period regex"));

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const PERIOD_KEY: &str = "period";
pub const START_KEYS: [&str; 2] = ["start_at", "date_start"];
pub const END_KEYS: [&str; 2] = ["end_at", "date_end"];
const TODAY: &str = "today";

/// Every query key the date resolver may consume.
pub const DATE_KEYS: [&str; 5] = ["period", "start_at", "end_at", "date_start", "date_end"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A `<n><d|w|m|y>` duration such as `7d` or `1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub amount: u32,
    pub unit: PeriodUnit,
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = PERIOD_RE
            .captures(s)
            .ok_or_else(|| PeriodParseError::Malformed(s.to_string()))?;

        let amount: u32 = captures[1]
            .parse()
            .map_err(|_| PeriodParseError::Overflow(s.to_string()))?;
        let unit = match &captures[2] {
            "d" => PeriodUnit::Day,
            "w" => PeriodUnit::Week,
            "m" => PeriodUnit::Month,
            _ => PeriodUnit::Year,
        };

        Ok(Period { amount, unit })
    }
}

impl Period {
    /// `date` moved forward by this period; `None` if the result is out of range.
    pub fn add_to(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.shift(date, 1)
    }

    /// `date` moved back by this period; `None` if the result is out of range.
    pub fn subtract_from(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.shift(date, -1)
    }

    fn shift(&self, date: NaiveDate, sign: i64) -> Option<NaiveDate> {
        let amount = i64::from(self.amount);
        match self.unit {
            PeriodUnit::Day => shift_days(date, amount * sign),
            PeriodUnit::Week => shift_days(date, amount * 7 * sign),
            PeriodUnit::Month => shift_months(date, amount * sign),
            PeriodUnit::Year => shift_months(date, amount * 12 * sign),
        }
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

/// Calendar month shift keeping the day of month; days past the end of the
/// target month roll over into the next one (Mar 31 - 1m = Mar 3).
fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month0 = u32::try_from(total.rem_euclid(12)).ok()?;
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
    first.checked_add_days(Days::new(u64::from(date.day0())))
}

pub fn start_of_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00").to_string()
}

pub fn end_of_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT23:59:59").to_string()
}

/// Start of day for a `YYYY-MM-DD` string without calendar validation.
pub(crate) fn start_of_day_str(date: &str) -> String {
    format!("{}T00:00:00", date)
}

/// A range bound taken from `start_at`/`end_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Bound {
    fn parse(value: &str, today: NaiveDate) -> Option<Self> {
        if value == TODAY {
            return Some(Bound::Date(today));
        }
        if is_date(value) {
            return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(Bound::Date);
        }
        if is_datetime(value) {
            return NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
                .ok()
                .map(Bound::DateTime);
        }
        None
    }

    fn date(&self) -> NaiveDate {
        match self {
            Bound::Date(date) => *date,
            Bound::DateTime(datetime) => datetime.date(),
        }
    }

    fn as_start(&self) -> String {
        match self {
            Bound::Date(date) => start_of_day(*date),
            Bound::DateTime(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
        }
    }

    fn as_end(&self) -> String {
        match self {
            Bound::Date(date) => end_of_day(*date),
            Bound::DateTime(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
        }
    }
}

/// Output of [`resolve_date_range`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateRange {
    /// Either empty or `[end clause, start clause]`.
    pub clauses: Vec<Clause>,
    /// Query keys that took part in the range and must not be filtered on.
    pub consumed: Vec<&'static str>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Resolve `period`, `start_at`/`end_at` (or `date_start`/`date_end`) into an
/// `[end, start)` pair of clauses on the configured date fields.
///
/// Never fails: an invalid period or an unparseable bound inside a period
/// expression is anchored to today. Without a period, a bound that is not a
/// date, date-time or `today` is left unconsumed so it can be filtered on as a
/// plain value.
pub fn resolve_date_range(query: &RawQuery, fields: &DateFields, clock: &dyn Clock) -> DateRange {
    let today = clock.today();
    let start = first_bound(query, &START_KEYS);
    let end = first_bound(query, &END_KEYS);

    let Some(period_value) = query.get(PERIOD_KEY) else {
        return resolve_open_range(query, fields, today, start, end);
    };

    let period = period_value.first().and_then(|raw| match raw.parse::<Period>() {
        Ok(period) => Some(period),
        Err(e) => {
            tracing::debug!(error = %e, "anchoring period range to today");
            None
        }
    });

    let (lt, gte) = if let Some(raw) = start {
        let bound = parse_or_today(raw, today);
        let end_date = period.and_then(|p| p.add_to(bound.date())).unwrap_or(today);
        (end_of_day(end_date), bound.as_start())
    } else if let Some(raw) = end {
        let bound = parse_or_today(raw, today);
        let start_date = period
            .and_then(|p| p.subtract_from(bound.date()))
            .unwrap_or(today);
        (bound.as_end(), start_of_day(start_date))
    } else {
        let start_date = period.and_then(|p| p.subtract_from(today)).unwrap_or(today);
        (end_of_day(today), start_of_day(start_date))
    };

    let consumed = DATE_KEYS
        .into_iter()
        .filter(|key| query.contains_key(key))
        .collect();

    DateRange {
        clauses: range_clauses(fields, lt, gte),
        consumed,
    }
}

fn resolve_open_range(
    query: &RawQuery,
    fields: &DateFields,
    today: NaiveDate,
    start: Option<&str>,
    end: Option<&str>,
) -> DateRange {
    let consumed: Vec<&'static str> = START_KEYS
        .into_iter()
        .chain(END_KEYS)
        .filter(|key| {
            query
                .get(key)
                .and_then(|value| value.first())
                .is_some_and(is_recognized)
        })
        .collect();

    let Some(start) = start.filter(|value| is_recognized(value)) else {
        return DateRange {
            clauses: Vec::new(),
            consumed,
        };
    };

    let gte = if start == TODAY {
        start_of_day(today)
    } else {
        render_plain(start)
    };
    let lt = match end.filter(|value| is_recognized(value)) {
        Some(TODAY) | None => end_of_day(today),
        Some(value) => render_plain(value),
    };

    DateRange {
        clauses: range_clauses(fields, lt, gte),
        consumed,
    }
}

fn range_clauses(fields: &DateFields, lt: String, gte: String) -> Vec<Clause> {
    vec![
        Clause::new(fields.end_at.clone(), json!({ "$lt": lt })),
        Clause::new(fields.start_at.clone(), json!({ "$gte": gte })),
    ]
}

/// First recognized bound among `keys`, canonical name first. Falls back to
/// the first present value so a period range can still anchor it to today.
fn first_bound<'a>(query: &'a RawQuery, keys: &[&str]) -> Option<&'a str> {
    let mut values = keys
        .iter()
        .filter_map(|key| query.get(key).and_then(|value| value.first()));
    let first = values.clone().next();
    values.find(|value| is_recognized(value)).or(first)
}

fn parse_or_today(raw: &str, today: NaiveDate) -> Bound {
    Bound::parse(raw, today).unwrap_or_else(|| {
        tracing::debug!(value = raw, "unparseable date bound, anchoring to today");
        Bound::Date(today)
    })
}

fn is_recognized(value: &str) -> bool {
    value == TODAY || is_date(value) || is_datetime(value)
}

fn render_plain(value: &str) -> String {
    if is_date(value) {
        start_of_day_str(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use serde_json::Value;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at_date(date(2019, 2, 10))
    }

    fn resolve(query: &str) -> Vec<Value> {
        let query = RawQuery::parse(query);
        resolve_date_range(&query, &DateFields::default(), &clock())
            .clauses
            .into_iter()
            .map(Value::from)
            .collect()
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!(
            "2d".parse::<Period>(),
            Ok(Period {
                amount: 2,
                unit: PeriodUnit::Day
            })
        );
        assert_eq!("1y".parse::<Period>().unwrap().unit, PeriodUnit::Year);
        assert!(matches!("12".parse::<Period>(), Err(PeriodParseError::Malformed(_))));
        assert!(matches!("-1d".parse::<Period>(), Err(PeriodParseError::Malformed(_))));
        assert!(matches!("1D".parse::<Period>(), Err(PeriodParseError::Malformed(_))));
        assert!(matches!(
            "99999999999d".parse::<Period>(),
            Err(PeriodParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_period_arithmetic() {
        let anchor = date(2019, 1, 24);
        let period = |s: &str| s.parse::<Period>().unwrap();
        assert_eq!(period("2d").add_to(anchor), Some(date(2019, 1, 26)));
        assert_eq!(period("1w").subtract_from(anchor), Some(date(2019, 1, 17)));
        assert_eq!(period("1m").add_to(anchor), Some(date(2019, 2, 24)));
        assert_eq!(period("1m").subtract_from(anchor), Some(date(2018, 12, 24)));
        assert_eq!(period("1y").add_to(date(2018, 2, 24)), Some(date(2019, 2, 24)));
        assert_eq!(period("0d").add_to(anchor), Some(anchor));
    }

    #[test]
    fn test_month_overflow_rolls_over() {
        let period: Period = "1m".parse().unwrap();
        assert_eq!(period.subtract_from(date(2019, 3, 31)), Some(date(2019, 3, 3)));
        assert_eq!(period.add_to(date(2019, 1, 31)), Some(date(2019, 3, 3)));
        let year: Period = "1y".parse().unwrap();
        assert_eq!(year.add_to(date(2020, 2, 29)), Some(date(2021, 3, 1)));
    }

    #[test]
    fn test_period_out_of_range_is_none() {
        let period: Period = "4000000000d".parse().unwrap();
        assert_eq!(period.add_to(date(2019, 1, 1)), None);
    }

    #[test]
    fn test_period_with_start() {
        assert_eq!(
            resolve("period=2d&start_at=2019-01-24"),
            vec![
                json!({"created_at": {"$lt": "2019-01-26T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-01-24T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_period_with_start_datetime_keeps_precision() {
        assert_eq!(
            resolve("period=1w&start_at=2019-01-19T08:30:00"),
            vec![
                json!({"created_at": {"$lt": "2019-01-26T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-01-19T08:30:00"}}),
            ]
        );
    }

    #[test]
    fn test_period_with_end() {
        assert_eq!(
            resolve("period=2d&end_at=2019-01-26T00:00:00"),
            vec![
                json!({"created_at": {"$lt": "2019-01-26T00:00:00"}}),
                json!({"created_at": {"$gte": "2019-01-24T00:00:00"}}),
            ]
        );
        assert_eq!(
            resolve("period=1m&end_at=2019-01-24"),
            vec![
                json!({"created_at": {"$lt": "2019-01-24T23:59:59"}}),
                json!({"created_at": {"$gte": "2018-12-24T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_period_anchored_to_today() {
        assert_eq!(
            resolve("period=1w"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-03T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_invalid_period_collapses_to_today() {
        assert_eq!(
            resolve("period=12"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-10T00:00:00"}}),
            ]
        );
        assert_eq!(
            resolve("period=12&start_at=2018-12-05T00:00:01"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2018-12-05T00:00:01"}}),
            ]
        );
    }

    #[test]
    fn test_unparseable_bound_in_period_is_today() {
        assert_eq!(
            resolve("period=1d&start_at=yesterday"),
            vec![
                json!({"created_at": {"$lt": "2019-02-11T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-10T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_start_without_period() {
        assert_eq!(
            resolve("start_at=2018-12-05T00:00:01"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2018-12-05T00:00:01"}}),
            ]
        );
        assert_eq!(
            resolve("start_at=2018-12-01&end_at=2018-12-11"),
            vec![
                json!({"created_at": {"$lt": "2018-12-11T00:00:00"}}),
                json!({"created_at": {"$gte": "2018-12-01T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_today_bounds() {
        assert_eq!(
            resolve("start_at=today"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-10T00:00:00"}}),
            ]
        );
        assert_eq!(
            resolve("start_at=2019-02-05&end_at=today"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-05T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_legacy_aliases() {
        assert_eq!(
            resolve("date_start=2018-12-01&date_end=2018-12-11T03:02:01"),
            vec![
                json!({"created_at": {"$lt": "2018-12-11T03:02:01"}}),
                json!({"created_at": {"$gte": "2018-12-01T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        assert_eq!(
            resolve("start_at=2018-12-01&date_start=2017-01-01&end_at=2018-12-02")[1],
            json!({"created_at": {"$gte": "2018-12-01T00:00:00"}})
        );
    }

    #[test]
    fn test_custom_fields() {
        let query = RawQuery::parse("period=1d&start_at=2019-01-01");
        let fields = DateFields::new("begin", "finish");
        let range = resolve_date_range(&query, &fields, &clock());
        assert_eq!(range.clauses[0].field, "finish");
        assert_eq!(range.clauses[1].field, "begin");
    }

    #[test]
    fn test_no_date_keys() {
        let query = RawQuery::parse("name=lucas");
        let range = resolve_date_range(&query, &DateFields::default(), &clock());
        assert!(range.is_empty());
        assert!(range.consumed.is_empty());
    }

    #[test]
    fn test_end_alone_is_consumed_without_clauses() {
        let query = RawQuery::parse("end_at=2019-01-01");
        let range = resolve_date_range(&query, &DateFields::default(), &clock());
        assert!(range.is_empty());
        assert_eq!(range.consumed, vec!["end_at"]);
    }

    #[test]
    fn test_unrecognized_bound_without_period_is_not_consumed() {
        let query = RawQuery::parse("start_at=soon");
        let range = resolve_date_range(&query, &DateFields::default(), &clock());
        assert!(range.is_empty());
        assert!(range.consumed.is_empty());
    }

    #[test]
    fn test_period_consumes_every_date_key() {
        let query = RawQuery::parse("period=bad&start_at=soon&date_end=later");
        let range = resolve_date_range(&query, &DateFields::default(), &clock());
        assert_eq!(range.consumed, vec!["period", "start_at", "date_end"]);
    }

    #[test]
    fn test_alias_used_when_canonical_bound_is_unrecognized() {
        let query = RawQuery::parse("start_at=soon&date_start=2019-01-01");
        let range = resolve_date_range(&query, &DateFields::default(), &clock());
        assert_eq!(range.consumed, vec!["date_start"]);
        assert_eq!(
            range.clauses.into_iter().map(Value::from).collect::<Vec<_>>(),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-01-01T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_invalid_period_with_end_starts_today() {
        assert_eq!(
            resolve("period=12&end_at=2019-03-01"),
            vec![
                json!({"created_at": {"$lt": "2019-03-01T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-02-10T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_period_with_legacy_end() {
        assert_eq!(
            resolve("period=1m&date_end=2019-01-24"),
            vec![
                json!({"created_at": {"$lt": "2019-01-24T23:59:59"}}),
                json!({"created_at": {"$gte": "2018-12-24T00:00:00"}}),
            ]
        );
    }

    #[test]
    fn test_repeated_date_key_uses_first_value() {
        assert_eq!(
            resolve("start_at=2019-01-01&start_at=2019-01-05"),
            vec![
                json!({"created_at": {"$lt": "2019-02-10T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-01-01T00:00:00"}}),
            ]
        );
        assert_eq!(
            resolve("period=2d&start_at=2019-01-01&start_at=2019-01-05"),
            vec![
                json!({"created_at": {"$lt": "2019-01-03T23:59:59"}}),
                json!({"created_at": {"$gte": "2019-01-01T00:00:00"}}),
            ]
        );
    }
}
