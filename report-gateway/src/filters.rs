//! Query parameter parsing and filter criteria.

use crate::errors::ReportError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::Deserialize;

/// How a range filter behaves when only one of its bounds is supplied.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    /// A range only applies when both bounds are present; a lone bound is
    /// ignored. This is how the reporting endpoints have always behaved.
    #[default]
    BothBounds,
    /// Any supplied bound applies, giving a one-sided range.
    OpenEnded,
}

/// Inclusive bounds; a missing side is unbounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<T> {
    pub lower: Option<T>,
    pub upper: Option<T>,
}

impl<T: PartialOrd> Bounds<T> {
    pub fn contains(&self, value: &T) -> bool {
        self.lower.as_ref().is_none_or(|lower| value >= lower)
            && self.upper.as_ref().is_none_or(|upper| value <= upper)
    }

    /// Like [`Bounds::contains`], treating a missing value as outside.
    pub fn contains_opt(&self, value: Option<&T>) -> bool {
        value.is_some_and(|v| self.contains(v))
    }
}

pub type IdRange = Bounds<i64>;
pub type DateRange = Bounds<NaiveDateTime>;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses the date formats callers send. A bare date means the start of
/// that day.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    parse_with_default_time(value, NaiveTime::MIN)
}

/// Like [`parse_datetime`] for an upper bound: a bare date covers the whole
/// day, up to `23:59:59`.
pub fn parse_datetime_end(value: &str) -> Option<NaiveDateTime> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
    parse_with_default_time(value, end_of_day)
}

fn parse_with_default_time(value: &str, time: NaiveTime) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(time))
        })
}

/// Query parameters of one report request.
///
/// Empty values count as absent. When a name repeats, the first value wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportParams {
    values: IndexMap<String, String>,
}

impl ReportParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut values = IndexMap::new();
        if let Some(query) = query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                values.entry(name.into_owned()).or_insert(value.into_owned());
            }
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, ReportError> {
        self.get(name).map(|v| parse_int(name, v)).transpose()
    }

    pub fn id_range(
        &self,
        lower: &str,
        upper: &str,
        policy: RangePolicy,
    ) -> Result<Option<IdRange>, ReportError> {
        self.range(lower, upper, policy, parse_int, parse_int)
    }

    pub fn date_range(
        &self,
        lower: &str,
        upper: &str,
        policy: RangePolicy,
    ) -> Result<Option<DateRange>, ReportError> {
        self.range(
            lower,
            upper,
            policy,
            |name, value| parse_date(name, value, parse_datetime),
            |name, value| parse_date(name, value, parse_datetime_end),
        )
    }

    /// Parses a bound pair. Values are only parsed once the policy has
    /// decided the range applies, so an ignored lone bound is never an error.
    fn range<T>(
        &self,
        lower: &str,
        upper: &str,
        policy: RangePolicy,
        parse_lower: impl Fn(&str, &str) -> Result<T, ReportError>,
        parse_upper: impl Fn(&str, &str) -> Result<T, ReportError>,
    ) -> Result<Option<Bounds<T>>, ReportError> {
        let (lo, hi) = (self.get(lower), self.get(upper));
        let active = match policy {
            RangePolicy::BothBounds => lo.is_some() && hi.is_some(),
            RangePolicy::OpenEnded => lo.is_some() || hi.is_some(),
        };
        if !active {
            return Ok(None);
        }

        Ok(Some(Bounds {
            lower: lo.map(|v| parse_lower(lower, v)).transpose()?,
            upper: hi.map(|v| parse_upper(upper, v)).transpose()?,
        }))
    }

    /// The subset of `names` that are present, in `names` order, as sent to
    /// the remote instance.
    pub fn forwarded(&self, names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .filter_map(|name| self.get(name).map(|v| (name.to_string(), v.to_string())))
            .collect()
    }
}

fn parse_date(
    name: &str,
    value: &str,
    parse: fn(&str) -> Option<NaiveDateTime>,
) -> Result<NaiveDateTime, ReportError> {
    parse(value).ok_or_else(|| {
        ReportError::InternalFailure(format!("invalid date for {name}: {value:?}"))
    })
}

fn parse_int(name: &str, value: &str) -> Result<i64, ReportError> {
    value
        .trim()
        .parse()
        .map_err(|_| ReportError::InternalFailure(format!("invalid integer for {name}: {value:?}")))
}
