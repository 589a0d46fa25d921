use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// A raw filter value that could not be coerced into its filter's type.
///
/// Raised while mapping request parameters onto typed search parameters,
/// before any query is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value '{value}' for filter '{filter}': {reason}")]
pub struct InvalidFilterValue {
    pub filter: String,
    pub value: String,
    pub reason: String,
}

impl InvalidFilterValue {
    pub fn new(filter: impl Into<String>, value: impl Into<String>, reason: impl Display) -> Self {
        Self {
            filter: filter.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}

/// Parse an optional raw parameter with `T::from_str`.
///
/// `None` stays `None` (the filter is absent); a present value that fails to
/// parse becomes `InvalidFilterValue` naming the filter.
pub fn parse_filter<T>(filter: &str, raw: Option<&str>) -> Result<Option<T>, InvalidFilterValue>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| InvalidFilterValue::new(filter, value, e))
    })
    .transpose()
}

/// Like `parse_filter`, for values without a `FromStr` impl of the right shape
pub fn parse_filter_with<T, E, F>(
    filter: &str,
    raw: Option<&str>,
    parse: F,
) -> Result<Option<T>, InvalidFilterValue>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: Display,
{
    raw.map(|value| parse(value).map_err(|e| InvalidFilterValue::new(filter, value, e)))
        .transpose()
}
