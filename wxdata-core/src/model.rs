use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Inclusive calendar date range. `start > end` is allowed and simply covers
/// no days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both bounds from `YYYY-MM-DD`.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        Error::InvalidArgument(format!("Invalid date '{value}' (expected YYYY-MM-DD): {e}"))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }

    pub const fn all() -> &'static [Granularity] {
        &[Granularity::Daily, Granularity::Hourly]
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "hourly" => Ok(Granularity::Hourly),
            _ => Err(Error::InvalidArgument(format!(
                "Granularity must be 'daily' or 'hourly', got '{value}'."
            ))),
        }
    }
}

/// Point-query response body, kept exactly as upstream sent it. Observations
/// live under `data`; their field set is never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherResponse(Value);

impl WeatherResponse {
    /// A synthesized `{"data": [...]}` response.
    pub fn from_records(data: Vec<Value>) -> Self {
        let mut body = Map::new();
        body.insert("data".to_string(), Value::Array(data));
        Self(Value::Object(body))
    }

    /// Observations under `data`. Empty when the key is missing, null or not
    /// a list.
    pub fn records(&self) -> &[Value] {
        self.0.get("data").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for WeatherResponse {
    fn from(body: Value) -> Self {
        Self(body)
    }
}
