//! Domain types shared across the pipeline.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ── Query surface ─────────────────────────────────────────────────────

/// Upstream interface flavor. Selects which NDFD endpoint is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    Summarized,
    Unsummarized,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interface::Summarized => write!(f, "summarized"),
            Interface::Unsummarized => write!(f, "unsummarized"),
        }
    }
}

impl FromStr for Interface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarized" => Ok(Interface::Summarized),
            "unsummarized" => Ok(Interface::Unsummarized),
            other => Err(Error::Config(format!("unknown interface: {}", other))),
        }
    }
}

/// Parameter selector: exact name, or a key-path prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
}

/// Time bounds for the upstream request window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeFilter {
    #[serde(rename = "$gt", default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<DateTime<Utc>>,
    #[serde(rename = "$gte", default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<DateTime<Utc>>,
    #[serde(rename = "$lt", default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<DateTime<Utc>>,
    #[serde(rename = "$lte", default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<DateTime<Utc>>,
}

/// Sort directive; `time: -1` descending, `time: 1` ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i8>,
}

/// A series lookup as consumed from the (excluded) web layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<ParameterQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<Interface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact: Option<bool>,

    // Summarized-only fields.
    #[serde(rename = "numDays", default, skip_serializing_if = "Option::is_none")]
    pub num_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    // Unsummarized-only fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    // Presentation filters.
    #[serde(rename = "$limit", default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(rename = "$sort", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

/// The cache-relevant projection of a [`SeriesQuery`]: every query field
/// except `parameter`, `interface`, and the presentation filters. Feeds both
/// the fingerprint and the upstream request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheKeyFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeFilter>,
    #[serde(rename = "numDays", default, skip_serializing_if = "Option::is_none")]
    pub num_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl CacheKeyFields {
    pub fn from_query(query: &SeriesQuery) -> Self {
        Self {
            lat: query.lat,
            lng: query.lng,
            lon: query.lon,
            unit: query.unit.clone(),
            time: query.time.clone(),
            num_days: query.num_days,
            format: query.format.clone(),
            product: query.product.clone(),
            begin: query.begin.clone(),
            end: query.end.clone(),
        }
    }
}

// ── Series data ───────────────────────────────────────────────────────

/// One edge of a valid-time interval. The instant keeps the bulletin's own
/// zone offset; `offset` is that offset in seconds; `string` is the literal
/// as it appeared in the XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEdge {
    pub date: DateTime<FixedOffset>,
    pub offset: i32,
    pub string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_name: Option<String>,
}

/// A valid-time interval: start required, end optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidTime {
    pub start: TimeEdge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<TimeEdge>,
}

/// One weather-conditions value (attribute bag from the bulletin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

/// Conditions for one point in a weather series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ConditionValue>,
}

/// One time+value tuple of an extracted series. Exactly one body field is
/// set, depending on the parameter variant; a nil body serializes as an
/// absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesItem {
    pub time: ValidTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<WeatherConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SeriesItem {
    /// The start instant used for ordering.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.time.start.date.with_timezone(&Utc)
    }
}

// ── Persisted document ────────────────────────────────────────────────

/// A forecast point location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Point>,
}

/// Fields derived from a layout key of the form `k-p24h-n7-1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLayoutKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLayoutRecord {
    pub layout_key: String,
    pub parsed_key: ParsedLayoutKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_coordinate: Option<String>,
}

/// The persisted form of a parsed parameter, as written to the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub element_name: String,
    pub key_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_layout: Option<TimeLayoutRecord>,
    #[serde(default)]
    pub series: Vec<SeriesItem>,
}

/// The outbound request echo kept with a fetched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub url: String,
    #[serde(default)]
    pub query: Vec<(String, String)>,
}

/// A parsed bulletin as persisted under its fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_options: Option<RequestInfo>,
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ── Fetch + error payloads ────────────────────────────────────────────

/// Outcome of an upstream fetch. A non-2xx response is a diagnostic value,
/// not an error path, so callers branch on it explicitly.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Document(CachedDocument),
    Upstream {
        request: RequestInfo,
        status: u16,
        body: String,
    },
}

/// Non-throwing error shape embedded in responses so batch callers degrade
/// per-item instead of failing wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_options: Option<RequestInfo>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            request_options: None,
        }
    }
}

impl From<Error> for ErrorPayload {
    fn from(err: Error) -> Self {
        match err {
            Error::Upstream { status, body } => Self {
                message: body,
                status: Some(status),
                request_options: None,
            },
            other => Self::new(other.to_string()),
        }
    }
}
