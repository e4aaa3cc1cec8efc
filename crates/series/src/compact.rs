//! Compact wire encoding for series items.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use common::{SeriesItem, WeatherConditions};

/// Items remapped between cooperative yields.
const CHUNK: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactEdge {
    pub t: DateTime<FixedOffset>,
    pub o: i32,
}

/// Abbreviated series item: `t`/`o` are the start instant and offset, `te`
/// the optional end, and the body keeps one of `v`, `d`, or `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactItem {
    pub t: DateTime<FixedOffset>,
    pub o: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub te: Option<CompactEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<WeatherConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<SeriesItem> for CompactItem {
    fn from(item: SeriesItem) -> Self {
        let SeriesItem {
            time,
            value,
            data,
            url,
        } = item;

        Self {
            t: time.start.date,
            o: time.start.offset,
            te: time.end.map(|edge| CompactEdge {
                t: edge.date,
                o: edge.offset,
            }),
            v: value,
            d: data,
            url,
        }
    }
}

/// Remap a series into the compact layout, yielding to the scheduler between
/// chunks so large payloads do not starve concurrent operations.
pub async fn compact_series(items: Vec<SeriesItem>) -> Vec<CompactItem> {
    let mut out = Vec::with_capacity(items.len());

    for (i, item) in items.into_iter().enumerate() {
        if i > 0 && i % CHUNK == 0 {
            tokio::task::yield_now().await;
        }
        out.push(CompactItem::from(item));
    }

    out
}
