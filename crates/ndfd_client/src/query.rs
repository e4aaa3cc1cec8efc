//! Wire-query construction for the NDFD browser interfaces.
//!
//! Maps the cache-key fields onto the upstream parameter names: `lng` feeds
//! `lon`, `unit` becomes `Unit`, and the `time` bounds become `startDate`
//! (summarized) or `begin`/`end` (unsummarized).

use chrono::{DateTime, Duration, Utc};

use common::{CacheKeyFields, Interface, TimeFilter};

const DEFAULT_SUMMARIZED_FORMAT: &str = "24 hourly";
const DEFAULT_UNSUMMARIZED_PRODUCT: &str = "time-series";

/// Build the query-string pairs for an upstream GET.
pub fn build_query(interface: Interface, fields: &CacheKeyFields) -> Vec<(String, String)> {
    let mut query: Vec<(String, String)> = Vec::new();

    if let Some(lat) = fields.lat {
        query.push(("lat".into(), lat.to_string()));
    }
    if let Some(lon) = fields.lon.or(fields.lng) {
        query.push(("lon".into(), lon.to_string()));
    }
    if let Some(unit) = &fields.unit {
        query.push(("Unit".into(), unit.clone()));
    }

    match interface {
        Interface::Summarized => {
            let format = fields
                .format
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARIZED_FORMAT.into());
            query.push(("format".into(), format));

            if let Some(num_days) = fields.num_days {
                query.push(("numDays".into(), num_days.to_string()));
            }
            if let Some(start_date) = summarized_start_date(fields.time.as_ref()) {
                query.push(("startDate".into(), start_date));
            }
        }
        Interface::Unsummarized => {
            let product = fields
                .product
                .clone()
                .unwrap_or_else(|| DEFAULT_UNSUMMARIZED_PRODUCT.into());
            query.push(("product".into(), product));

            if let Some(begin) = unsummarized_begin(fields.time.as_ref(), fields.begin.as_deref()) {
                query.push(("begin".into(), begin));
            }
            if let Some(end) = unsummarized_end(fields.time.as_ref(), fields.end.as_deref()) {
                query.push(("end".into(), end));
            }
        }
    }

    query
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_date_time(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `$gt` means "after that day", so it bumps the start date by one day;
/// `$gte` starts on the bound itself. `$lt`/`$lte` are not expressible on
/// the summarized interface and are ignored.
fn summarized_start_date(time: Option<&TimeFilter>) -> Option<String> {
    let time = time?;

    if let Some(gt) = time.gt {
        return Some(format_date(gt + Duration::seconds(86_400)));
    }
    if let Some(gte) = time.gte {
        return Some(format_date(gte));
    }

    None
}

/// Exclusive bounds are narrowed by one second to express them on the
/// inclusive begin/end window. A time bound overrides a caller-supplied
/// literal.
fn unsummarized_begin(time: Option<&TimeFilter>, fallback: Option<&str>) -> Option<String> {
    if let Some(time) = time {
        if let Some(gt) = time.gt {
            return Some(format_date_time(gt + Duration::seconds(1)));
        }
        if let Some(gte) = time.gte {
            return Some(format_date_time(gte));
        }
    }

    fallback.map(str::to_string)
}

fn unsummarized_end(time: Option<&TimeFilter>, fallback: Option<&str>) -> Option<String> {
    if let Some(time) = time {
        if let Some(lt) = time.lt {
            return Some(format_date_time(lt - Duration::seconds(1)));
        }
        if let Some(lte) = time.lte {
            return Some(format_date_time(lte));
        }
    }

    fallback.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn get<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_summarized_defaults_and_coordinate_mapping() {
        let fields = CacheKeyFields {
            lat: Some(33.26),
            lng: Some(-116.41),
            unit: Some("m".into()),
            num_days: Some(7),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Summarized, &fields);

        assert_eq!(get(&query, "lat"), Some("33.26"));
        assert_eq!(get(&query, "lon"), Some("-116.41"));
        assert_eq!(get(&query, "Unit"), Some("m"));
        assert_eq!(get(&query, "format"), Some("24 hourly"));
        assert_eq!(get(&query, "numDays"), Some("7"));
        assert_eq!(get(&query, "lng"), None);
        assert_eq!(get(&query, "unit"), None);
    }

    #[test]
    fn test_lon_takes_precedence_over_lng() {
        let fields = CacheKeyFields {
            lon: Some(-120.0),
            lng: Some(-116.41),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Summarized, &fields);
        assert_eq!(get(&query, "lon"), Some("-120"));
    }

    #[test]
    fn test_summarized_start_date_from_gte() {
        let fields = CacheKeyFields {
            time: Some(TimeFilter {
                gte: Some(utc("2026-08-03T00:00:00Z")),
                ..TimeFilter::default()
            }),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Summarized, &fields);
        assert_eq!(get(&query, "startDate"), Some("2026-08-03"));
    }

    #[test]
    fn test_summarized_start_date_from_gt_bumps_a_day() {
        let fields = CacheKeyFields {
            time: Some(TimeFilter {
                gt: Some(utc("2026-08-03T00:00:00Z")),
                ..TimeFilter::default()
            }),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Summarized, &fields);
        assert_eq!(get(&query, "startDate"), Some("2026-08-04"));
    }

    #[test]
    fn test_unsummarized_window_narrows_exclusive_bounds() {
        let fields = CacheKeyFields {
            time: Some(TimeFilter {
                gt: Some(utc("2026-08-03T00:00:00Z")),
                lt: Some(utc("2026-08-04T00:00:00Z")),
                ..TimeFilter::default()
            }),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Unsummarized, &fields);
        assert_eq!(get(&query, "product"), Some("time-series"));
        assert_eq!(get(&query, "begin"), Some("2026-08-03T00:00:01"));
        assert_eq!(get(&query, "end"), Some("2026-08-03T23:59:59"));
    }

    #[test]
    fn test_unsummarized_inclusive_bounds_pass_through() {
        let fields = CacheKeyFields {
            time: Some(TimeFilter {
                gte: Some(utc("2026-08-03T06:00:00Z")),
                lte: Some(utc("2026-08-04T06:00:00Z")),
                ..TimeFilter::default()
            }),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Unsummarized, &fields);
        assert_eq!(get(&query, "begin"), Some("2026-08-03T06:00:00"));
        assert_eq!(get(&query, "end"), Some("2026-08-04T06:00:00"));
    }

    #[test]
    fn test_literal_begin_end_used_when_no_time_filter() {
        let fields = CacheKeyFields {
            begin: Some("2026-08-03T00:00:00".into()),
            end: Some("2026-08-04T00:00:00".into()),
            ..CacheKeyFields::default()
        };

        let query = build_query(Interface::Unsummarized, &fields);
        assert_eq!(get(&query, "begin"), Some("2026-08-03T00:00:00"));
        assert_eq!(get(&query, "end"), Some("2026-08-04T00:00:00"));
    }
}
