//! Digital Weather Markup Language (DWML) bulletin parser.
//!
//! Turns a raw XML bulletin into a structured document model: locations,
//! time layouts, and forecast parameters. The model borrows the read-only
//! XML node tree; derived values (points, layout key parts, extracted
//! series) are computed on first access and memoized per instance, which is
//! safe because the tree is immutable after parse.

mod parameter;

pub use parameter::{Parameter, ParameterKind};

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::DateTime;
use roxmltree::Node;
use tracing::warn;

use common::{
    Error, LocationRecord, ParameterRecord, ParsedLayoutKey, Point, TimeEdge, TimeLayoutRecord,
    ValidTime,
};

/// Parse a bulletin and materialize its parameter records in one call.
pub fn parse_records(xml: &str) -> Result<Vec<ParameterRecord>, Error> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::Xml(e.to_string()))?;
    let dwml = WeatherDocument::new(&doc)?;
    Ok(dwml.records())
}

/// The root parse result. Fails if the bulletin has no `<data>` section.
#[derive(Debug)]
pub struct WeatherDocument<'a> {
    data: Node<'a, 'a>,
    locations: OnceLock<HashMap<String, Location<'a>>>,
    time_layouts: OnceLock<HashMap<String, TimeLayout<'a>>>,
    parameters: OnceLock<Vec<Parameter<'a>>>,
}

impl<'a> WeatherDocument<'a> {
    pub fn new(doc: &'a roxmltree::Document<'a>) -> Result<Self, Error> {
        let data = doc
            .descendants()
            .find(|n| n.has_tag_name("data"))
            .ok_or(Error::MissingData)?;

        Ok(Self {
            data,
            locations: OnceLock::new(),
            time_layouts: OnceLock::new(),
            parameters: OnceLock::new(),
        })
    }

    /// Locations keyed by their location-key.
    pub fn locations(&self) -> &HashMap<String, Location<'a>> {
        self.locations.get_or_init(|| {
            let mut map = HashMap::new();
            for el in self.data.descendants().filter(|n| n.has_tag_name("location")) {
                let location = Location::new(el);
                if let Some(key) = location.location_key() {
                    map.insert(key.to_string(), location);
                }
            }
            map
        })
    }

    /// Time layouts keyed by their layout-key.
    pub fn time_layouts(&self) -> &HashMap<String, TimeLayout<'a>> {
        self.time_layouts.get_or_init(|| {
            let mut map = HashMap::new();
            for el in self
                .data
                .descendants()
                .filter(|n| n.has_tag_name("time-layout"))
            {
                let layout = TimeLayout::new(el);
                if let Some(key) = layout.layout_key() {
                    map.insert(key.to_string(), layout);
                }
            }
            map
        })
    }

    /// Forecast parameters in document order.
    pub fn parameters(&self) -> &[Parameter<'a>] {
        self.parameters
            .get_or_init(|| parameter::collect_parameters(self.data))
            .as_slice()
    }

    /// Materialize all parameters into their persisted record form.
    pub fn records(&self) -> Vec<ParameterRecord> {
        self.parameters()
            .iter()
            .map(|p| p.to_record(self))
            .collect()
    }
}

// ── Locations ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Location<'a> {
    element: Node<'a, 'a>,
    point: OnceLock<Option<Point>>,
}

impl<'a> Location<'a> {
    fn new(element: Node<'a, 'a>) -> Self {
        Self {
            element,
            point: OnceLock::new(),
        }
    }

    pub fn location_key(&self) -> Option<&'a str> {
        self.element
            .descendants()
            .find(|n| n.has_tag_name("location-key"))
            .and_then(|n| n.text())
    }

    pub fn point(&self) -> Option<&Point> {
        self.point
            .get_or_init(|| parse_point(self.element))
            .as_ref()
    }

    pub fn to_record(&self) -> LocationRecord {
        LocationRecord {
            location_key: self.location_key().map(str::to_string),
            point: self.point().cloned(),
        }
    }
}

fn parse_point(element: Node<'_, '_>) -> Option<Point> {
    let el = element.descendants().find(|n| n.has_tag_name("point"))?;
    let latitude = el.attribute("latitude")?.parse().ok()?;
    let longitude = el.attribute("longitude")?.parse().ok()?;
    Some(Point {
        latitude,
        longitude,
    })
}

// ── Time layouts ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TimeLayout<'a> {
    element: Node<'a, 'a>,
    parsed_key: OnceLock<ParsedLayoutKey>,
    valid_times: OnceLock<Vec<ValidTime>>,
}

impl<'a> TimeLayout<'a> {
    fn new(element: Node<'a, 'a>) -> Self {
        Self {
            element,
            parsed_key: OnceLock::new(),
            valid_times: OnceLock::new(),
        }
    }

    pub fn layout_key(&self) -> Option<&'a str> {
        self.element
            .descendants()
            .find(|n| n.has_tag_name("layout-key"))
            .and_then(|n| n.text())
    }

    pub fn time_coordinate(&self) -> Option<&'a str> {
        self.element.attribute("time-coordinate")
    }

    /// Period/times/sequence derived from a key of the form `k-p24h-n7-1`.
    pub fn parsed_key(&self) -> &ParsedLayoutKey {
        self.parsed_key
            .get_or_init(|| parse_layout_key(self.layout_key()))
    }

    /// Valid-time intervals in document order. Start and end elements are
    /// paired positionally; ends are optional.
    pub fn valid_times(&self) -> &[ValidTime] {
        self.valid_times
            .get_or_init(|| collect_valid_times(self.element))
            .as_slice()
    }

    pub fn to_record(&self) -> Option<TimeLayoutRecord> {
        let layout_key = self.layout_key()?;
        Some(TimeLayoutRecord {
            layout_key: layout_key.to_string(),
            parsed_key: self.parsed_key().clone(),
            time_coordinate: self.time_coordinate().map(str::to_string),
        })
    }
}

fn parse_layout_key(key: Option<&str>) -> ParsedLayoutKey {
    let mut parsed = ParsedLayoutKey::default();

    if let Some(key) = key {
        let parts: Vec<&str> = key.split('-').collect();
        parsed.period = parts.get(1).map(|p| p.to_string());
        parsed.times = parts.get(2).map(|t| t.to_string());
        parsed.seq = parts.get(3).and_then(|s| s.parse().ok());
    }

    parsed
}

fn collect_valid_times(element: Node<'_, '_>) -> Vec<ValidTime> {
    let starts: Vec<Node> = element
        .descendants()
        .filter(|n| n.has_tag_name("start-valid-time"))
        .collect();
    let ends: Vec<Node> = element
        .descendants()
        .filter(|n| n.has_tag_name("end-valid-time"))
        .collect();

    let mut times = Vec::with_capacity(starts.len());
    for (i, start_el) in starts.iter().enumerate() {
        let Some(start) = parse_time_edge(*start_el, true) else {
            continue;
        };
        let end = ends.get(i).and_then(|el| parse_time_edge(*el, false));
        times.push(ValidTime { start, end });
    }

    times
}

fn parse_time_edge(element: Node<'_, '_>, with_period_name: bool) -> Option<TimeEdge> {
    let raw = element.text()?.trim();
    let date = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt,
        Err(err) => {
            warn!("skipping unparseable valid-time {:?}: {}", raw, err);
            return None;
        }
    };

    let period_name = if with_period_name {
        element.attribute("period-name").map(str::to_string)
    } else {
        None
    };

    Some(TimeEdge {
        date,
        offset: date.offset().local_minus_utc(),
        string: raw.to_string(),
        period_name,
    })
}

// ── Test fixtures ─────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testdata {
    /// A small but structurally faithful DWML bulletin: one point, a daily
    /// and a half-day layout, and one parameter of each recognized variant
    /// plus one unrecognized element.
    pub const BULLETIN: &str = r#"<?xml version="1.0"?>
<dwml version="1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <head>
    <product srsName="WGS 1984" concise-name="glance" operational-mode="official"/>
  </head>
  <data>
    <location>
      <location-key>point1</location-key>
      <point latitude="33.26" longitude="-116.41"/>
    </location>
    <time-layout time-coordinate="local" summarization="24hourly">
      <layout-key>k-p24h-n3-1</layout-key>
      <start-valid-time period-name="Monday">2026-08-03T06:00:00-07:00</start-valid-time>
      <end-valid-time>2026-08-04T06:00:00-07:00</end-valid-time>
      <start-valid-time period-name="Tuesday">2026-08-04T06:00:00-07:00</start-valid-time>
      <end-valid-time>2026-08-05T06:00:00-07:00</end-valid-time>
      <start-valid-time period-name="Wednesday">2026-08-05T06:00:00-07:00</start-valid-time>
      <end-valid-time>2026-08-06T06:00:00-07:00</end-valid-time>
    </time-layout>
    <time-layout time-coordinate="local" summarization="12hourly">
      <layout-key>k-p12h-n2-2</layout-key>
      <start-valid-time period-name="Monday">2026-08-03T06:00:00-07:00</start-valid-time>
      <start-valid-time period-name="Monday Night">2026-08-03T18:00:00-07:00</start-valid-time>
    </time-layout>
    <parameters applicable-location="point1">
      <temperature type="maximum" units="Fahrenheit" time-layout="k-p24h-n3-1">
        <name>Daily Maximum Temperature</name>
        <value>91</value>
        <value xsi:nil="true"/>
        <value>88</value>
      </temperature>
      <weather time-layout="k-p12h-n2-2">
        <name>Weather Type, Coverage, and Intensity</name>
        <weather-conditions weather-summary="Sunny"/>
        <weather-conditions weather-summary="Chance Thunderstorms">
          <value coverage="chance" intensity="moderate" weather-type="thunderstorms" qualifier="none"/>
        </weather-conditions>
      </weather>
      <conditions-icon type="forecast-NWS" time-layout="k-p12h-n2-2">
        <name>Conditions Icons</name>
        <icon-link>https://forecast.weather.gov/images/wtf/skc.jpg</icon-link>
        <icon-link xsi:nil="true"/>
      </conditions-icon>
      <hazards time-layout="k-p12h-n2-2">
        <name>Watches, Warnings, and Advisories</name>
      </hazards>
    </parameters>
  </data>
</dwml>
"#;
}
