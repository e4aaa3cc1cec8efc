//! Forecast parameter variants and series extraction.

use std::sync::OnceLock;

use roxmltree::Node;
use tracing::{debug, warn};

use common::{ConditionValue, ParameterRecord, SeriesItem, ValidTime, WeatherConditions};

use crate::{Location, TimeLayout, WeatherDocument};

/// Variant kind, selected by element tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Numeric values with a `units` attribute (temperature, precipitation, …).
    Units,
    /// Icon links.
    Icons,
    /// Weather conditions with summary and value attributes.
    Weather,
}

fn kind_for_tag(tag: &str) -> Option<ParameterKind> {
    match tag {
        "cloud-amount" | "precipitation" | "probability-of-precipitation" | "temperature" => {
            Some(ParameterKind::Units)
        }
        "conditions-icon" | "conditions-icons" => Some(ParameterKind::Icons),
        "weather" => Some(ParameterKind::Weather),
        _ => None,
    }
}

/// Walk every `<parameters>` section and build recognized parameters in
/// document order. Unrecognized element tags are skipped, not fatal.
pub(crate) fn collect_parameters<'a>(data: Node<'a, 'a>) -> Vec<Parameter<'a>> {
    let mut parameters = Vec::new();

    for section in data.descendants().filter(|n| n.has_tag_name("parameters")) {
        let location_key = section.attribute("applicable-location");

        for child in section.children().filter(|n| n.is_element()) {
            let tag = child.tag_name().name();
            match kind_for_tag(tag) {
                Some(kind) => parameters.push(Parameter::new(kind, child, location_key)),
                None => debug!("skipping unrecognized parameter element: {}", tag),
            }
        }
    }

    parameters
}

/// A single forecast parameter. Holds its location and time-layout keys
/// (lookup by key through the document, never ownership) and memoizes its
/// derived key path and extracted series.
#[derive(Debug)]
pub struct Parameter<'a> {
    kind: ParameterKind,
    element: Node<'a, 'a>,
    location_key: Option<&'a str>,
    layout_key: Option<&'a str>,
    name: OnceLock<Option<String>>,
    key_path: OnceLock<String>,
    series: OnceLock<Vec<SeriesItem>>,
}

impl<'a> Parameter<'a> {
    fn new(kind: ParameterKind, element: Node<'a, 'a>, location_key: Option<&'a str>) -> Self {
        Self {
            kind,
            element,
            location_key,
            layout_key: element.attribute("time-layout"),
            name: OnceLock::new(),
            key_path: OnceLock::new(),
            series: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn element_name(&self) -> &'a str {
        self.element.tag_name().name()
    }

    pub fn param_type(&self) -> Option<&'a str> {
        self.element.attribute("type")
    }

    pub fn units(&self) -> Option<&'a str> {
        self.element.attribute("units")
    }

    /// The `<name>` child text.
    pub fn name(&self) -> Option<&str> {
        self.name
            .get_or_init(|| {
                self.element
                    .descendants()
                    .find(|n| n.has_tag_name("name"))
                    .and_then(|n| n.text())
                    .map(str::to_string)
            })
            .as_deref()
    }

    pub fn location<'d>(&self, doc: &'d WeatherDocument<'a>) -> Option<&'d Location<'a>> {
        doc.locations().get(self.location_key?)
    }

    pub fn time_layout<'d>(&self, doc: &'d WeatherDocument<'a>) -> Option<&'d TimeLayout<'a>> {
        doc.time_layouts().get(self.layout_key?)
    }

    /// `/` joined from the non-empty parts of element name, type, layout
    /// period, and layout times.
    pub fn key_path(&self, doc: &WeatherDocument<'a>) -> &str {
        self.key_path.get_or_init(|| {
            let mut parts: Vec<&str> = Vec::new();

            let element_name = self.element_name();
            if !element_name.is_empty() {
                parts.push(element_name);
            }
            if let Some(t) = self.param_type().filter(|t| !t.is_empty()) {
                parts.push(t);
            }

            if let Some(layout) = self.time_layout(doc) {
                let parsed = layout.parsed_key();
                if let Some(period) = parsed.period.as_deref().filter(|p| !p.is_empty()) {
                    parts.push(period);
                }
                if let Some(times) = parsed.times.as_deref().filter(|t| !t.is_empty()) {
                    parts.push(times);
                }
            }

            format!("/{}", parts.join("/"))
        })
    }

    /// The extracted series: the variant's value list paired positionally by
    /// index with the layout's valid times. Surplus entries on either side
    /// are dropped; a length mismatch is reported, not fatal.
    pub fn series(&self, doc: &WeatherDocument<'a>) -> &[SeriesItem] {
        self.series
            .get_or_init(|| {
                let Some(layout) = self.time_layout(doc) else {
                    return Vec::new();
                };

                let bodies = match self.kind {
                    ParameterKind::Units => self.unit_bodies(),
                    ParameterKind::Icons => self.icon_bodies(),
                    ParameterKind::Weather => self.weather_bodies(),
                };

                pair_series(self.element_name(), layout.valid_times(), bodies)
            })
            .as_slice()
    }

    /// Materialize the persisted record form.
    pub fn to_record(&self, doc: &WeatherDocument<'a>) -> ParameterRecord {
        ParameterRecord {
            element_name: self.element_name().to_string(),
            key_path: self.key_path(doc).to_string(),
            name: self.name().map(str::to_string),
            param_type: self.param_type().map(str::to_string),
            units: match self.kind {
                ParameterKind::Units => self.units().map(str::to_string),
                _ => None,
            },
            location: self.location(doc).map(Location::to_record),
            time_layout: self.time_layout(doc).and_then(TimeLayout::to_record),
            series: self.series(doc).to_vec(),
        }
    }

    // ── Variant value extraction ──────────────────────────────────────

    fn unit_bodies(&self) -> Vec<SeriesBody> {
        self.element
            .children()
            .filter(|n| n.has_tag_name("value"))
            .map(|n| SeriesBody::Value(n.text().and_then(|t| t.trim().parse().ok())))
            .collect()
    }

    fn icon_bodies(&self) -> Vec<SeriesBody> {
        self.element
            .descendants()
            .filter(|n| n.has_tag_name("icon-link"))
            .map(|n| SeriesBody::Url(n.text().map(str::to_string)))
            .collect()
    }

    fn weather_bodies(&self) -> Vec<SeriesBody> {
        self.element
            .descendants()
            .filter(|n| n.has_tag_name("weather-conditions"))
            .map(|conditions| {
                let values = conditions
                    .descendants()
                    .filter(|n| n.has_tag_name("value"))
                    .map(|value| ConditionValue {
                        coverage: non_empty_attr(value, "coverage"),
                        intensity: non_empty_attr(value, "intensity"),
                        additive: non_empty_attr(value, "additive"),
                        weather_type: non_empty_attr(value, "weather-type"),
                        qualifier: non_empty_attr(value, "qualifier"),
                    })
                    .collect();

                SeriesBody::Data(WeatherConditions {
                    summary: conditions.attribute("weather-summary").map(str::to_string),
                    values,
                })
            })
            .collect()
    }
}

enum SeriesBody {
    Value(Option<f64>),
    Data(WeatherConditions),
    Url(Option<String>),
}

fn non_empty_attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn pair_series(element_name: &str, times: &[ValidTime], bodies: Vec<SeriesBody>) -> Vec<SeriesItem> {
    if times.len() != bodies.len() {
        warn!(
            "{}: {} values for {} valid times; pairing by index and dropping the surplus",
            element_name,
            bodies.len(),
            times.len()
        );
    }

    bodies
        .into_iter()
        .zip(times.iter().cloned())
        .map(|(body, time)| match body {
            SeriesBody::Value(value) => SeriesItem {
                time,
                value,
                data: None,
                url: None,
            },
            SeriesBody::Data(data) => SeriesItem {
                time,
                value: None,
                data: Some(data),
                url: None,
            },
            SeriesBody::Url(url) => SeriesItem {
                time,
                value: None,
                data: None,
                url,
            },
        })
        .collect()
}
