//! NDFD client.
//!
//! Issues outbound GETs against the configured summarized/unsummarized
//! browser-interface endpoints and hands 2xx bodies to the DWML parser.
//! Non-2xx responses come back as diagnostic values so the orchestrator can
//! branch on them explicitly; network and parse failures are error values.

mod query;

pub use query::build_query;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{
    AppConfig, CacheKeyFields, CachedDocument, DocumentFetcher, Error, FetchOutcome, Interface,
    RequestInfo,
};

/// NDFD API client with connection pooling and User-Agent header.
#[derive(Debug, Clone)]
pub struct NdfdClient {
    client: reqwest::Client,
    summarized_url: String,
    unsummarized_url: String,
}

impl NdfdClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(config.http.timeout_secs))
            .build()
            .expect("failed to build NDFD HTTP client");

        Self {
            client,
            summarized_url: config.endpoints.summarized_url.clone(),
            unsummarized_url: config.endpoints.unsummarized_url.clone(),
        }
    }

    fn endpoint(&self, interface: Interface) -> &str {
        match interface {
            Interface::Summarized => &self.summarized_url,
            Interface::Unsummarized => &self.unsummarized_url,
        }
    }
}

#[async_trait]
impl DocumentFetcher for NdfdClient {
    async fn find(
        &self,
        interface: Interface,
        fields: &CacheKeyFields,
    ) -> Result<FetchOutcome, Error> {
        let url = self.endpoint(interface);
        let query = build_query(interface, fields);
        let request = RequestInfo {
            url: url.to_string(),
            query: query.clone(),
        };

        debug!("Fetching NDFD bulletin: {} ({})", url, interface);

        let resp = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("request to {} failed: {}", url, e)))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                "NDFD {} returned {}: {}",
                interface,
                status,
                &body[..body.len().min(500)]
            );
            return Ok(FetchOutcome::Upstream {
                request,
                status,
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading body from {} failed: {}", url, e)))?;

        let parameters = dwml::parse_records(&body)?;
        debug!("Parsed {} parameters from bulletin", parameters.len());

        Ok(FetchOutcome::Document(CachedDocument {
            id: None,
            request_options: Some(request),
            parameters,
            created_at: None,
            updated_at: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::EndpointConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BULLETIN: &str = r#"<?xml version="1.0"?>
<dwml version="1.0">
  <data>
    <location>
      <location-key>point1</location-key>
      <point latitude="33.26" longitude="-116.41"/>
    </location>
    <time-layout time-coordinate="local">
      <layout-key>k-p24h-n1-1</layout-key>
      <start-valid-time period-name="Monday">2026-08-03T06:00:00-07:00</start-valid-time>
    </time-layout>
    <parameters applicable-location="point1">
      <temperature type="maximum" units="Fahrenheit" time-layout="k-p24h-n1-1">
        <name>Daily Maximum Temperature</name>
        <value>91</value>
      </temperature>
    </parameters>
  </data>
</dwml>
"#;

    fn test_config(base: &str) -> AppConfig {
        AppConfig {
            endpoints: EndpointConfig {
                summarized_url: format!("{}/summarized", base),
                unsummarized_url: format!("{}/unsummarized", base),
            },
            ..AppConfig::default()
        }
    }

    fn test_fields() -> CacheKeyFields {
        CacheKeyFields {
            lat: Some(33.26),
            lng: Some(-116.41),
            unit: Some("e".into()),
            ..CacheKeyFields::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_parses_bulletin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summarized"))
            .and(query_param("lat", "33.26"))
            .and(query_param("lon", "-116.41"))
            .and(query_param("Unit", "e"))
            .and(query_param("format", "24 hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BULLETIN))
            .mount(&server)
            .await;

        let client = NdfdClient::new(&test_config(&server.uri()));
        let outcome = client
            .find(Interface::Summarized, &test_fields())
            .await
            .expect("fetch should succeed");

        match outcome {
            FetchOutcome::Document(doc) => {
                assert_eq!(doc.parameters.len(), 1);
                assert_eq!(doc.parameters[0].key_path, "/temperature/maximum/p24h/n1");
                let request = doc.request_options.expect("request echo");
                assert!(request.url.ends_with("/summarized"));
            }
            other => panic!("expected a document, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_2xx_is_a_diagnostic_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/unsummarized"))
            .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
            .mount(&server)
            .await;

        let client = NdfdClient::new(&test_config(&server.uri()));
        let outcome = client
            .find(Interface::Unsummarized, &test_fields())
            .await
            .expect("a non-2xx response is not an error");

        match outcome {
            FetchOutcome::Upstream {
                request,
                status,
                body,
            } => {
                assert_eq!(status, 503);
                assert_eq!(body, "service unavailable");
                assert!(request.url.ends_with("/unsummarized"));
            }
            other => panic!("expected a diagnostic, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_body_without_data_section_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summarized"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<status>offline</status>"))
            .mount(&server)
            .await;

        let client = NdfdClient::new(&test_config(&server.uri()));
        let err = client
            .find(Interface::Summarized, &test_fields())
            .await
            .err()
            .expect("parse should fail");

        assert!(matches!(err, Error::MissingData));
    }

    #[tokio::test]
    async fn test_malformed_xml_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/summarized"))
            .respond_with(ResponseTemplate::new(200).set_body_string("definitely not xml"))
            .mount(&server)
            .await;

        let client = NdfdClient::new(&test_config(&server.uri()));
        let err = client
            .find(Interface::Summarized, &test_fields())
            .await
            .err()
            .expect("parse should fail");

        assert!(matches!(err, Error::Xml(_)));
    }
}
