//! Pipeline configuration types.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream NDFD endpoints.
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Result pagination bounds.
    #[serde(default)]
    pub paginate: PaginateConfig,
}

/// Endpoint URLs for the two NDFD browser interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_summarized_url")]
    pub summarized_url: String,

    #[serde(default = "default_unsummarized_url")]
    pub unsummarized_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent upstream.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginateConfig {
    /// Limit applied when the query carries no `$limit`.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Hard cap on `$limit`.
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_summarized_url() -> String {
    "https://graphical.weather.gov/xml/sample_products/browser_interface/ndfdBrowserClientByDay.php"
        .into()
}

fn default_unsummarized_url() -> String {
    "https://graphical.weather.gov/xml/sample_products/browser_interface/ndfdXMLclient.php".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "ndfd-series/0.1".into()
}

fn default_limit() -> usize {
    200
}

fn default_max_limit() -> usize {
    2000
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            summarized_url: default_summarized_url(),
            unsummarized_url: default_unsummarized_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PaginateConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            http: HttpConfig::default(),
            paginate: PaginateConfig::default(),
        }
    }
}
