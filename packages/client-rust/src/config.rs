use std::collections::BTreeMap;

use serde::Deserialize;

/// Connection and execution settings for [`GraphQLClient`](crate::GraphQLClient).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `http` or `https`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Route appended to the address for every request.
    pub base_route: String,
    /// Additional attempts after a connectivity failure.
    pub retries: u32,
    /// Timeout for a single attempt in milliseconds.
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Headers added to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            base_route: "/graphql".to_string(),
            retries: 1,
            timeout_ms: 100_000,
            connect_timeout_ms: 60_000,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// `protocol://host:port`
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Composes the request URI for `route` under the base route.
    ///
    /// A base route without a leading `/` gets one. A non-blank route that
    /// does not start with `?` or `/` is joined with a `/`.
    #[must_use]
    pub fn endpoint_uri(&self, route: &str) -> String {
        let mut uri = self.address();

        if !self.base_route.is_empty() {
            if !self.base_route.starts_with('/') {
                uri.push('/');
            }
            uri.push_str(&self.base_route);
        }

        if !route.trim().is_empty() {
            if !route.starts_with('?') && !route.starts_with('/') {
                uri.push('/');
            }
            uri.push_str(route);
        }

        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint_uri(""), "http://localhost:8080/graphql");
        assert_eq!(config.retries, 1);
        assert_eq!(config.timeout_ms, 100_000);
    }

    #[test]
    fn endpoint_slash_rules() {
        let config = ClientConfig {
            protocol: "https".into(),
            host: "api.local".into(),
            port: 3000,
            base_route: "api/graphql".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint_uri(""), "https://api.local:3000/api/graphql");
        assert_eq!(config.endpoint_uri("v2"), "https://api.local:3000/api/graphql/v2");
        assert_eq!(config.endpoint_uri("/v2"), "https://api.local:3000/api/graphql/v2");
        assert_eq!(config.endpoint_uri("?x=1"), "https://api.local:3000/api/graphql?x=1");
    }

    #[test]
    fn empty_base_route() {
        let config = ClientConfig {
            base_route: String::new(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint_uri("query"), "http://localhost:8080/query");
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "host": "example.org",
            "retries": 3,
            "headers": { "x-api-key": "secret" }
        }))
        .unwrap();
        assert_eq!(config.host, "example.org");
        assert_eq!(config.retries, 3);
        assert_eq!(config.port, 8080);
        assert_eq!(config.headers["x-api-key"], "secret");
    }
}
