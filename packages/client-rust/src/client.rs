//! Executes stored operations with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use fieldgate_core::ProjectionParams;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, info_span, trace, Instrument};

use crate::config::ClientConfig;
use crate::envelope::{extract_entity, normalize_error, parse_query_error};
use crate::error::ClientError;
use crate::store::OperationStore;
use crate::transport::{HttpTransport, Transport, TransportError, TransportRequest};

/// Label for format errors from [`GraphQLClient::execute_query`].
const INLINE_QUERY: &str = "<inline query>";

/// Client for a remote endpoint serving the operations in an [`OperationStore`].
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct GraphQLClient {
    config: Arc<ClientConfig>,
    store: Arc<OperationStore>,
    transport: Arc<dyn Transport>,
    uri: String,
}

impl GraphQLClient {
    /// Creates a client over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidSetting`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, store: OperationStore) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, store, Arc::new(transport)))
    }

    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        store: OperationStore,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let uri = config.endpoint_uri("");
        debug!(%uri, operations = store.len(), "graphql client configured");
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            transport,
            uri,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &OperationStore {
        &self.store
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Runs the stored operation `name` and decodes `data.<name>`.
    ///
    /// # Errors
    ///
    /// See [`execute_operation`](Self::execute_operation).
    pub async fn send_query<T: DeserializeOwned>(
        &self,
        correlation_id: Option<&str>,
        name: &str,
        variables: Value,
    ) -> Result<T, ClientError> {
        self.execute_operation(correlation_id, name, variables, None)
            .await
    }

    /// Runs the stored operation `name`, optionally narrowing its root
    /// selection to `projection`, and decodes `data.<name>`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Configuration`] if no operation has this name
    /// - [`ClientError::Connection`] once every attempt failed to connect
    /// - [`ClientError::Protocol`] when the server reports an error
    /// - [`ClientError::Format`] when the response has an unexpected shape
    pub async fn execute_operation<T: DeserializeOwned>(
        &self,
        correlation_id: Option<&str>,
        name: &str,
        variables: Value,
        projection: Option<&ProjectionParams>,
    ) -> Result<T, ClientError> {
        let method = format!("{}.{}", self.config.base_route, name);
        let span = info_span!(
            "graphql_call",
            method = %method,
            correlation_id = correlation_id.unwrap_or_default(),
        );

        async {
            let result = self
                .run_operation(correlation_id, name, variables, projection)
                .await;
            if let Err(err) = &result {
                error!(error = %err, "failed to call {method}");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_operation<T: DeserializeOwned>(
        &self,
        correlation_id: Option<&str>,
        name: &str,
        variables: Value,
        projection: Option<&ProjectionParams>,
    ) -> Result<T, ClientError> {
        trace!("calling {name}");
        let document = self
            .store
            .find(name)
            .map_err(|source| ClientError::Configuration {
                correlation_id: correlation_id.map(str::to_string),
                source,
            })?;

        let envelope = match projection {
            Some(projection) => {
                let projected = document.with_projection(projection);
                self.execute(correlation_id, name, projected.text(), variables)
                    .await?
            }
            None => {
                self.execute(correlation_id, name, document.text(), variables)
                    .await?
            }
        };

        extract_entity(&envelope, name, correlation_id)
    }

    /// Sends `{ query, variables }` and returns the parsed success envelope.
    ///
    /// The request is attempted once and then retried up to `retries`
    /// times while the failure is connectivity-class. Each attempt has its
    /// own timeout.
    ///
    /// # Errors
    ///
    /// See [`execute_operation`](Self::execute_operation).
    pub async fn execute_query(
        &self,
        correlation_id: Option<&str>,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError> {
        self.execute(correlation_id, INLINE_QUERY, query, variables)
            .await
    }

    /// `operation` only labels format errors.
    async fn execute(
        &self,
        correlation_id: Option<&str>,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, ClientError> {
        let request = TransportRequest {
            uri: self.uri.clone(),
            body: json!({ "query": query, "variables": variables }),
        };
        let attempts = self.config.retries.saturating_add(1);
        let per_attempt = Duration::from_millis(self.config.timeout_ms);

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let result = tokio::time::timeout(per_attempt, self.transport.post(&request))
                .await
                .unwrap_or(Err(TransportError::Timeout));

            match result {
                Ok(response) => break response,
                Err(err) if err.is_retryable() && attempt < attempts => {
                    trace!(uri = %request.uri, attempt, error = %err, "connection failed, retrying");
                }
                Err(source) => {
                    return Err(ClientError::Connection {
                        correlation_id: correlation_id.map(str::to_string),
                        uri: request.uri,
                        attempts: attempt,
                        source,
                    });
                }
            }
        };

        if response.is_failure() {
            return Err(ClientError::Protocol(normalize_error(
                response.status,
                &response.body,
                correlation_id,
            )));
        }

        let envelope: Value =
            serde_json::from_str(&response.body).map_err(|e| ClientError::Format {
                correlation_id: correlation_id.map(str::to_string),
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        if let Some(descriptor) = parse_query_error(&envelope, correlation_id) {
            return Err(ClientError::Protocol(descriptor));
        }

        Ok(envelope)
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("uri", &self.uri)
            .field("operations", &self.store.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
