//! `fieldgate` Client: named operation store, retrying executor, and response normalization.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod store;
pub mod transport;

pub use client::GraphQLClient;
pub use config::ClientConfig;
pub use envelope::{extract_entity, normalize_error};
pub use error::{ClientError, StoreError};
pub use store::{OperationDocument, OperationStore};
pub use transport::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};
