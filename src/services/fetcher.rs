//! Collection Fetcher
//!
//! Retrieves the first page of a named collection from the FAED API. Only the
//! envelope's `results` field is interpreted; individual records are handed
//! to the caller undecoded.

use std::future::Future;

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::config::ApiConfig;
use crate::domain::resource::ResourceKind;
use crate::error::{Error, Result};

/// Source of raw collection records
///
/// Implementations never retry; a transport failure surfaces as
/// [`Error::Fetch`].
pub trait CollectionFetcher {
    fn fetch(&self, resource: ResourceKind) -> impl Future<Output = Result<Vec<Value>>>;
}

/// Pull `results` out of a response envelope
///
/// An envelope without `results` is an empty collection, not an error.
pub fn extract_results(resource: ResourceKind, body: Value) -> Result<Vec<Value>> {
    let Value::Object(mut envelope) = body else {
        return Err(Error::Fetch {
            resource,
            message: "response body is not a JSON object".to_string(),
        });
    };

    match envelope.remove("results") {
        Some(Value::Array(records)) => Ok(records),
        Some(Value::Null) | None => {
            warn!("{resource}: response has no results field, treating as empty");
            Ok(Vec::new())
        }
        Some(other) => Err(Error::Fetch {
            resource,
            message: format!("results is not an array: {other}"),
        }),
    }
}

/// [`CollectionFetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpCollectionFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCollectionFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Invalid {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a collection's first page
    pub fn collection_url(&self, resource: ResourceKind) -> String {
        format!("{}/api/{}/?format=json", self.base_url, resource)
    }
}

impl CollectionFetcher for HttpCollectionFetcher {
    async fn fetch(&self, resource: ResourceKind) -> Result<Vec<Value>> {
        let url = self.collection_url(resource);
        debug!("GET {url}");

        let to_fetch_error = |e: reqwest::Error| Error::Fetch {
            resource,
            message: e.to_string(),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(to_fetch_error)?;

        let body: Value = response.json().await.map_err(to_fetch_error)?;
        let records = extract_results(resource, body)?;

        debug!("{resource}: received {} records", records.len());
        Ok(records)
    }
}
