//! HTTP client for the external classification service.
//!
//! The service is consumed as a black box: one `POST {queries: [...]}`
//! exchange per invocation, no retry, no partial results. Any transport
//! failure or non-2xx status fails the whole batch.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Category;

/// One classification result as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedQuery {
    pub query: String,
    pub category: Category,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    queries: &'a [String],
}

/// Client for the classification endpoint.
pub struct Classifier {
    client: reqwest::Client,
    endpoint: String,
}

impl Classifier {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Classify a batch of query strings. All-or-nothing: a failed exchange
    /// returns an error and no results are applied.
    pub async fn classify(&self, queries: &[String]) -> Result<Vec<ClassifiedQuery>, AppError> {
        if queries.is_empty() {
            return Err(AppError::Validation(
                "No queries to classify".to_string(),
            ));
        }

        tracing::debug!(queries = queries.len(), "calling classification service");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { queries })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Classifier(format!(
                "Classification service returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
