//! CouchDB HTTP store.
//!
//! Documents live at `{url}/{database}/{id}`. The revision travels in the
//! document body as `_rev`; CouchDB answers 404 for unknown documents and
//! 409 for missing or stale revisions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{DocumentStore, Revision, StoreError, StoredDocument, stamp};
use crate::config::{Credentials, StoreConfig};

/// Successful write response (`{"ok": true, "id": ..., "rev": ...}`)
#[derive(Debug, Deserialize)]
struct WriteResponse {
    rev: String,
}

/// CouchDB-compatible document store client
pub struct CouchStore {
    http_client: reqwest::Client,
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
}

impl CouchStore {
    pub fn new(config: &StoreConfig, credentials: &Credentials) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: credentials.store_username.clone(),
            password: credentials.store_password.clone(),
        })
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(&self.database))
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.database_url(), urlencoding::encode(id))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    /// Create the database if it doesn't exist yet.
    pub async fn ensure_database(&self) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PUT, &self.database_url())
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            201 | 202 => {
                tracing::info!(database = %self.database, "Created database");
                Ok(())
            }
            // Precondition failed: the database already exists
            412 => {
                tracing::debug!(database = %self.database, "Database exists");
                Ok(())
            }
            status => Err(StoreError::Status {
                status,
                message: error_message(response).await,
            }),
        }
    }
}

/// Pull the `reason` (or `error`) out of a CouchDB error body.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("reason")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or(body)
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn fetch(&self, id: &str) -> Result<StoredDocument, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.document_url(id))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            404 => return Err(StoreError::NotFound(id.to_string())),
            200 => {}
            status => {
                return Err(StoreError::Status {
                    status,
                    message: error_message(response).await,
                });
            }
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let revision = document
            .get("_rev")
            .and_then(Value::as_str)
            .map(Revision::new)
            .ok_or_else(|| StoreError::Decode(format!("document {id} has no _rev")))?;

        Ok(StoredDocument { document, revision })
    }

    async fn put(
        &self,
        id: &str,
        mut document: Value,
        revision: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        stamp(&mut document, id, revision);

        let response = self
            .request(reqwest::Method::PUT, &self.document_url(id))
            .json(&document)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            200 | 201 | 202 => {}
            409 => return Err(StoreError::Conflict(id.to_string())),
            status => {
                return Err(StoreError::Status {
                    status,
                    message: error_message(response).await,
                });
            }
        }

        let written: WriteResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Revision::new(written.rev))
    }
}
