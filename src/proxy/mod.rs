//! Passthrough proxy in front of the document store.
//!
//! Lets clients that can't do the store's authentication read and write
//! documents directly:
//!
//! - `POST   /:collection`      create a document
//! - `GET    /:collection/:id`  read a document
//! - `PUT    /:collection/:id`  update a document
//! - `DELETE /:collection/:id`  delete a document (`?rev=` is passed along)
//!
//! Every request must be `Content-Type: application/json`. It is forwarded
//! with the configured credentials and the store's status and body are
//! relayed as-is.

use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::config::{Credentials, StoreConfig};
use crate::error::{Error, Result};
use crate::store::StoreError;

/// Shared handler context
#[derive(Clone)]
pub struct ProxyState {
    http_client: reqwest::Client,
    store_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ProxyState {
    pub fn new(
        store: &StoreConfig,
        credentials: &Credentials,
    ) -> std::result::Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            store_url: store.url.trim_end_matches('/').to_string(),
            username: credentials.store_username.clone(),
            password: credentials.store_password.clone(),
        })
    }
}

/// Errors answered by the proxy itself
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("request needs to have Content-Type of 'application/json'")]
    InvalidContent,

    #[error("document store unreachable: {0}")]
    BadGateway(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            ProxyError::InvalidContent => (StatusCode::BAD_REQUEST, "InvalidContent"),
            ProxyError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "BadGateway"),
        };

        let body = Json(json!({
            "code": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Build the proxy router
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/:collection", post(create))
        .route(
            "/:collection/:id",
            get(read).put(update).delete(remove),
        )
        .with_state(state)
}

/// Serve the proxy until Ctrl-C.
pub async fn serve(state: ProxyState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| Error::from(e).context(format!("binding {bind}")))?;
    tracing::info!(address = %bind, "Proxy listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down proxy");
        })
        .await?;
    Ok(())
}

async fn create(
    State(state): State<ProxyState>,
    Path(collection): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ProxyError> {
    let path = format!("/{}", urlencoding::encode(&collection));
    forward(&state, reqwest::Method::POST, &path, query, &headers, body).await
}

async fn read(
    State(state): State<ProxyState>,
    Path((collection, id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ProxyError> {
    let path = document_path(&collection, &id);
    forward(&state, reqwest::Method::GET, &path, query, &headers, body).await
}

async fn update(
    State(state): State<ProxyState>,
    Path((collection, id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ProxyError> {
    let path = document_path(&collection, &id);
    forward(&state, reqwest::Method::PUT, &path, query, &headers, body).await
}

async fn remove(
    State(state): State<ProxyState>,
    Path((collection, id)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ProxyError> {
    let path = document_path(&collection, &id);
    forward(&state, reqwest::Method::DELETE, &path, query, &headers, body).await
}

fn document_path(collection: &str, id: &str) -> String {
    format!(
        "/{}/{}",
        urlencoding::encode(collection),
        urlencoding::encode(id)
    )
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn forward(
    state: &ProxyState,
    method: reqwest::Method,
    path: &str,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, ProxyError> {
    if !is_json(headers) {
        return Err(ProxyError::InvalidContent);
    }

    let url = match query {
        Some(q) if !q.is_empty() => format!("{}{}?{}", state.store_url, path, q),
        _ => format!("{}{}", state.store_url, path),
    };
    tracing::debug!(%method, url = %url, "Forwarding to store");

    let mut request = state
        .http_client
        .request(method, &url)
        .header(reqwest::header::CONTENT_TYPE, "application/json");
    if let Some(user) = &state.username {
        request = request.basic_auth(user, state.password.as_deref());
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await.map_err(|e| {
        tracing::error!(url = %url, error = %e, "Store request failed");
        ProxyError::BadGateway(e.to_string())
    })?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let payload = upstream
        .bytes()
        .await
        .map_err(|e| ProxyError::BadGateway(e.to_string()))?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::spawn_stub;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    /// A fake store that echoes what it received.
    fn echo_store() -> Router {
        Router::new()
            .route(
                "/:db",
                post(|Path(db): Path<String>, body: Bytes| async move {
                    let doc: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    (
                        StatusCode::CREATED,
                        Json(json!({"ok": true, "db": db, "doc": doc})),
                    )
                }),
            )
            .route(
                "/:db/:id",
                get(|Path((_, id)): Path<(String, String)>| async move {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": "not_found", "id": id})),
                    )
                })
                .put(|headers: HeaderMap, body: Bytes| async move {
                    let doc: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    let authed = headers.contains_key(header::AUTHORIZATION);
                    (
                        StatusCode::CREATED,
                        Json(json!({"ok": true, "authed": authed, "doc": doc})),
                    )
                })
                .delete(|RawQuery(query): RawQuery| async move {
                    Json(json!({"ok": true, "query": query}))
                }),
            )
    }

    async fn proxy_for(store_url: &str, user: Option<&str>) -> Router {
        let store = StoreConfig {
            url: store_url.to_string(),
            database: "unused".to_string(),
        };
        let credentials = Credentials {
            store_username: user.map(String::from),
            store_password: user.map(|_| "pw".to_string()),
            ..Default::default()
        };
        router(ProxyState::new(&store, &credentials).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_non_json_content() {
        let app = proxy_for("http://127.0.0.1:9", None).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/music/a1")
                    .header(header::CONTENT_TYPE, "text/plain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "InvalidContent");
    }

    #[tokio::test]
    async fn test_read_relays_store_status_and_body() {
        let base = spawn_stub(echo_store()).await;
        let app = proxy_for(&base, None).await;

        let response = app
            .oneshot(json_request("GET", "/music/a1", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["id"], "a1");
    }

    #[tokio::test]
    async fn test_create_forwards_body() {
        let base = spawn_stub(echo_store()).await;
        let app = proxy_for(&base, None).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/music",
                Body::from(r#"{"name":"OutKast"}"#),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["db"], "music");
        assert_eq!(body["doc"]["name"], "OutKast");
    }

    #[tokio::test]
    async fn test_update_sends_credentials() {
        let base = spawn_stub(echo_store()).await;
        let app = proxy_for(&base, Some("admin")).await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/music/a1",
                Body::from(r#"{"_rev":"1-a"}"#),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["authed"], true);
        assert_eq!(body["doc"]["_rev"], "1-a");
    }

    #[tokio::test]
    async fn test_delete_passes_revision_query() {
        let base = spawn_stub(echo_store()).await;
        let app = proxy_for(&base, None).await;

        let response = app
            .oneshot(json_request("DELETE", "/music/a1?rev=2-b", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["query"], "rev=2-b");
    }

    #[tokio::test]
    async fn test_unreachable_store_is_bad_gateway() {
        // Nothing listens on the discard port
        let app = proxy_for("http://127.0.0.1:9", None).await;

        let response = app
            .oneshot(json_request("GET", "/music/a1", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["code"], "BadGateway");
    }
}
