//! Test utilities shared by the HTTP client tests.
//!
//! # Example
//!
//! ```ignore
//! use rapgraff::test_utils::spawn_stub;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = Router::new().route("/", get(|| async { "ok" }));
//!     let base_url = spawn_stub(app).await;
//!     // point a client at base_url
//! }
//! ```

use axum::Router;

/// Serves `app` on an ephemeral localhost port for the rest of the test.
///
/// Returns the base URL, e.g. `http://127.0.0.1:41234`.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = listener.local_addr().expect("Stub listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_spawn_stub_serves_router() {
        let app = Router::new().route("/ping", get(|| async { "pong" }));
        let base = spawn_stub(app).await;

        let body = reqwest::get(format!("{base}/ping"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");
    }
}
