mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use config::Config;

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

const FALLBACK_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Laquila</title></head>
<body>
<h1>Laquila</h1>
<p>Frontend not built yet. Run <code>dx build --release</code> and point DIST_DIR at the output.</p>
</body>
</html>"#;

/// Build the full application router.
fn build_app(config: Arc<Config>) -> Router {
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.static_dir, CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(&config.dist_dir, CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(serve_index))
        .fallback(serve_index)
        .with_state(config)
        .merge(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn serve_index(State(config): State<Arc<Config>>) -> Html<String> {
    // Serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(config.index_path()).await {
        Ok(html) => Html(html),
        Err(e) => {
            tracing::warn!(path = %config.index_path().display(), "index unavailable: {e}");
            Html(FALLBACK_INDEX.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        dist = %config.dist_dir.display(),
        static_dir = %config.static_dir.display(),
        "Server running at http://localhost:{}",
        config.port
    );

    let app = build_app(config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use tower::ServiceExt;

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        dir
    }

    fn test_app(static_dir: &Path, dist_dir: &Path) -> Router {
        build_app(Arc::new(Config {
            port: 0,
            dist_dir: dist_dir.to_path_buf(),
            static_dir: static_dir.to_path_buf(),
        }))
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = tempfile::tempdir().unwrap();
        let resp = get(test_app(static_dir.path(), dist_dir.path()), "/healthz").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "ok");
    }

    #[tokio::test]
    async fn test_root_serves_built_index() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = temp_dir_with_file("index.html", "<html>laquila bundle</html>");
        let resp = get(test_app(static_dir.path(), dist_dir.path()), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "<html>laquila bundle</html>");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_index() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = temp_dir_with_file("index.html", "<html>spa</html>");
        let resp = get(test_app(static_dir.path(), dist_dir.path()), "/some/deep/link").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "<html>spa</html>");
    }

    #[tokio::test]
    async fn test_missing_bundle_serves_placeholder_page() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = tempfile::tempdir().unwrap();
        let resp = get(test_app(static_dir.path(), dist_dir.path()), "/").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_static_assets_have_1day_cache() {
        let static_dir = temp_dir_with_file("favicon.svg", "<svg/>");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");

        let resp = get(test_app(static_dir.path(), dist_dir.path()), "/static/favicon.svg").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = temp_dir_with_file("laquila-frontend-abc123.js", "bundle()");

        let resp = get(
            test_app(static_dir.path(), dist_dir.path()),
            "/dist/laquila-frontend-abc123.js",
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_dist_assets_have_immutable_cache() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = temp_dir_with_file("assets/main-xyz.css", "body{}");

        let resp = get(
            test_app(static_dir.path(), dist_dir.path()),
            "/assets/main-xyz.css",
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let static_dir = temp_dir_with_file("favicon.svg", "<svg/>");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");

        let resp = get(
            test_app(static_dir.path(), dist_dir.path()),
            "/static/nonexistent.txt",
        )
        .await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_is_permissive() {
        let static_dir = tempfile::tempdir().unwrap();
        let dist_dir = tempfile::tempdir().unwrap();
        let app = test_app(static_dir.path(), dist_dir.path());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header("origin", "http://elsewhere.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[test]
    fn test_index_path_follows_dist_dir() {
        let config = Config {
            port: 0,
            dist_dir: PathBuf::from("/srv/app"),
            static_dir: PathBuf::from("/srv/static"),
        };
        assert_eq!(config.index_path(), PathBuf::from("/srv/app/index.html"));
    }
}
