#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower::ServiceExt;

use server::routes;
use server::state::ServerState;

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database = models::db::sqlite_memory_config();
    cfg
}

/// Router over a private in-memory database.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<(Router, DatabaseConnection)> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    let app = routes::build_router(ServerState::new(db.clone(), cfg));
    Ok((app, db))
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> anyhow::Result<Response<Body>> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    Ok(app.clone().oneshot(req.body(Body::empty())?).await?)
}

pub async fn body_text(resp: Response<Body>) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Status and body of a GET.
pub async fn call(app: &Router, uri: &str, cookie: Option<&str>) -> anyhow::Result<(StatusCode, String)> {
    let resp = get(app, uri, cookie).await?;
    let status = resp.status();
    Ok((status, body_text(resp).await?))
}

/// `name=value` of the session cookie set by a login response.
pub fn session_cookie_pair(resp: &Response<Body>) -> Option<String> {
    let raw = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(|s| s.trim().to_string())
}
