mod common;

use std::net::SocketAddr;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode as HttpStatusCode;
use tokio::net::TcpListener;

use common::{build_app, test_config};

struct TestApp {
    base_url: String,
    client: reqwest::Client,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let (app, _db) = build_app(&test_config()).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        let svc = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, svc).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, client: reqwest::Client::new() })
}

impl TestApp {
    async fn get(&self, path: &str, cookie: Option<&str>) -> anyhow::Result<reqwest::Response> {
        let mut req = self.client.get(format!("{}{}", self.base_url, path)).header("user-agent", "e2e-test");
        // the session cookie is Secure, so a cookie store would not send it over plain http
        if let Some(c) = cookie {
            req = req.header(COOKIE, c);
        }
        Ok(req.send().await?)
    }
}

#[tokio::test]
async fn e2e_bank_session_over_socket() -> anyhow::Result<()> {
    let app = start_server().await?;

    let resp = app.get("/register?user=alice&pass=secret", None).await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    assert_eq!(resp.text().await?, "Account created for user alice\n");

    let resp = app.get("/login?user=alice&pass=secret", None).await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    let cookie = resp
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("session cookie");

    let resp = app.get("/manage?action=deposit&amount=12.99", Some(&cookie)).await?;
    assert_eq!(resp.text().await?, "Deposited 12. balance=12\n");
    let resp = app.get("/manage?action=balance", Some(&cookie)).await?;
    assert_eq!(resp.text().await?, "balance=12\n");

    let resp = app.get("/logout", Some(&cookie)).await?;
    assert_eq!(resp.text().await?, "Logged out\n");

    let resp = app.get("/manage?action=balance", Some(&cookie)).await?;
    assert_eq!(resp.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn e2e_health_and_metrics() -> anyhow::Result<()> {
    let app = start_server().await?;

    let resp = app.get("/health", None).await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["status"], "ok");

    let resp = app.get("/metrics", None).await?;
    assert_eq!(resp.status(), HttpStatusCode::OK);
    Ok(())
}
