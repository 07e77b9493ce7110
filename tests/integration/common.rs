use pcq::config::{AppConfig, ENV_ACCESS_KEY, ENV_API_URL, ENV_SECRET_KEY};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_KEY: &str = "int-access-key";
pub const SECRET_KEY: &str = "int-secret-key";
pub const PRIMARY_TOKEN: &str = "int-primary-token";
pub const COMPUTE_TOKEN: &str = "int-compute-token";

/// Configuration pointing at the mock server.
pub fn config_for(server: &MockServer) -> AppConfig {
    let uri = server.uri();
    AppConfig::from_lookup(move |name| match name {
        n if n == ENV_API_URL => Some(uri.clone()),
        n if n == ENV_ACCESS_KEY => Some(ACCESS_KEY.to_string()),
        n if n == ENV_SECRET_KEY => Some(SECRET_KEY.to_string()),
        _ => None,
    })
    .expect("complete test configuration")
}

fn login_body() -> serde_json::Value {
    json!({"username": ACCESS_KEY, "password": SECRET_KEY})
}

/// Mount `POST /login` answering with the primary token.
pub async fn mount_primary_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(login_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": PRIMARY_TOKEN})))
        .mount(server)
        .await;
}

/// Mount `meta_info` pointing at `/compute` on the same server, and the
/// Compute login behind it.
pub async fn mount_compute(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/meta_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "twistlockUrl": format!("{}/compute", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/api/v1/authenticate"))
        .and(body_json(login_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": COMPUTE_TOKEN})))
        .mount(server)
        .await;
}
