//! `HyperClient` against a wiremock server.

use std::time::Duration;

use assert2::{check, let_assert};
use serde::{Deserialize, Serialize};
use sprig::{ErrorKind, HttpClient, HyperClient, Method, Request};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
}

fn url(server: &MockServer, path: &str) -> url::Url {
    url::Url::parse(&format!("{}{path}", server.uri())).expect("url")
}

#[tokio::test]
async fn test_get_request() {
    let server = MockServer::start().await;
    let user = User {
        id: 1,
        name: "Alice".to_string(),
    };

    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&user)
                .insert_header("X-Total", "1"),
        )
        .mount(&server)
        .await;

    let client = HyperClient::new();
    let request = Request::builder(Method::Get, url(&server, "/users/1"))
        .header("Accept", "application/json")
        .build();

    let_assert!(Ok(response) = client.execute(request).await);
    check!(response.is_success());
    check!(response.header("x-total") == Some("1"));
    check!(response.url().path() == "/users/1");

    let body: User = serde_json::from_slice(response.body()).expect("json");
    check!(body == user);
}

#[tokio::test]
async fn test_post_request_with_json_body() {
    let server = MockServer::start().await;
    let input = User {
        id: 0,
        name: "Bob".to_string(),
    };

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = HyperClient::new();
    let request = Request::builder(Method::Post, url(&server, "/users"))
        .json(&input)
        .expect("json body")
        .build();

    let_assert!(Ok(response) = client.execute(request).await);
    check!(response.status() == 201);
}

#[tokio::test]
async fn test_http_error_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = HyperClient::new();
    let request = Request::builder(Method::Get, url(&server, "/missing")).build();

    let_assert!(Ok(response) = client.execute(request).await);
    check!(!response.is_success());
    check!(response.status() == 404);
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HyperClient::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .expect("client");
    let request = Request::builder(Method::Get, url(&server, "/slow")).build();

    let_assert!(Err(error) = client.execute(request).await);
    check!(error.is_timeout());
}

#[tokio::test]
async fn test_connection_refused() {
    let client = HyperClient::builder()
        .connect_timeout(Duration::from_millis(200))
        .build()
        .expect("client");
    let request = Request::builder(Method::Get, url::Url::parse("http://127.0.0.1:9/").expect("url")).build();

    let_assert!(Err(error) = client.execute(request).await);
    check!(error.kind() == ErrorKind::Connection);
}

#[tokio::test]
async fn test_logging_layers_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HyperClient::builder()
        .with_logging()
        .with_debug_logging()
        .build()
        .expect("client");
    let request = Request::builder(Method::Head, url(&server, "/health")).build();

    let_assert!(Ok(response) = client.execute(request).await);
    check!(response.status() == 200);
    check!(response.body().is_empty());
}
