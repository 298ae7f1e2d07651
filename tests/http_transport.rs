//! HTTP transport and token exchange against a mocked JumpServer.

use jumpserver_provider::{
    ApiRequest, AuthenticatedTransport, Credentials, HttpTransport, ProviderError, Session,
    Transport, TransportError, acquire_token,
};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> HttpTransport {
    HttpTransport::new().expect("client should build")
}

#[tokio::test]
async fn token_exchange_posts_json_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authentication/auth/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"username": "admin", "password": "s3cret"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"token": "tok-1", "keyword": "Bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = acquire_token(&http(), &server.uri(), &Credentials::new("admin", "s3cret"))
        .await
        .expect("token should be issued");

    assert_eq!(token, "tok-1");
}

#[tokio::test]
async fn token_exchange_rejects_html_error_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/authentication/auth/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = acquire_token(&http(), &server.uri(), &Credentials::new("admin", "s3cret"))
        .await
        .expect_err("html is not a token response");

    assert!(matches!(err, ProviderError::Authentication { .. }));
}

#[tokio::test]
async fn authenticated_get_carries_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/assets/hosts/abc/"))
        .and(bearer_token("tok-1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = AuthenticatedTransport::new(http(), Session::new(server.uri(), "tok-1"))
        .expect("session is valid");
    let response = transport
        .send(ApiRequest::get(transport.url("/api/v1/assets/hosts/abc/")))
        .await
        .expect("request should be delivered");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), r#"{"id":"abc"}"#);
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/assets/hosts/abc/"))
        .respond_with(ResponseTemplate::new(409).set_body_string("in use"))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_client(reqwest::Client::new());
    let response = transport
        .send(ApiRequest::delete(format!(
            "{}/api/v1/assets/hosts/abc/",
            server.uri()
        )))
        .await
        .expect("a 409 is still a delivered response");

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.text(), "in use");
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let url = format!("http://{addr}/api/v1/assets/hosts/");

    let err = http()
        .send(ApiRequest::get(url.clone()))
        .await
        .expect_err("nothing listens on the port");

    assert!(
        matches!(err, TransportError::Request { ref method, url: ref failed, .. } if method == "GET" && *failed == url),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn token_exchange_with_unreachable_server_fails_authentication() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = acquire_token(
        &http(),
        &format!("http://{addr}"),
        &Credentials::new("admin", "s3cret"),
    )
    .await
    .expect_err("nothing listens on the port");

    assert!(
        matches!(err, ProviderError::Authentication { .. }),
        "unexpected error: {err:?}"
    );
    assert!(!err.to_string().contains("s3cret"));
}
