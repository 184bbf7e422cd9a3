use httpmock::prelude::*;
use serde_json::json;
use twitter_search::core::auth::{encode_basic_credentials, obtain_bearer_token};
use twitter_search::core::http::ReqwestBackend;
use twitter_search::domain::options::HttpOptions;
use twitter_search::SearchError;

fn backend() -> ReqwestBackend {
    ReqwestBackend::new(&HttpOptions {
        retry_attempts: 0,
        ..HttpOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_token_request_uses_basic_auth_and_client_credentials() {
    let server = MockServer::start();
    let expected = format!("Basic {}", encode_basic_credentials("app-key", "app-secret"));
    let token_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/oauth2/token")
            .header("authorization", expected.as_str())
            .body("grant_type=client_credentials");
        then.status(200)
            .json_body(json!({"token_type": "bearer", "access_token": "AAAAbearer"}));
    });

    let token = obtain_bearer_token(&backend(), &server.base_url(), "app-key", "app-secret")
        .await
        .unwrap();

    token_mock.assert();
    assert_eq!(token.as_str(), "AAAAbearer");
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(403).json_body(json!({
            "errors": [{"code": 99, "label": "authenticity_token_error", "message": "Unable to verify your credentials"}]
        }));
    });

    let err = obtain_bearer_token(&backend(), &server.base_url(), "bad", "creds")
        .await
        .unwrap_err();

    match err {
        SearchError::ApiRequestFailed {
            status, message, ..
        } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Unable to verify your credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_response_without_access_token() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/oauth2/token");
        then.status(200).json_body(json!({"token_type": "bearer"}));
    });

    let err = obtain_bearer_token(&backend(), &server.base_url(), "key", "secret")
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::AuthenticationError { .. }));
}
