//! HTTP API tests against the real router on an ephemeral port.

use autotranslate::client::ApiClient;
use autotranslate::error::{AutotranslateError, ErrorKind};
use autotranslate::server::{router, AppState};
use autotranslate::translate::mock::{MockMode, MockProvider};
use autotranslate::translate::{AutomaticTranslator, Provider, TranslationOptions};
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    url: String,
    first: Arc<MockProvider>,
    second: Arc<MockProvider>,
}

async fn start(first_mode: MockMode) -> TestServer {
    let first = Arc::new(MockProvider::new("Alpha", first_mode));
    let second = Arc::new(MockProvider::new("Beta", MockMode::Suffix));
    let translator = AutomaticTranslator::new(vec![
        Arc::clone(&first) as Arc<dyn Provider>,
        Arc::clone(&second) as Arc<dyn Provider>,
    ]);

    let app = router(AppState::new(Arc::new(translator)).with_concurrency(2));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        url: format!("http://{}", addr),
        first,
        second,
    }
}

async fn post(url: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

// ============================================================================
// Routes
// ============================================================================

mod route_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let server = start(MockMode::Suffix).await;
        let body: Value = reqwest::get(format!("{}/health", server.url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["providers"], json!(["Alpha", "Beta"]));
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_translate() {
        let server = start(MockMode::Suffix).await;
        let (status, body) = post(
            &format!("{}/translate", server.url),
            json!({"text": "Hello", "targetLanguage": "es", "chunkSize": "50"}),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"success": true, "translatedText": "Hello_es", "provider": "Alpha", "chunks": 1})
        );
    }

    #[tokio::test]
    async fn test_translate_validation() {
        let server = start(MockMode::Suffix).await;
        let url = format!("{}/translate", server.url);

        let (status, body) = post(&url, json!({"targetLanguage": "es"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Text is required and must be a string");

        let (status, body) = post(&url, json!({"text": 42, "targetLanguage": "es"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Text is required and must be a string");

        let (status, body) = post(&url, json!({"text": "Hello"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "targetLanguage is required and must be a string");

        assert_eq!(server.first.calls(), 0);
    }

    #[tokio::test]
    async fn test_translate_failure_is_500() {
        let server = start(MockMode::Suffix).await;
        server.first.set_available(false);
        server.second.set_available(false);

        let (status, body) = post(
            &format!("{}/translate", server.url),
            json!({"text": "Hello", "targetLanguage": "es"}),
        )
        .await;

        assert_eq!(status, 500);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("All translation providers failed"));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_400() {
        let server = start(MockMode::Suffix).await;
        let (status, body) = post(
            &format!("{}/translate", server.url),
            json!({"text": "Hello", "targetLanguage": "es", "provider": "Nonexistent"}),
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(
            body["error"],
            "Provider \"Nonexistent\" not found. Available providers: Alpha, Beta"
        );
    }

    #[tokio::test]
    async fn test_batch() {
        let server = start(MockMode::Suffix).await;
        let url = format!("{}/translate/batch", server.url);

        let (status, body) = post(
            &url,
            json!({"texts": ["one", "two"], "targetLanguage": "fr"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["results"][0]["translatedText"], "one_fr");
        assert_eq!(body["results"][1]["translatedText"], "two_fr");

        let (status, body) = post(&url, json!({"texts": "one", "targetLanguage": "fr"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "texts must be an array of strings");

        let (status, _) = post(&url, json!({"texts": ["one", 2], "targetLanguage": "fr"})).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_reset_and_listing() {
        let server = start(MockMode::Fail(ErrorKind::RateLimit)).await;

        let (status, _) = post(
            &format!("{}/translate", server.url),
            json!({"text": "Hello", "targetLanguage": "es"}),
        )
        .await;
        assert_eq!(status, 200);

        let all: Value = reqwest::get(format!("{}/providers/all", server.url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all["total"], 2);
        assert_eq!(all["available"], 1);
        assert_eq!(all["providers"][0], json!({"name": "Alpha", "available": false}));

        let (status, body) = post(&format!("{}/providers/reset", server.url), json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Providers reset successfully");
        assert_eq!(body["providers"], json!(["Beta"]));
    }
}

// ============================================================================
// ApiClient against the running server
// ============================================================================

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_client_translate_with_provider() {
        let server = start(MockMode::Suffix).await;
        let client = ApiClient::new(&server.url);

        let result = client
            .translate("Hello", &TranslationOptions::new("de").with_provider("beta"))
            .await
            .unwrap();

        assert_eq!(result.translated_text, "Hello_de");
        assert_eq!(result.provider, "Beta");
        assert_eq!(server.first.calls(), 0);
    }

    #[tokio::test]
    async fn test_client_surfaces_server_error() {
        let server = start(MockMode::Suffix).await;
        let client = ApiClient::new(&server.url);

        let err = client
            .translate("Hello", &TranslationOptions::new("de").with_provider("Gamma"))
            .await
            .unwrap_err();

        match err {
            AutotranslateError::Api(message) => {
                assert!(message.starts_with("Provider \"Gamma\" not found"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_listing_and_reset() {
        let server = start(MockMode::Suffix).await;
        server.second.set_available(false);
        let client = ApiClient::new(format!("{}/", server.url));

        assert_eq!(client.list_available().await.unwrap(), vec!["Alpha".to_string()]);

        let all = client.list_all().await.unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.available, 1);
        assert!(!all.providers[1].available);

        assert_eq!(client.reset().await.unwrap(), vec!["Alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_client_connection_refused() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client.list_available().await.unwrap_err();
        assert!(matches!(err, AutotranslateError::Http(_)));
    }
}
