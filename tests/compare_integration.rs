use serde_json::json;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentctl::compare::{compare, ModelSpec};
use agentctl::config::{Config, ProviderConfig};
use agentctl::providers::Message;

async fn mock_openai(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2}
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_failing_target_is_isolated() {
    let server = mock_openai("TCP is a transport protocol").await;

    let mut config = Config::default();
    config.providers.insert(
        "openai".to_string(),
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: Some(server.uri()),
            ..Default::default()
        },
    );
    // Nothing listens on port 9, so the ollama target fails
    config.providers.insert(
        "ollama".to_string(),
        ProviderConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        },
    );

    let specs = ModelSpec::parse_list("openai:gpt-4o,ollama:unknown-model", "anthropic");
    let outcomes = compare(&config, &specs, &[Message::user("Explain TCP")]).await;

    assert_eq!(outcomes.len(), 2);

    // Outcomes come back in input order
    assert_eq!(outcomes[0].spec.label(), "openai:gpt-4o");
    let response = outcomes[0].result.as_ref().unwrap();
    assert_eq!(response.content, "TCP is a transport protocol");
    assert_eq!(response.model, "gpt-4o");

    assert_eq!(outcomes[1].spec.label(), "ollama:unknown-model");
    let err = outcomes[1].result.as_ref().unwrap_err();
    assert!(err.to_string().starts_with("Transport error"));
}

#[tokio::test]
async fn test_bare_model_name_uses_default_provider() {
    let server = mock_openai("hello").await;

    let mut config = Config::default();
    config.defaults.provider = "openai".to_string();
    config.providers.insert(
        "openai".to_string(),
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: Some(server.uri()),
            ..Default::default()
        },
    );

    let specs = ModelSpec::parse_list("gpt-4o-mini", "openai");
    let outcomes = compare(&config, &specs, &[Message::user("hi")]).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].spec.provider, "openai");
    let response = outcomes[0].result.as_ref().unwrap();
    assert_eq!(response.model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_unknown_provider_prefix_fails_only_that_pair() {
    let server = mock_openai("ok").await;

    let mut config = Config::default();
    config.providers.insert(
        "openai".to_string(),
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: Some(server.uri()),
            ..Default::default()
        },
    );

    let specs = ModelSpec::parse_list("mistral:large,openai:gpt-4o", "openai");
    let outcomes = compare(&config, &specs, &[Message::user("hi")]).await;

    let err = outcomes[0].result.as_ref().unwrap_err();
    assert!(err
        .to_string()
        .contains("Unknown provider 'mistral'. Available: anthropic, ollama, openai"));
    assert!(outcomes[1].result.is_ok());
}
