//! Integration tests for the LLM layer
//!
//! Validates the HTTP providers, the LLM-backed policy evaluator and the
//! LLM-backed agent invoker against mock servers.

use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use roundtable_engine::agent::LlmAgentInvoker;
use roundtable_engine::config::{Config, OpenAIConfig, PolicyMode};
use roundtable_engine::handlers::build_orchestrator;
use roundtable_engine::llm::{
    ChatMessage, LLMError, LLMProvider, OllamaProvider, OpenAIProvider,
};
use roundtable_engine::orchestrator::RunStatus;
use roundtable_engine::participants::ParticipantSet;
use roundtable_engine::policy::LlmPolicyEvaluator;
use sdk::collaborator::{AgentInvoker, Criterion, PolicyEvaluator};
use sdk::errors::{InvocationError, PolicyError};
use sdk::types::{Message, ParticipantId, Speaker};

fn ollama_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.1:8b",
        "created_at": "2023-08-04T19:22:45.499127Z",
        "message": {
            "role": "assistant",
            "content": content
        },
        "done": true
    })
}

fn openai_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn openai_provider(server: &MockServer) -> OpenAIProvider {
    let config = OpenAIConfig {
        base_url: server.uri(),
        model: "gpt-4o-mini".to_string(),
        api_key_env: "ROUNDTABLE_TEST_UNSET_KEY".to_string(),
        api_key_header: Some("api-key".to_string()),
    };
    OpenAIProvider::new(config).with_api_key("sk-test")
}

fn team() -> ParticipantSet {
    ParticipantSet::default_team("%APPR%").unwrap()
}

#[tokio::test]
async fn test_openai_provider_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("api-key", "sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("hi")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = openai_provider(&server);
    let reply = provider
        .generate(&[ChatMessage::system("be brief"), ChatMessage::user("hello")])
        .await
        .unwrap();

    assert_eq!(reply, "hi");
}

#[tokio::test]
async fn test_openai_error_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider = openai_provider(&server);
    let messages = [ChatMessage::user("hello")];

    let err = provider.generate(&messages).await.unwrap_err();
    assert!(matches!(err, LLMError::RateLimitExceeded));

    let err = provider.generate(&messages).await.unwrap_err();
    assert!(matches!(err, LLMError::AuthenticationFailed(body) if body == "bad key"));
}

#[tokio::test]
async fn test_openai_rejects_response_without_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = openai_provider(&server)
        .generate(&[ChatMessage::user("hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_ollama_provider_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "llama3.1:8b", "stream": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("Hello!")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    assert!(provider.check_health().await);
    let reply = provider.generate(&[ChatMessage::user("hi")]).await.unwrap();
    assert_eq!(reply, "Hello!");
}

#[tokio::test]
async fn test_ollama_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    let err = provider.generate(&[ChatMessage::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LLMError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_llm_evaluator_returns_trimmed_decision() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply(" SoftwareEngineer\n")))
        .mount(&server)
        .await;

    let provider = Arc::new(OllamaProvider::new(server.uri(), "llama3.1:8b"));
    let evaluator = LlmPolicyEvaluator::new(provider, team(), "%APPR%");

    let history = vec![Message::new(
        Speaker::Participant(ParticipantId::new("BusinessAnalyst")),
        "Requirements",
        1,
    )];
    let decision = evaluator
        .classify(&history, Criterion::NextSpeaker)
        .await
        .unwrap();
    assert_eq!(decision.as_str(), "SoftwareEngineer");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert_eq!(body["messages"][0]["role"], "user");
    assert!(prompt.contains("Never choose the participant named in the RESPONSE."));
    assert!(prompt.ends_with("RESPONSE:\nBusinessAnalyst: Requirements"));
}

#[tokio::test]
async fn test_llm_evaluator_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = Arc::new(OllamaProvider::new(server.uri(), "llama3.1:8b"));
    let evaluator = LlmPolicyEvaluator::new(provider, team(), "%APPR%");

    let history = vec![Message::new(Speaker::User, "Build a todo app", 0)];
    let err = evaluator
        .classify(&history, Criterion::Approval)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::Provider(_)));
}

#[tokio::test]
async fn test_llm_agent_invoker_sends_persona() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("Plan: ...")))
        .mount(&server)
        .await;

    let invoker = LlmAgentInvoker::new(Arc::new(openai_provider(&server)), team());
    let history = vec![Message::new(Speaker::User, "Build a todo app", 0)];

    let reply = invoker
        .invoke(&ParticipantId::new("BusinessAnalyst"), &history)
        .await
        .unwrap();
    assert_eq!(reply, "Plan: ...");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .starts_with("You are a Business Analyst"));
    assert_eq!(messages[1]["content"], "user: Build a todo app");
}

#[tokio::test]
async fn test_llm_agent_invoker_empty_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("   ")))
        .mount(&server)
        .await;

    let invoker = LlmAgentInvoker::new(Arc::new(openai_provider(&server)), team());
    let history = vec![Message::new(Speaker::User, "Build a todo app", 0)];

    let err = invoker
        .invoke(&ParticipantId::new("ProductOwner"), &history)
        .await
        .unwrap_err();
    assert!(matches!(err, InvocationError::EmptyReply(name) if name == "ProductOwner"));
}

#[tokio::test]
async fn test_full_collaboration_over_ollama() {
    let server = MockServer::start().await;

    // Every participant answers with the approval token; the rule evaluator
    // still walks the full cycle before accepting it.
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("Done. %APPR%")))
        .mount(&server)
        .await;

    let mut config = Config::default_config();
    config.llm.default_provider = "ollama".to_string();
    config.llm.ollama.base_url = server.uri();
    assert_eq!(config.collaboration.policy, PolicyMode::Rule);

    let provider: Arc<dyn LLMProvider> =
        Arc::new(OllamaProvider::new(server.uri(), "llama3.1:8b"));
    let orchestrator = build_orchestrator(&config, provider).unwrap();

    let outcome = orchestrator.run_collaboration("Build a todo app").await;

    assert_eq!(outcome.status, RunStatus::Terminated);
    assert_eq!(outcome.turns, 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_full_collaboration_with_llm_policy() {
    let server = MockServer::start().await;

    // Classifier prompts start with "Examine"; agent requests carry a system persona
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "user" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("BusinessAnalyst")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "system" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("Requirements")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("BusinessAnalyst")))
        .mount(&server)
        .await;

    let mut config = Config::default_config();
    config.collaboration.policy = PolicyMode::Llm;
    let provider: Arc<dyn LLMProvider> =
        Arc::new(OllamaProvider::new(server.uri(), "llama3.1:8b"));
    let orchestrator = build_orchestrator(&config, provider).unwrap();

    let outcome = orchestrator.run_collaboration("Build a todo app").await;

    // The classifier keeps naming the analyst, who just spoke
    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.transcript[0].content, "Requirements");
    assert!(outcome.transcript[1]
        .content
        .contains("turn selection chose BusinessAnalyst, who spoke last"));
}
