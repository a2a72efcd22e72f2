// Integration test for the agent: provider dispatch, error rendering and
// the tool loop, using scripted providers instead of HTTP.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use omni::agent::Agent;
use omni::cli::{AppState, QuerySession};
use omni::config::ConfigStore;
use omni::providers::{
    LlmProvider, ProviderFactory, ProviderRequest, ProviderResponse, RetryPolicy, Role,
};
use omni::tools::{ContentBlock, ToolContext};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Replays canned responses and records every request it sees
#[derive(Clone, Default)]
struct Script {
    replies: Arc<Mutex<VecDeque<Result<Vec<ContentBlock>, String>>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    created_for: Arc<Mutex<Vec<(String, String)>>>,
}

impl Script {
    fn push_text(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(vec![ContentBlock::text(text)]));
    }

    fn push_blocks(&self, blocks: Vec<ContentBlock>) {
        self.replies.lock().unwrap().push_back(Ok(blocks));
    }

    fn push_error(&self, error: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct ScriptedProvider {
    name: String,
    script: Script,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.script.requests.lock().unwrap().push(request.clone());
        let next = self
            .script
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        match next {
            Ok(content) => Ok(ProviderResponse {
                id: "resp".to_string(),
                model: request.model.clone(),
                content,
                stop_reason: Some("end_turn".to_string()),
                provider: self.name.clone(),
            }),
            Err(e) => Err(anyhow!(e)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "scripted"
    }
}

impl ProviderFactory for Script {
    fn create(&self, name: &str, api_key: &str) -> Result<Box<dyn LlmProvider>> {
        self.created_for
            .lock()
            .unwrap()
            .push((name.to_string(), api_key.to_string()));
        Ok(Box::new(ScriptedProvider {
            name: name.to_string(),
            script: self.clone(),
        }))
    }
}

fn configured_store() -> (TempDir, ConfigStore) {
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::at(dir.path().join("omni"));
    store.init().unwrap();
    store.update_provider_api_key("openai", "sk-test").unwrap();
    store
        .update_initialization_state("completion", true, None)
        .unwrap();
    (dir, store)
}

fn agent(store: &ConfigStore, script: &Script) -> Agent {
    Agent::with_factory(store.clone(), Arc::new(script.clone()))
        .with_retry_policy(RetryPolicy::immediate(1))
}

#[tokio::test]
async fn test_reply_uses_default_model_and_prompt() {
    let (_dir, store) = configured_store();
    let script = Script::default();
    script.push_text("Hello!");

    let reply = agent(&store, &script).respond("hi", &[], None, None).await;
    assert_eq!(reply, "Hello!");

    assert_eq!(
        script.created_for.lock().unwrap().as_slice(),
        &[("openai".to_string(), "sk-test".to_string())]
    );

    let requests = script.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o");
    assert_eq!(
        requests[0].system.as_deref(),
        Some("You are a helpful assistant powered by GPT-4o.")
    );

    let messages = &requests[0].messages;
    assert_eq!(messages.first().unwrap().role, Role::System);
    assert_eq!(messages.last().unwrap().role, Role::User);
    assert_eq!(messages.last().unwrap().text(), "hi");
}

#[tokio::test]
async fn test_provider_failure_becomes_reply_text() {
    let (_dir, store) = configured_store();
    let script = Script::default();
    script.push_error("rate limited");

    let app = {
        let mut app = AppState::new(store.clone());
        app.load().unwrap();
        app
    };
    let mut session = QuerySession::new(&app).unwrap();
    session.set_input("hello");
    let request = session.submit().unwrap();

    let reply = agent(&store, &script)
        .respond(
            &request.query,
            &request.messages,
            Some(request.model.as_str()),
            Some(request.provider.as_str()),
        )
        .await;
    assert!(reply.starts_with("An error occurred while generating the response"));
    assert!(reply.contains("rate limited"));

    session.apply_reply(request.query, reply);
    assert!(!session.is_loading());
    session.set_input("again");
    assert!(session.submit().is_some());
}

#[tokio::test]
async fn test_missing_api_key_is_reported() {
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::at(dir.path().join("omni"));
    store.init().unwrap();
    let script = Script::default();

    let reply = agent(&store, &script).respond("hi", &[], None, None).await;
    assert!(reply.contains("No API key found for provider: openai"));
    assert!(reply.contains("omni config"));
    assert!(script.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_model_is_reported() {
    let (_dir, store) = configured_store();
    let script = Script::default();

    let reply = agent(&store, &script)
        .respond("hi", &[], Some("no-such-model"), None)
        .await;
    assert!(reply.contains("no-such-model"));
    assert!(script.requests().is_empty());
}

#[tokio::test]
async fn test_tool_calls_run_before_final_answer() {
    let (_dir, store) = configured_store();
    let workspace = TempDir::new().unwrap();
    std::fs::write(workspace.path().join("notes.txt"), "remember the milk").unwrap();

    let script = Script::default();
    script.push_blocks(vec![
        ContentBlock::text("Let me look."),
        ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "view".to_string(),
            input: serde_json::json!({"path": "notes.txt"}),
        },
    ]);
    script.push_text("The note says to remember the milk.");

    let reply = agent(&store, &script)
        .with_tool_context(ToolContext::new(workspace.path()))
        .respond("what does notes.txt say?", &[], None, None)
        .await;
    assert_eq!(reply, "The note says to remember the milk.");

    let requests = script.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tools.is_some());

    let last = requests[1].messages.last().unwrap();
    assert_eq!(last.role, Role::User);
    let result = last
        .content
        .iter()
        .find_map(|block| match block {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } if tool_use_id == "call_1" => Some(content.clone()),
            _ => None,
        })
        .unwrap();
    assert!(result.contains("remember the milk"));
}
