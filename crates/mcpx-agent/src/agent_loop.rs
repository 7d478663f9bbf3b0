//! Bounded tool-calling loop.
//!
//! The model is offered a toolbox and called repeatedly. Every tool call the
//! model makes counts as one step, whether or not it succeeds. The loop ends
//! when the terminal tool is called, when the model answers without tool
//! calls, or when the step budget is spent.

use serde_json::{Map, Value};

use crate::error::AgentError;
use crate::model::{ChatMessage, ModelClient};
use crate::toolbox::Toolbox;

/// Step budget used by `install`.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Text reported when the budget runs out.
pub const MAX_STEPS_MESSAGE: &str = "Agent reached maximum steps without a result.";

/// Progress callbacks.
pub trait AgentObserver {
    /// Called before each tool call is executed, with the 1-based step.
    /// Unparseable arguments are reported as an empty object.
    fn on_step(&mut self, step: usize, name: &str, arguments: &Map<String, Value>);

    /// Called with the model's final text, or with the budget message.
    fn on_text(&mut self, text: &str);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl AgentObserver for SilentObserver {
    fn on_step(&mut self, _step: usize, _name: &str, _arguments: &Map<String, Value>) {}
    fn on_text(&mut self, _text: &str) {}
}

/// The opening conversation and budget for one run.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub max_steps: usize,
}

impl AgentRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

fn parse_arguments(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Run the loop. Returns the terminal tool's arguments, or `None` when the
/// model gave up or the budget ran out.
///
/// Only model endpoint failures are errors; tool problems are fed back to
/// the model as tool results.
pub async fn run_agent_loop(
    model: &dyn ModelClient,
    request: &AgentRequest,
    toolbox: &Toolbox,
    observer: &mut dyn AgentObserver,
) -> Result<Option<Value>, AgentError> {
    let specs = toolbox.specs();
    let mut messages = vec![
        ChatMessage::system(request.system_prompt.clone()),
        ChatMessage::user(request.user_message.clone()),
    ];
    let mut step = 0usize;

    while step < request.max_steps {
        let response = model.complete(&messages, &specs).await?;

        if response.tool_calls.is_empty() {
            if let Some(text) = response.content.as_deref().filter(|t| !t.is_empty()) {
                observer.on_text(text);
            }
            return Ok(None);
        }

        messages.push(ChatMessage::assistant_tool_calls(
            response.content.clone(),
            &response.tool_calls,
        ));

        for call in &response.tool_calls {
            step += 1;
            if step > request.max_steps {
                break;
            }

            let arguments = match parse_arguments(&call.arguments) {
                Ok(arguments) => arguments,
                Err(reason) => {
                    tracing::debug!(step, tool = %call.name, %reason, "Unparseable tool arguments");
                    observer.on_step(step, &call.name, &Map::new());
                    messages.push(ChatMessage::tool_result(
                        &call.id,
                        format!("Invalid JSON arguments: {reason}"),
                    ));
                    continue;
                }
            };

            observer.on_step(step, &call.name, &arguments);

            if call.name == toolbox.terminal() {
                return Ok(Some(Value::Object(arguments)));
            }

            let Some(executor) = toolbox.get(&call.name).and_then(|t| t.executor.as_deref())
            else {
                messages.push(ChatMessage::tool_result(
                    &call.id,
                    format!("Unknown tool: {}", call.name),
                ));
                continue;
            };

            let result = match executor.execute(&arguments).await {
                Ok(output) => output,
                Err(e) => format!("Error executing {}: {e}", call.name),
            };
            tracing::debug!(step, tool = %call.name, bytes = result.len(), "Tool finished");
            messages.push(ChatMessage::tool_result(&call.id, result));
        }
    }

    observer.on_text(MAX_STEPS_MESSAGE);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::{ModelResponse, Role, ToolCallRequest, ToolSpec};
    use crate::toolbox::{ToolDef, ToolExecutor};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned turns and records every conversation it was sent.
    struct ScriptedModel {
        turns: Mutex<VecDeque<ModelResponse>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<ModelResponse>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last_conversation(&self) -> Vec<ChatMessage> {
            self.seen.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ModelResponse, ModelError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ModelResponse::text("out of script")))
        }
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<(usize, String, Map<String, Value>)>,
        texts: Vec<String>,
    }

    impl AgentObserver for Recorder {
        fn on_step(&mut self, step: usize, name: &str, arguments: &Map<String, Value>) {
            self.steps.push((step, name.to_string(), arguments.clone()));
        }
        fn on_text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }
    }

    struct Echo;

    #[async_trait]
    impl ToolExecutor for Echo {
        async fn execute(&self, arguments: &Map<String, Value>) -> anyhow::Result<String> {
            Ok(format!("echo:{}", Value::Object(arguments.clone())))
        }
    }

    struct Broken;

    #[async_trait]
    impl ToolExecutor for Broken {
        async fn execute(&self, _arguments: &Map<String, Value>) -> anyhow::Result<String> {
            anyhow::bail!("disk on fire")
        }
    }

    fn toolbox() -> Toolbox {
        Toolbox::new(
            vec![
                ToolDef::new("lookup", "Look something up", json!({ "type": "object" }), Echo),
                ToolDef::new("broken", "Always fails", json!({ "type": "object" }), Broken),
                ToolDef::terminal("finish", "Done", json!({ "type": "object" })),
            ],
            "finish",
        )
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, args)
    }

    fn tool_results(conversation: &[ChatMessage]) -> Vec<String> {
        conversation
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.content.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_terminal_call_short_circuits() {
        let model = ScriptedModel::new(vec![ModelResponse::calls(vec![
            call("1", "finish", r#"{"alias":"time"}"#),
            call("2", "lookup", "{}"),
        ])]);
        let mut rec = Recorder::default();

        let result = run_agent_loop(&model, &AgentRequest::new("sys", "go"), &toolbox(), &mut rec)
            .await
            .unwrap();

        assert_eq!(result, Some(json!({ "alias": "time" })));
        assert_eq!(rec.steps.len(), 1);
        assert_eq!(rec.steps[0].0, 1);
        assert!(rec.texts.is_empty());
    }

    #[tokio::test]
    async fn test_text_reply_is_reported_once() {
        let model = ScriptedModel::new(vec![ModelResponse::text("Cannot install this.")]);
        let mut rec = Recorder::default();

        let result = run_agent_loop(&model, &AgentRequest::new("sys", "go"), &toolbox(), &mut rec)
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(rec.texts, vec!["Cannot install this."]);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_budget_counts_every_call() {
        let turns = (0..20)
            .map(|i| ModelResponse::calls(vec![call(&i.to_string(), "lookup", "{}")]))
            .collect();
        let model = ScriptedModel::new(turns);
        let mut rec = Recorder::default();

        let request = AgentRequest::new("sys", "go").with_max_steps(3);
        let result = run_agent_loop(&model, &request, &toolbox(), &mut rec)
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(model.calls(), 3);
        let steps: Vec<_> = rec.steps.iter().map(|s| s.0).collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(rec.texts, vec![MAX_STEPS_MESSAGE]);
    }

    #[tokio::test]
    async fn test_calls_beyond_budget_in_one_turn_are_dropped() {
        let model = ScriptedModel::new(vec![ModelResponse::calls(vec![
            call("1", "lookup", "{}"),
            call("2", "lookup", "{}"),
            call("3", "finish", r#"{"alias":"late"}"#),
        ])]);
        let mut rec = Recorder::default();

        let request = AgentRequest::new("sys", "go").with_max_steps(2);
        let result = run_agent_loop(&model, &request, &toolbox(), &mut rec)
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(rec.steps.len(), 2);
        assert_eq!(rec.texts, vec![MAX_STEPS_MESSAGE]);
    }

    #[tokio::test]
    async fn test_tool_failures_are_fed_back() {
        let model = ScriptedModel::new(vec![
            ModelResponse::calls(vec![
                call("a", "nope", "{}"),
                call("b", "broken", "{}"),
                call("c", "lookup", "{not json"),
                call("d", "lookup", "[1,2]"),
                call("e", "lookup", ""),
            ]),
            ModelResponse::text("giving up"),
        ]);
        let mut rec = Recorder::default();

        let result = run_agent_loop(&model, &AgentRequest::new("sys", "go"), &toolbox(), &mut rec)
            .await
            .unwrap();
        assert_eq!(result, None);

        let results = tool_results(&model.last_conversation());
        assert_eq!(results.len(), 5);
        assert_eq!(results[0], "Unknown tool: nope");
        assert_eq!(results[1], "Error executing broken: disk on fire");
        assert!(results[2].starts_with("Invalid JSON arguments: "));
        assert!(results[3].starts_with("Invalid JSON arguments: "));
        assert_eq!(results[4], "echo:{}");

        // Unparseable arguments are still reported as a step, with no args
        assert_eq!(rec.steps[2], (3, "lookup".to_string(), Map::new()));
        assert_eq!(rec.steps.len(), 5);
        assert_eq!(rec.texts, vec!["giving up"]);
    }

    #[tokio::test]
    async fn test_conversation_shape() {
        let model = ScriptedModel::new(vec![
            ModelResponse::calls(vec![call("x1", "lookup", r#"{"q":"time"}"#)]),
            ModelResponse::calls(vec![call("x2", "finish", r#"{"alias":"time"}"#)]),
        ]);

        run_agent_loop(
            &model,
            &AgentRequest::new("system prompt", "user message"),
            &toolbox(),
            &mut SilentObserver,
        )
        .await
        .unwrap();

        let convo = model.last_conversation();
        assert_eq!(convo[0].role, Role::System);
        assert_eq!(convo[1].content.as_deref(), Some("user message"));
        assert_eq!(convo[2].role, Role::Assistant);
        assert_eq!(convo[3].tool_call_id.as_deref(), Some("x1"));
        assert_eq!(convo[3].content.as_deref(), Some(r#"echo:{"q":"time"}"#));
    }

    #[tokio::test]
    async fn test_model_error_aborts() {
        struct Down;

        #[async_trait]
        impl ModelClient for Down {
            async fn complete(
                &self,
                _messages: &[ChatMessage],
                _tools: &[ToolSpec],
            ) -> Result<ModelResponse, ModelError> {
                Err(ModelError::HttpError {
                    status: 401,
                    body: "bad key".to_string(),
                })
            }
        }

        let err = run_agent_loop(&Down, &AgentRequest::new("s", "u"), &toolbox(), &mut SilentObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Model(ModelError::HttpError { status: 401, .. })));
    }
}
