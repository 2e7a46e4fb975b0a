//! Model Router: sends a system + user prompt pair to a mock LLM or a live
//! OpenAI-compatible chat-completions endpoint and returns the generated text.

use serde::{Deserialize, Serialize};
use souschef_core::CoreConfig;
use thiserror::Error;

/// Mode for LLM invocation: mock (deterministic local text) or live (HTTP API).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Mock,
    Live,
}

impl LlmMode {
    /// "live" (any case) selects the API; anything else stays mock.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("live") {
            LlmMode::Live
        } else {
            LlmMode::Mock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmMode::Mock => "mock",
            LlmMode::Live => "live",
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM endpoint returned HTTP {0}")]
    Status(u16),
    #[error("LLM returned no completion")]
    EmptyCompletion,
    #[error("LLM request timed out")]
    Timeout,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatTurn<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Live endpoint settings, taken from [`CoreConfig`].
#[derive(Clone, Debug)]
struct LiveEndpoint {
    url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

/// Routes a prompt to the mock generator or the configured chat-completions API.
pub struct ModelRouter {
    mode: LlmMode,
    client: reqwest::Client,
    endpoint: LiveEndpoint,
}

impl ModelRouter {
    pub fn from_config(config: &CoreConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.llm_timeout())
            .build()?;
        let mode = if config.is_live() { LlmMode::Live } else { LlmMode::Mock };
        if mode == LlmMode::Live && config.llm_api_key.is_none() {
            tracing::warn!(
                target: "souschef::llm",
                url = %config.llm_api_url,
                "Live LLM mode without an API key; requests are sent unauthenticated"
            );
        }
        Ok(Self {
            mode,
            client,
            endpoint: LiveEndpoint {
                url: config.llm_api_url.clone(),
                api_key: config.llm_api_key.clone(),
                model: config.llm_model.clone(),
                max_tokens: config.llm_max_tokens,
            },
        })
    }

    pub fn with_mode(mode: LlmMode) -> Self {
        let config = CoreConfig::default();
        Self {
            mode,
            client: reqwest::Client::new(),
            endpoint: LiveEndpoint {
                url: config.llm_api_url,
                api_key: None,
                model: config.llm_model,
                max_tokens: config.llm_max_tokens,
            },
        }
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    /// Returns the raw completion text for the prompt pair.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        match self.mode {
            LlmMode::Mock => Ok(mock_generate(user)),
            LlmMode::Live => self.live_generate(system, user).await,
        }
    }

    async fn live_generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.endpoint.model,
            messages: [
                ChatTurn {
                    role: "system",
                    content: system,
                },
                ChatTurn {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.endpoint.max_tokens,
        };

        let mut request = self.client.post(&self.endpoint.url).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }
        let started = std::time::Instant::now();
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }
        let parsed: ChatResponse = response.json().await.map_err(classify)?;
        tracing::debug!(
            target: "souschef::llm",
            model = %self.endpoint.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Completion received"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyCompletion)
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::with_mode(LlmMode::Mock)
    }
}

fn classify(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(err)
    }
}

/// Mock LLM: a deterministic plain-text echo of the user message and the current step,
/// read back out of the context block.
fn mock_generate(prompt: &str) -> String {
    let field = |label: &str| {
        prompt
            .lines()
            .find_map(|l| l.strip_prefix(label))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let said = field("User message:").unwrap_or("(nothing)");
    match field("Current step text:") {
        Some(step) => format!(
            "[Mock LLM] You said: \"{said}\". We're working on: {step}"
        ),
        None => format!("[Mock LLM] You said: \"{said}\"."),
    }
}
