use serde::{Deserialize, Serialize};
use thiserror::Error;

const COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Failures from the external model round trip. These are soft from the
/// coordinator's point of view: local findings still come back.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("OpenRouter API error: {0}")]
    Api(String),
    #[error("no response content from OpenRouter")]
    EmptyResponse,
}

/// The external LLM boundary: hand over a prompt, get back the model's
/// freeform reply or fail. Implementations own their credentials and model
/// id; the coordinator never sees either.
pub trait ReviewClient {
    fn review(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ReviewError>> + Send;
}

/// OpenRouter chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    api_key: String,
    model: String,
    temperature: f32,
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ReviewClient for OpenRouterClient {
    async fn review(&self, prompt: &str) -> Result<String, ReviewError> {
        let request_body = CompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReviewError::Api(response.status().to_string()));
        }

        let completion: CompletionResponse = response.json().await?;
        match completion.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(ReviewError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_keeps_injected_model_and_temperature() {
        let client =
            OpenRouterClient::new("sk-test", "google/gemini-2.5-flash-lite").with_temperature(0.7);
        assert_eq!(client.model(), "google/gemini-2.5-flash-lite");
        assert_eq!(client.temperature, 0.7);
    }

    #[test]
    fn request_body_serializes_as_chat_completion() {
        let body = CompletionRequest {
            model: "test/model",
            messages: vec![Message {
                role: "user",
                content: "プロンプト",
            }],
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test/model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "プロンプト");
    }
}
