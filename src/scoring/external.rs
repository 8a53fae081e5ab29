use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Scorer;
use crate::config::ScorerConfig;
use crate::error::{EssayError, Result};
use crate::parsing::parse_ai_response;
use crate::types::essay_data::ScoreResult;

/// Builds the TOPIK 54 examiner instruction for one essay.
pub fn examiner_prompt(essay: &str) -> String {
    format!(
        r#"You are a TOPIK 54 writing examiner. Analyze this Korean essay for grammar, coherence, vocabulary, and logical structure.
Score essay out of 50 points with the following weights:
- Grammar accuracy: 15 points
- Vocabulary / expression: 10 points
- Sentence variety & structure: 15 points
- Coherence & logical flow: 10 points

Return a JSON object ONLY with keys:
{{"score": int, "mistakes": ["substring1","substring2"], "corrected_essay": "full corrected essay", "feedback": "short feedback in Korean"}}

Essay:
{}
"#,
        essay
    )
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Scores through a chat-completions endpoint. Every failure comes back as `Err`;
/// the caller decides what to fall back to.
pub struct ExternalScorer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl ExternalScorer {
    pub fn new(settings: &ScorerConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(ExternalScorer {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
            max_tokens: settings.max_tokens,
        })
    }

    fn request_completion(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?
            .error_for_status()?;

        let body: ChatResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EssayError::AiResponse("completion had no message content".to_string()))
    }
}

impl Scorer for ExternalScorer {
    fn name(&self) -> &str {
        "external"
    }

    fn score(&self, text: &str) -> Result<ScoreResult> {
        let content = self.request_completion(&examiner_prompt(text))?;
        tracing::debug!("Examiner replied with {} bytes", content.len());
        parse_ai_response(&content, text)
    }
}
