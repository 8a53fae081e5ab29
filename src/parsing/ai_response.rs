use serde::Deserialize;

use crate::error::{EssayError, Result};
use crate::types::essay_data::{ScoreResult, MAX_SCORE};

// Exact shape the examiner prompt asks for. Anything else is rejected.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct AiVerdict {
    score: i64,
    mistakes: Vec<String>,
    corrected_essay: String,
    feedback: String,
}

// Drops a surrounding ```json ... ``` fence if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Skip the language tag on the fence line.
    let body_start = after_open.find('\n').map_or(0, |i| i + 1);
    let body = &after_open[body_start..];
    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn extract_object(content: &str) -> Result<&str> {
    let body = strip_code_fence(content);
    let start = body
        .find('{')
        .ok_or_else(|| EssayError::AiResponse("no JSON object in response".to_string()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| EssayError::AiResponse("unterminated JSON object".to_string()))?;
    if end < start {
        return Err(EssayError::AiResponse("unterminated JSON object".to_string()));
    }
    Ok(&body[start..=end])
}

/// Validates the examiner's reply and turns it into a [`ScoreResult`].
///
/// The reply must hold exactly one JSON object with `score` (integer 0..=50),
/// `mistakes` (array of strings), `corrected_essay` and `feedback` (strings)
/// and nothing else. Prose or a code fence around the object is tolerated.
pub fn parse_ai_response(content: &str, original_text: &str) -> Result<ScoreResult> {
    let object = extract_object(content)?;
    let verdict: AiVerdict = serde_json::from_str(object)
        .map_err(|e| EssayError::AiResponse(format!("schema mismatch: {}", e)))?;

    if verdict.score < 0 || verdict.score > i64::from(MAX_SCORE) {
        return Err(EssayError::AiResponse(format!(
            "score {} outside 0..={}",
            verdict.score, MAX_SCORE
        )));
    }

    let mistakes: Vec<String> = verdict
        .mistakes
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect();

    let corrected_text = if verdict.corrected_essay.trim().is_empty() {
        original_text.to_string()
    } else {
        verdict.corrected_essay
    };

    Ok(ScoreResult {
        score: verdict.score as u32,
        mistakes,
        corrected_text,
        feedback: verdict.feedback,
    })
}
