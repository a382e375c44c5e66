//! LLM-backed grading of a single submission.
//!
//! Grading never fails: collaborator errors and unparseable replies degrade
//! to [`GradeVerdict`] with `is_correct = false`, `score = 0`, and feedback
//! starting with [`GRADING_ERROR_FEEDBACK`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{instrument, warn};

use crate::model::GradeVerdict;
use crate::prompts::{grading_user_prompt, GRADING_SYSTEM_PROMPT};
use crate::traits::{extract_json_from_markdown, ChatRequest, LlmProvider};

/// Fixed prefix of every degraded verdict's feedback.
pub const GRADING_ERROR_FEEDBACK: &str = "grading pipeline error";

/// Settings for grading requests.
#[derive(Debug, Clone)]
pub struct GraderSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GraderSettings {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            temperature: 0.5,
            max_tokens: 1024,
        }
    }
}

/// Scores a user's answer against a reference answer.
pub struct Grader {
    provider: Arc<dyn LlmProvider>,
    settings: GraderSettings,
}

impl Grader {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GraderSettings) -> Self {
        Self { provider, settings }
    }

    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn grade(
        &self,
        question: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> GradeVerdict {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_prompt: GRADING_SYSTEM_PROMPT.to_string(),
            user_prompt: grading_user_prompt(question, reference_answer, user_answer),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            json_mode: true,
        };

        let response = match self.provider.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("grading request failed: {e:#}");
                return degraded_verdict("grading request failed");
            }
        };

        match parse_verdict(&response.content) {
            Ok(verdict) => verdict,
            Err(reason) => {
                warn!("unusable grading reply: {reason}");
                degraded_verdict(&reason)
            }
        }
    }
}

/// The conservative verdict used whenever grading cannot complete.
pub fn degraded_verdict(reason: &str) -> GradeVerdict {
    GradeVerdict {
        is_correct: false,
        score: Some(0),
        feedback: format!("{GRADING_ERROR_FEEDBACK}: {reason}"),
    }
}

/// Whether a verdict came from a degraded grading path.
pub fn is_degraded(verdict: &GradeVerdict) -> bool {
    verdict.feedback.starts_with(GRADING_ERROR_FEEDBACK)
}

/// Validate a grading reply into a verdict.
pub fn parse_verdict(raw: &str) -> Result<GradeVerdict, String> {
    let payload = extract_json_from_markdown(raw);
    let value: Value =
        serde_json::from_str(&payload).map_err(|e| format!("reply is not valid JSON: {e}"))?;
    let Value::Object(map) = value else {
        return Err("reply is not a JSON object".to_string());
    };

    let is_correct = match map.get("is_correct") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        Some(_) => return Err("is_correct is not a boolean".to_string()),
        None => return Err("reply has no is_correct field".to_string()),
    };

    let score = match map.get("score") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_score(value).ok_or("score is not a number")?),
    };

    let feedback = match map.get("feedback") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Ok(GradeVerdict {
        is_correct,
        score,
        feedback,
    })
}

fn parse_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ChatResponse;
    use async_trait::async_trait;

    struct FixedProvider(Result<String, String>);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
            assert!(request.json_mode);
            match &self.0 {
                Ok(content) => Ok(ChatResponse {
                    content: content.clone(),
                    model: request.model.clone(),
                    token_usage: Default::default(),
                    latency_ms: 1,
                }),
                Err(message) => Err(anyhow::anyhow!("{message}")),
            }
        }
    }

    fn grader(reply: Result<&str, &str>) -> Grader {
        let reply = reply.map(str::to_string).map_err(str::to_string);
        Grader::new(Arc::new(FixedProvider(reply)), GraderSettings::default())
    }

    #[test]
    fn parse_complete_verdict() {
        let verdict =
            parse_verdict(r#"{"is_correct": false, "score": 20, "feedback": "wrong"}"#).unwrap();
        assert_eq!(
            verdict,
            GradeVerdict {
                is_correct: false,
                score: Some(20),
                feedback: "wrong".into(),
            }
        );
    }

    #[test]
    fn parse_lenient_fields() {
        let verdict =
            parse_verdict("```json\n{\"is_correct\": \"TRUE\", \"score\": \"87.6\"}\n```").unwrap();
        assert!(verdict.is_correct);
        assert_eq!(verdict.score, Some(88));
        assert_eq!(verdict.feedback, "");
    }

    #[test]
    fn parse_missing_score_stays_absent() {
        let verdict = parse_verdict(r#"{"is_correct": true, "feedback": "fine"}"#).unwrap();
        assert_eq!(verdict.score, None);
    }

    #[test]
    fn parse_clamps_score() {
        let high = parse_verdict(r#"{"is_correct": true, "score": 150}"#).unwrap();
        assert_eq!(high.score, Some(100));
        let low = parse_verdict(r#"{"is_correct": false, "score": -5}"#).unwrap();
        assert_eq!(low.score, Some(0));
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(parse_verdict("[1, 2]").is_err());
        assert!(parse_verdict(r#"{"score": 90}"#).is_err());
        assert!(parse_verdict(r#"{"is_correct": 1}"#).is_err());
        assert!(parse_verdict(r#"{"is_correct": true, "score": "lots"}"#).is_err());
    }

    #[tokio::test]
    async fn grade_returns_parsed_verdict() {
        let verdict = grader(Ok(r#"{"is_correct": true, "score": 95, "feedback": "great"}"#))
            .grade("q", "A", "A")
            .await;
        assert!(verdict.is_correct);
        assert_eq!(verdict.score, Some(95));
        assert!(!is_degraded(&verdict));
    }

    #[tokio::test]
    async fn grade_degrades_on_provider_failure() {
        let verdict = grader(Err("timeout")).grade("q", "A", "B").await;
        assert!(!verdict.is_correct);
        assert_eq!(verdict.score, Some(0));
        assert!(is_degraded(&verdict));
        assert!(verdict.feedback.contains("request failed"));
    }

    #[tokio::test]
    async fn grade_degrades_on_unparseable_reply() {
        let verdict = grader(Ok("I think it's mostly right")).grade("q", "A", "B").await;
        assert_eq!(verdict.score, Some(0));
        assert!(is_degraded(&verdict));
        assert!(verdict.feedback.contains("not valid JSON"));
    }
}
