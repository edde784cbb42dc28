//! Gemini `generateContent` adapter.
//!
//! Talks to the Gemini REST API over plain HTTP: ranking requests ask for
//! JSON response mode and parse the returned text as a ranked array,
//! solution requests take the text as-is. Prompt construction and response
//! parsing live in free functions so they can be tested without a network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Judge, JudgeError, RankedEntry, SubmissionEntry};

const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// One attempt per judge call; the fallback path covers anything slower.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`GeminiJudge`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    /// Settings for the production endpoint with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Overrides the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API origin, e.g. for a local proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// [`Judge`] backed by the Gemini `generateContent` endpoint.
pub struct GeminiJudge {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiJudge {
    /// Builds the judge with a request-timeout-bounded HTTP client.
    ///
    /// # Errors
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    /// Sends one `generateContent` call and extracts the first text part.
    async fn generate(
        &self,
        instruction: &str,
        json_response: bool,
    ) -> Result<String, JudgeError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: instruction }],
            }],
            generation_config: json_response.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.as_str())
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(JudgeError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        first_text(body)
    }
}

impl Judge for GeminiJudge {
    async fn rank(
        &self,
        problem: &str,
        entries: &[SubmissionEntry],
    ) -> Result<Vec<RankedEntry>, JudgeError> {
        let instruction = ranking_instruction(problem, entries)?;
        let text = self.generate(&instruction, true).await?;
        parse_ranking(&text)
    }

    async fn explain(
        &self,
        problem: &str,
        winning_text: &str,
    ) -> Result<String, JudgeError> {
        let instruction = solution_instruction(problem, winning_text);
        self.generate(&instruction, false).await
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Partial view of the response; everything beyond the first text part
/// is ignored.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

// ---------------------------------------------------------------------------
// Prompt construction and response parsing
// ---------------------------------------------------------------------------

fn ranking_instruction(
    problem: &str,
    entries: &[SubmissionEntry],
) -> Result<String, JudgeError> {
    let entries_json = serde_json::to_string(entries)?;
    Ok(format!(
        "You are judging a prompt-writing party game.\n\n\
         Problem:\n{problem}\n\n\
         Each element of the following JSON array is one player's submitted \
         prompt, with keys \"id\", \"name\" and \"text\":\n{entries_json}\n\n\
         Rank every entry from best to worst at solving the problem. Respond \
         with a JSON array in ranked order, one object per entry, each with \
         the \"id\" and \"name\" copied verbatim from the entry plus a short \
         \"reason\" for its placement. Respond with the JSON array only."
    ))
}

fn solution_instruction(problem: &str, winning_text: &str) -> String {
    format!(
        "You are judging a prompt-writing party game.\n\n\
         Problem:\n{problem}\n\n\
         Winning prompt:\n{winning_text}\n\n\
         Write a short reference solution to the problem in the spirit of \
         the winning prompt. Respond with plain text only."
    )
}

fn first_text(response: GenerateResponse) -> Result<String, JudgeError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| JudgeError::Malformed("response carried no text part".to_owned()))
}

fn parse_ranking(text: &str) -> Result<Vec<RankedEntry>, JudgeError> {
    let ranking: Vec<RankedEntry> = serde_json::from_str(text.trim())
        .map_err(|e| JudgeError::Malformed(format!("ranking was not a JSON array: {e}")))?;
    if ranking.is_empty() {
        return Err(JudgeError::Malformed("ranking was empty".to_owned()));
    }
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptjam_protocol::PlayerId;
    use serde_json::json;

    fn entry(name: &str, text: &str) -> SubmissionEntry {
        SubmissionEntry {
            id: PlayerId::random(),
            name: name.to_owned(),
            text: text.to_owned(),
        }
    }

    #[test]
    fn test_config_new_uses_production_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
    }

    #[test]
    fn test_config_builders_override_model_and_origin() {
        let config = GeminiConfig::new("key")
            .with_model("gemini-2.0-flash")
            .with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_generate_request_serializes_json_response_mode() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_generate_request_omits_absent_generation_config() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hello" }],
            }],
            generation_config: None,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_ranking_instruction_embeds_problem_and_entries() {
        let entries = [entry("ann", "reverse the string"), entry("bo", "use recursion")];
        let instruction = ranking_instruction("Reverse a string", &entries).unwrap();

        assert!(instruction.contains("Reverse a string"));
        assert!(instruction.contains("reverse the string"));
        assert!(instruction.contains(&entries[0].id.to_string()));
        assert!(instruction.contains("JSON array"));
    }

    #[test]
    fn test_solution_instruction_embeds_problem_and_winner() {
        let instruction = solution_instruction("Reverse a string", "use two pointers");

        assert!(instruction.contains("Reverse a string"));
        assert!(instruction.contains("use two pointers"));
    }

    #[test]
    fn test_first_text_extracts_first_candidate_part() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "[1, 2]"}, {"text": "trailing"}], "role": "model"}},
                {"content": {"parts": [{"text": "other candidate"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 12}
        }))
        .unwrap();

        assert_eq!(first_text(response).unwrap(), "[1, 2]");
    }

    #[test]
    fn test_first_text_rejects_empty_candidates() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(
            first_text(response),
            Err(JudgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_first_text_rejects_candidate_without_content() {
        let response: GenerateResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]}))
                .unwrap();
        assert!(matches!(
            first_text(response),
            Err(JudgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_ranking_accepts_ranked_array() {
        let ann = PlayerId::random();
        let bo = PlayerId::random();
        let text = format!(
            r#" [{{"id":"{ann}","name":"ann","reason":"clear and testable"}},
                {{"id":"{bo}","name":"bo","reason":"vague"}}] "#
        );

        let ranking = parse_ranking(&text).unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id, ann);
        assert_eq!(ranking[0].name, "ann");
        assert_eq!(ranking[1].reason, "vague");
    }

    #[test]
    fn test_parse_ranking_rejects_empty_array() {
        assert!(matches!(
            parse_ranking("[]"),
            Err(JudgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_ranking_rejects_prose() {
        assert!(matches!(
            parse_ranking("I rank ann first because her prompt was precise."),
            Err(JudgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_ranking_rejects_non_uuid_ids() {
        let text = r#"[{"id":"player-one","name":"ann","reason":"ok"}]"#;
        assert!(matches!(
            parse_ranking(text),
            Err(JudgeError::Malformed(_))
        ));
    }
}
