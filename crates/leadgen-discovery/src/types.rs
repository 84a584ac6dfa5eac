//! Gemini `generateContent` request and response types.
//!
//! Only the fields this crate reads are modelled; everything else in the
//! response is ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

impl<'a> GenerateRequest<'a> {
    /// A single user turn, optionally grounded with Google Search.
    pub(crate) fn user_prompt(text: &'a str, grounded: bool) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            tools: if grounded {
                vec![Tool::default()]
            } else {
                Vec::new()
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub text: &'a str,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<serde_json::Value>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts. Empty when the model
    /// returned nothing usable.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Grounding chunks of the first candidate, passed through opaquely.
    pub(crate) fn into_sources(self) -> Vec<serde_json::Value> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
    }
}
