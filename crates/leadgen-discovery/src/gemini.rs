//! HTTP client for the Gemini `generateContent` API.
//!
//! Each discovery operation is one grounded prompt. The reply text is run
//! through the lenient parsers in [`crate::parse`]; only transport problems
//! and undecodable envelopes become errors.

use std::time::Duration;

use async_trait::async_trait;
use leadgen_core::{BrandSearchPreference, DraftKind, Lead};
use reqwest::{Client, Url};

use crate::client::{ContactResult, DiscoveryClient, DiscoveryResult, LookupResult};
use crate::error::DiscoveryError;
use crate::parse::{draft_or_fallback, parse_candidates, parse_contact, parse_lookup};
use crate::prompts::{contact_prompt, discovery_prompt, draft_prompt, lookup_prompt};
use crate::types::{GenerateRequest, GenerateResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// Client for Gemini with Google Search grounding.
///
/// Use [`GeminiClient::new`] for production or [`GeminiClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::MissingApiKey`] for a blank key, or
    /// [`DiscoveryError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, DiscoveryError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::MissingApiKey`] for a blank key,
    /// [`DiscoveryError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`DiscoveryError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, DiscoveryError> {
        if api_key.trim().is_empty() {
            return Err(DiscoveryError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("leadgen/0.1 (brand-outreach)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| DiscoveryError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
        })
    }

    fn endpoint(&self) -> Result<Url, DiscoveryError> {
        let path = format!("v1beta/models/{}:generateContent", self.model);
        self.base_url
            .join(&path)
            .map_err(|e| DiscoveryError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends one prompt and decodes the response envelope.
    async fn generate(
        &self,
        operation: &str,
        prompt: &str,
        grounded: bool,
    ) -> Result<GenerateResponse, DiscoveryError> {
        let url = self.endpoint()?;
        let request = GenerateRequest::user_prompt(prompt, grounded);

        tracing::debug!(operation, model = %self.model, "sending generateContent request");
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::UnexpectedStatus {
                status: status.as_u16(),
                context: operation.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DiscoveryError::Deserialize {
            context: operation.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl DiscoveryClient for GeminiClient {
    async fn discover(
        &self,
        query: &str,
        pref: &BrandSearchPreference,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let prompt = discovery_prompt(query, pref);
        let response = self.generate("discover", &prompt, true).await?;
        let leads = parse_candidates(&response.text());
        tracing::info!(query, count = leads.len(), "discovery returned candidates");
        Ok(DiscoveryResult {
            leads,
            sources: response.into_sources(),
        })
    }

    async fn lookup(&self, brand_name: &str) -> Result<LookupResult, DiscoveryError> {
        let prompt = lookup_prompt(brand_name);
        let response = self.generate("lookup", &prompt, true).await?;
        let lead = parse_lookup(&response.text());
        if lead.is_none() {
            tracing::warn!(brand_name, "lookup response had no usable brand");
        }
        Ok(LookupResult {
            lead,
            sources: response.into_sources(),
        })
    }

    async fn find_contact(
        &self,
        brand_name: &str,
        website: &str,
    ) -> Result<ContactResult, DiscoveryError> {
        let prompt = contact_prompt(brand_name, website);
        let response = self.generate("find_contact", &prompt, true).await?;
        let contact = parse_contact(&response.text());
        Ok(ContactResult {
            contact,
            sources: response.into_sources(),
        })
    }

    async fn draft_email(
        &self,
        lead: &Lead,
        sender_name: &str,
        kind: DraftKind,
    ) -> Result<String, DiscoveryError> {
        let prompt = draft_prompt(lead, sender_name, kind);
        let response = self.generate("draft_email", &prompt, false).await?;
        Ok(draft_or_fallback(&response.text()))
    }
}
