//! Gemini implementation of [`ExtractionProvider`].
//!
//! Sends the excerpt base64-encoded as an inline-data part tagged as plain
//! text, followed by the fixed instruction prompt, to the generateContent
//! endpoint of the generative-language API. This is the service's sole
//! outbound network dependency.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use url::Url;

use crate::config::GeminiConfig;
use crate::errors::{Error, Result};
use crate::providers::{EXTRACTION_PROMPT, ExtractionProvider};

pub struct GeminiProvider {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn generate_content_url(&self) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| Error::Upstream {
                message: format!("invalid generateContent URL: {e}"),
            })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl ExtractionProvider for GeminiProvider {
    async fn extract(&self, excerpt: &str) -> Result<String> {
        let url = self.generate_content_url()?;

        // Inline-data part first, then the prompt, matching the original call order
        let body = serde_json::json!({
            "contents": [{ "parts": [
                { "inlineData": { "mimeType": "text/plain", "data": STANDARD.encode(excerpt) } },
                { "text": EXTRACTION_PROMPT }
            ]}]
        });

        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                message: format!("generateContent returned {}: {}", status, response.text().await.unwrap_or_default()),
            });
        }

        let json: Value = response.json().await?;
        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Upstream {
                message: "generateContent reply carried no candidate text".to_string(),
            })
    }
}
