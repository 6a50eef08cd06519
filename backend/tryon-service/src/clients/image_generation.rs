/// Generative-image client (Gemini `generateContent`)
///
/// Sends the customer photo plus a style prompt and returns the first image
/// part of the first candidate, along with any text the model produced.
use crate::error::{Result, TryOnError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_base64: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image_base64: String,
    pub mime_type: String,
    pub text: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage>;
}

/// Instruction wrapped around a catalog or free-form style description
pub fn build_prompt(style_description: &str) -> String {
    format!(
        "Edit this photo so the person's hair becomes {}. \
         Keep the face, expression and background unchanged and return a photorealistic image.",
        style_description.trim()
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiRequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiRequestPart<'a> {
    Text { text: &'a str },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineDataRef<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_modalities: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

fn extract_image(response: GeminiResponse) -> Result<GeneratedImage> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut image = None;
    let mut texts = Vec::new();
    for part in parts {
        if let Some(text) = part.text {
            texts.push(text);
        }
        if image.is_none() {
            image = part.inline_data;
        }
    }

    let image = image.ok_or_else(|| {
        TryOnError::Upstream("image model returned no image".to_string())
    })?;
    let text = if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    };

    Ok(GeneratedImage {
        image_base64: image.data,
        mime_type: image.mime_type,
        text,
    })
}

#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl GeminiImageClient {
    pub fn new(
        client: Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GeneratedImage> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            TryOnError::Upstream("image generation provider is not configured".to_string())
        })?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        );
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiRequestPart::Text {
                        text: &request.prompt,
                    },
                    GeminiRequestPart::Image {
                        inline_data: GeminiInlineDataRef {
                            mime_type: &request.mime_type,
                            data: &request.image_base64,
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        debug!(model = %self.model, "Calling image generation API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, "Image generation API returned an error");
            return Err(TryOnError::Upstream(format!(
                "image API HTTP {status}: {error_text}"
            )));
        }

        let parsed: GeminiResponse = response.json().await?;
        extract_image(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_includes_style() {
        let prompt = build_prompt("  a pixie cut ");
        assert!(prompt.contains("a pixie cut."));
    }

    #[test]
    fn test_request_serialization() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiRequestPart::Text { text: "prompt" },
                    GeminiRequestPart::Image {
                        inline_data: GeminiInlineDataRef {
                            mime_type: "image/jpeg",
                            data: "AAAA",
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(json["generationConfig"]["responseModalities"][1], "IMAGE");
    }

    #[test]
    fn test_extract_image_and_text() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is the new look"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                }
            }]
        }))
        .unwrap();

        let image = extract_image(response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.image_base64, "iVBORw0KGgo=");
        assert_eq!(image.text.as_deref(), Some("Here is the new look"));
    }

    #[test]
    fn test_extract_without_image_is_upstream_error() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]
        }))
        .unwrap();

        assert!(matches!(
            extract_image(response),
            Err(TryOnError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = GeminiImageClient::new(
            Client::new(),
            None,
            "http://127.0.0.1:1",
            "model",
        );
        let result = client
            .generate(GenerationRequest {
                prompt: "p".into(),
                image_base64: "AAAA".into(),
                mime_type: "image/jpeg".into(),
            })
            .await;
        assert!(matches!(result, Err(TryOnError::Upstream(_))));
    }
}
