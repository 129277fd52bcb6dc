use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::errors::GoogleAiError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Image generation model tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageModel {
    #[default]
    Flash,
    Pro,
}

impl ImageModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            ImageModel::Flash => FLASH_IMAGE_MODEL,
            ImageModel::Pro => PRO_IMAGE_MODEL,
        }
    }
}

impl std::str::FromStr for ImageModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flash" => Ok(ImageModel::Flash),
            "pro" => Ok(ImageModel::Pro),
            _ => Err(format!("Unknown image model: {s}. Valid options: flash, pro")),
        }
    }
}

/// Inline binary content, base64 encoded as the API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Accepts `data:<mime>;base64,<payload>` or a bare base64 payload, which
    /// is assumed to be PNG.
    pub fn from_data_url(value: &str) -> Self {
        match value.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            Some((header, payload)) => {
                let mime_type = header
                    .split(';')
                    .next()
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or("image/png");
                Self::new(mime_type, payload)
            }
            None => Self::new("image/png", value),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, GoogleAiError> {
        STANDARD
            .decode(self.data.trim())
            .map_err(|e| GoogleAiError::ParseError {
                message: format!("Invalid base64 inline data: {e}"),
            })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(inline_data: InlineData) -> Self {
        Part::InlineData { inline_data }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// One generation invocation. The wire body is rebuilt from this for every
/// attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub response_schema: Option<serde_json::Value>,
    pub generation_config: Option<GenerationConfig>,
}

impl CallRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: Vec::new(),
            response_schema: None,
            generation_config: None,
        }
    }

    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model).with_text(prompt)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::text(text));
        self
    }

    pub fn with_inline_data(mut self, inline_data: InlineData) -> Self {
        self.parts.push(Part::inline(inline_data));
        self
    }

    /// Puts a reference image in front of the prompt parts.
    pub fn with_reference_image(mut self, inline_data: InlineData) -> Self {
        self.parts.insert(0, Part::inline(inline_data));
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .temperature = Some(temperature);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .image_config = Some(ImageConfig {
            aspect_ratio: aspect_ratio.into(),
        });
        self
    }

    pub fn validate(&self) -> Result<(), GoogleAiError> {
        if self.model.trim().is_empty() {
            return Err(GoogleAiError::ConfigurationError {
                message: "Model name cannot be empty".to_string(),
            });
        }
        if self.parts.is_empty() {
            return Err(GoogleAiError::InvalidRequest {
                status: 400,
                message: "Request has no content parts".to_string(),
            });
        }
        Ok(())
    }

    /// Builds a fresh wire body. A response schema forces a JSON MIME type.
    pub fn to_wire(&self) -> GenerateContentRequest {
        let mut generation_config = self.generation_config.clone();

        if let Some(schema) = &self.response_schema {
            let config = generation_config.get_or_insert_with(GenerationConfig::default);
            config.response_schema = Some(schema.clone());
            config.response_mime_type = Some("application/json".to_string());
        }

        GenerateContentRequest {
            contents: vec![Content {
                parts: self.parts.clone(),
                role: Some("user".to_string()),
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// All text parts of the first candidate, joined.
    pub fn extract_text(&self) -> String {
        self.first_parts()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect()
    }

    /// The first inline binary part of the first candidate.
    pub fn extract_inline_data(&self) -> Option<InlineData> {
        self.first_parts().find_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data.clone()),
            Part::Text { .. } => None,
        })
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
    }

    pub fn into_call_result(self) -> Result<CallResult, GoogleAiError> {
        if let Some(reason) = self.block_reason() {
            return Err(GoogleAiError::ContentBlocked {
                reason: reason.to_string(),
            });
        }

        let usage = self.usage_metadata.clone().unwrap_or_default();

        Ok(CallResult {
            text: self.extract_text(),
            inline_data: self.extract_inline_data(),
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count.unwrap_or(0),
                output_tokens: usage.candidates_token_count.unwrap_or(0),
            },
            finish_reason: self
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.clone()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl std::ops::Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, other: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
        }
    }
}

/// Normalized outcome of one successful call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResult {
    pub text: String,
    pub inline_data: Option<InlineData>,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl CallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, input_tokens: u32, output_tokens: u32) -> Self {
        self.usage = TokenUsage {
            input_tokens,
            output_tokens,
        };
        self
    }

    pub fn with_inline_data(mut self, inline_data: InlineData) -> Self {
        self.inline_data = Some(inline_data);
        self
    }
}
