//! LLM-backed draft generator behind `GET /api/generateformdata`.
//!
//! The generator picks one cost center and up to three catalog products at
//! random, asks an OpenAI-compatible chat-completions endpoint for a request
//! draft that uses them, and hands back the reply only once it decodes as a
//! draft object. Callers still treat the result as untrusted prefill.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use requestdesk_core::autofill::GeneratedDraft;
use requestdesk_core::config::{LlmConfig, LlmProvider};
use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::errors::InterfaceError;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const MAX_PRODUCTS: usize = 3;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("draft generator is disabled")]
    Disabled,
    #[error("no {0} available to build a draft from")]
    MissingReferenceData(&'static str),
    #[error("draft generator request failed: {0}")]
    Transport(String),
    #[error("draft generator responded with status {0}")]
    UpstreamStatus(u16),
    #[error("draft generator returned no content")]
    EmptyReply,
    #[error("draft generator returned malformed JSON: {0}")]
    Malformed(String),
}

impl GenerateError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let message = self.to_string();
        match self {
            Self::Disabled | Self::Transport(_) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::UpstreamStatus(_) | Self::Malformed(_) => {
                InterfaceError::BadGateway { message, correlation_id }
            }
            Self::MissingReferenceData(_) | Self::EmptyReply => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}

/// Sends one prompt and returns the raw completion text.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Products and cost center the generated draft must use.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptSelection {
    pub cost_center: CostCenter,
    pub products: Vec<(CatalogProduct, u32)>,
}

impl PromptSelection {
    pub fn pick(
        rng: &mut impl Rng,
        products: &[CatalogProduct],
        cost_centers: &[CostCenter],
    ) -> Result<Self, GenerateError> {
        let cost_center =
            cost_centers.choose(rng).cloned().ok_or(GenerateError::MissingReferenceData("cost centers"))?;
        if products.is_empty() {
            return Err(GenerateError::MissingReferenceData("products"));
        }

        let chosen: Vec<CatalogProduct> =
            products.choose_multiple(rng, MAX_PRODUCTS).cloned().collect();
        let products = chosen.into_iter().map(|product| (product, rng.gen_range(1..=3))).collect();

        Ok(Self { cost_center, products })
    }

    pub fn prompt(&self) -> String {
        let lines: Vec<Value> = self
            .products
            .iter()
            .map(|(product, quantity)| {
                let total = product.price * Decimal::from(*quantity);
                serde_json::json!({
                    "label": product.label,
                    "quantity": quantity,
                    "price": product.price.to_string(),
                    "total": total.to_string(),
                })
            })
            .collect();
        let products = serde_json::to_string_pretty(&lines).unwrap_or_else(|_| "[]".to_string());

        format!(
            "Generate a JSON object that matches the following TypeScript type definition:\n\
             {DRAFT_SHAPE}\n\n\
             IMPORTANT: Use exactly these products (do not change the product details):\n\
             {products}\n\n\
             IMPORTANT: Use exactly this cost center value: \"{cost_center}\"\n\n\
             For each product, make sure total = quantity * price.\n\
             Generate realistic values for all other fields. The budget should be at least the sum of all product totals.\n\
             Do not include any additional text or explanations, just the JSON object.",
            cost_center = self.cost_center.value,
        )
    }
}

const DRAFT_SHAPE: &str = "type TForm = {
  requestorName: string;
  requestorEmail: string;
  department: string;
  employeeID: string;
  onBehalfOf?: string;
  requestTitle: string;
  description: string;
  requestedDate: string;
  dueDate?: string;
  priority: string;
  products: { label: string; quantity: number; price: number; total: number }[];
  budget: number;
  costCenter: string;
  attachments: { name: string }[];
};";

/// Runs one generation round and returns the reply as a JSON object.
pub async fn generate_draft(
    generator: &dyn DraftGenerator,
    selection: &PromptSelection,
) -> Result<Value, GenerateError> {
    let reply = generator.complete(&selection.prompt()).await?;
    let value = parse_reply(&reply)?;

    info!(
        event_name = "server.generate.completed",
        cost_center = %selection.cost_center.value,
        products = selection.products.len(),
        "generated draft accepted"
    );
    Ok(value)
}

/// Accepts a bare JSON object or one wrapped in a markdown code fence.
pub fn parse_reply(reply: &str) -> Result<Value, GenerateError> {
    let body = strip_code_fence(reply.trim());
    if body.is_empty() {
        return Err(GenerateError::EmptyReply);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|error| GenerateError::Malformed(error.to_string()))?;
    GeneratedDraft::from_value(value.clone())
        .map_err(|error| GenerateError::Malformed(error.to_string()))?;
    Ok(value)
}

fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Chat-completions client for OpenAI and for Ollama's OpenAI-compatible API.
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| GenerateError::Transport(error.to_string()))?;

        let api_key = match config.provider {
            LlmProvider::OpenAi => config.api_key.clone(),
            LlmProvider::Ollama => None,
        };

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl DraftGenerator for ChatCompletionsGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "server.generate.transport_failed",
                error = %error,
                "draft generator request failed"
            );
            GenerateError::Transport(error.to_string())
        })?;

        if !response.status().is_success() {
            return Err(GenerateError::UpstreamStatus(response.status().as_u16()));
        }

        let payload: ChatResponse =
            response.json().await.map_err(|error| GenerateError::Malformed(error.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerateError::EmptyReply)
    }
}
