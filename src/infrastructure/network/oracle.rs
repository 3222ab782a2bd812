use crate::domain::error::DishqError;
use crate::domain::model::Dish;
use crate::domain::traits::Oracle;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MODEL: &str = "claude-sonnet-4-5-20250929";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Documents over this size are skipped without a call.
pub const MAX_PDF_BYTES: usize = 30 * 1024 * 1024;
/// Hard deadline per oracle call, overriding the client-wide timeout to
/// leave room for PDF uploads. A stalled endpoint surfaces as a transport
/// error, which callers treat as "no result".
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// Single-call prompt: find the dish, extract ingredients, AND generate the
// recipe in one shot.
fn targeted_prompt(dish_name: &str) -> String {
    format!(
        r#"I'm looking for the dish "{dish_name}" on this restaurant menu.

Find the closest matching dish and return a JSON object with:
- "dish": the exact dish name as it appears on the menu (string)
- "ingredients": list of ingredient strings inferred from the menu description
- "steps": a step-by-step recipe as a list of strings (4-8 concise steps with cooking times/temperatures)
- "found": true if you found a matching dish, false if not

If the dish is not on this menu at all, return: {{"found": false, "dish": "", "ingredients": [], "steps": []}}

Return ONLY the JSON object, no other text."#
    )
}

const EXTRACTION_PROMPT: &str = r#"Extract all dishes and their ingredients from this restaurant menu.
Return a JSON array where each element has:
- "dish": the dish name (string)
- "ingredients": list of ingredient strings

Only include dishes where you can reasonably infer ingredients from the description.
If a dish has no discernible ingredients, skip it.
Return ONLY the JSON array, no other text."#;

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// How one targeted response was read. Malformed output is a tagged state,
/// never a pipeline-fatal error.
#[derive(Debug)]
pub enum TargetedOutcome {
    Found(Dish),
    NotFound,
    ParseError,
}

/// Extraction oracle backed by the Anthropic Messages API.
pub struct AnthropicOracle {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl AnthropicOracle {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Tighten the per-call deadline. Used by tests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn complete(&self, api_key: &str, max_tokens: u32, content: Value) -> Result<String, DishqError> {
        let body = json!({
            "model": MODEL,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": content }],
        });

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .timeout(self.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(DishqError::Oracle(format!(
                "oracle returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let parsed: MessagesResponse = resp.json().await?;
        Ok(parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    fn pdf_document_block(pdf: &[u8]) -> Value {
        let pdf_b64 = base64::engine::general_purpose::STANDARD.encode(pdf);
        json!({
            "type": "document",
            "source": {
                "type": "base64",
                "media_type": "application/pdf",
                "data": pdf_b64,
            },
        })
    }

    fn pdf_too_large(pdf: &[u8]) -> bool {
        if pdf.len() > MAX_PDF_BYTES {
            tracing::warn!(
                size_mb = pdf.len() as f64 / (1024.0 * 1024.0),
                "PDF too large for oracle, skipping"
            );
            return true;
        }
        false
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn find_in_text(
        &self,
        dish_name: &str,
        menu_text: &str,
    ) -> Result<Option<Dish>, DishqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        tracing::info!(dish_name, chars = menu_text.len(), "targeted search in menu text");
        let content = json!(format!(
            "{}\n\nMenu text:\n{}",
            targeted_prompt(dish_name),
            menu_text
        ));
        let raw = self.complete(api_key, 2048, content).await?;
        Ok(parse_targeted(&raw).into())
    }

    async fn find_in_pdf(&self, dish_name: &str, pdf: &[u8]) -> Result<Option<Dish>, DishqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        if Self::pdf_too_large(pdf) {
            return Ok(None);
        }

        tracing::info!(dish_name, bytes = pdf.len(), "targeted search in PDF");
        let content = json!([
            Self::pdf_document_block(pdf),
            { "type": "text", "text": targeted_prompt(dish_name) },
        ]);
        let raw = self.complete(api_key, 2048, content).await?;
        Ok(parse_targeted(&raw).into())
    }

    async fn extract_all(&self, menu_text: &str) -> Result<Vec<Dish>, DishqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        tracing::info!(chars = menu_text.len(), "extracting all dishes from text");
        let content = json!(format!("{}\n\nMenu text:\n{}", EXTRACTION_PROMPT, menu_text));
        let raw = self.complete(api_key, 2048, content).await?;
        Ok(parse_dish_list(&raw))
    }

    async fn extract_all_pdf(&self, pdf: &[u8]) -> Result<Vec<Dish>, DishqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };
        if Self::pdf_too_large(pdf) {
            return Ok(Vec::new());
        }

        tracing::info!(bytes = pdf.len(), "extracting all dishes from PDF");
        let content = json!([
            Self::pdf_document_block(pdf),
            { "type": "text", "text": EXTRACTION_PROMPT },
        ]);
        let raw = self.complete(api_key, 4096, content).await?;
        Ok(parse_dish_list(&raw))
    }

    async fn generate_steps(
        &self,
        dish_name: &str,
        ingredients: &[String],
    ) -> Result<Vec<String>, DishqError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        tracing::info!(dish_name, "generating recipe steps");
        let prompt = format!(
            r#"Write a step-by-step recipe for "{}" using these ingredients: {}

Return a JSON array of strings, where each string is one step.
Keep each step concise (1-3 sentences). Include cooking times and temperatures where relevant.
Aim for 4-8 steps total.
Return ONLY the JSON array, no other text."#,
            dish_name,
            ingredients.join(", ")
        );
        let raw = self.complete(api_key, 2048, json!(prompt)).await?;
        Ok(parse_step_list(&raw))
    }
}

impl From<TargetedOutcome> for Option<Dish> {
    fn from(outcome: TargetedOutcome) -> Self {
        match outcome {
            TargetedOutcome::Found(dish) => Some(dish),
            TargetedOutcome::NotFound | TargetedOutcome::ParseError => None,
        }
    }
}

/// Strip a markdown code fence from an oracle response.
pub fn strip_fences(raw: &str) -> &str {
    let mut raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("```") {
        // Drop the fence line (which may carry a language tag).
        raw = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
        raw = raw.strip_suffix("```").unwrap_or(raw);
        raw = raw.trim();
    }
    raw
}

/// Parse a targeted single-dish response. The oracle promises a JSON object
/// with `found`, `dish`, `ingredients`, `steps`, but holds no schema; every
/// field is validated before a `Dish` is built.
pub fn parse_targeted(raw: &str) -> TargetedOutcome {
    let raw = strip_fences(raw);
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(
                error = %e,
                head = raw.chars().take(500).collect::<String>(),
                "failed to parse targeted oracle response"
            );
            return TargetedOutcome::ParseError;
        }
    };

    let Some(obj) = value.as_object() else {
        return TargetedOutcome::ParseError;
    };
    if !obj.get("found").and_then(Value::as_bool).unwrap_or(false) {
        tracing::info!("targeted search: dish not found on this menu");
        return TargetedOutcome::NotFound;
    }

    let name = match obj.get("dish").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return TargetedOutcome::ParseError,
    };
    let ingredients = string_list(obj.get("ingredients"));
    let steps = string_list(obj.get("steps"));

    tracing::info!(
        dish = %name,
        ingredients = ingredients.len(),
        steps = steps.len(),
        "targeted match"
    );
    TargetedOutcome::Found(Dish {
        name,
        ingredients,
        steps,
    })
}

/// Parse a whole-menu extraction response: a JSON array of
/// `{"dish": ..., "ingredients": [...]}` objects. Elements missing a dish
/// name are dropped; an unparseable payload yields an empty list.
pub fn parse_dish_list(raw: &str) -> Vec<Dish> {
    let raw = strip_fences(raw);
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(
                error = %e,
                head = raw.chars().take(500).collect::<String>(),
                "failed to parse dish list response"
            );
            return Vec::new();
        }
    };

    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let dishes: Vec<Dish> = items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let name = obj.get("dish").and_then(Value::as_str)?;
            if name.is_empty() {
                return None;
            }
            Some(Dish::new(name, string_list(obj.get("ingredients"))))
        })
        .collect();

    tracing::info!(count = dishes.len(), "parsed dishes from extraction response");
    dishes
}

fn parse_step_list(raw: &str) -> Vec<String> {
    let raw = strip_fences(raw);
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(steps) => steps,
        Err(_) => Vec::new(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
