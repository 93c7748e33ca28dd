use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::models::daily_log::{Mood, Satisfaction};

/// Short generated phrases attached to a log's details.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Enrichment {
    pub title: String,
    pub motivation: String,
}

/// External text generation. Failures surface as `AppError::EnrichmentFailed`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn motivation(&self, mood: Mood) -> AppResult<String>;

    async fn title(&self, mood: Mood, satisfaction: Option<Satisfaction>) -> AppResult<String>;
}

pub struct ClaudeTextGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeTextGenerator {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        // A slow upstream must not hold the request open indefinitely.
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> anyhow::Result<String> {
        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": max_tokens,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error {}: {}", status, body);
        }

        let body: serde_json::Value = response.json().await?;
        let text = body["content"][0]["text"]
            .as_str()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Claude API returned no text"))?;

        Ok(text.to_string())
    }
}

#[async_trait]
impl TextGenerator for ClaudeTextGenerator {
    async fn motivation(&self, mood: Mood) -> AppResult<String> {
        let prompt = motivation_prompt(mood);
        self.complete(prompt, 100).await.map_err(|e| {
            tracing::warn!(error = %e, mood = %mood, "Motivation generation failed");
            AppError::EnrichmentFailed("Failed to generate motivational message".into())
        })
    }

    async fn title(&self, mood: Mood, satisfaction: Option<Satisfaction>) -> AppResult<String> {
        let prompt = title_prompt(mood, satisfaction);
        let raw = self.complete(prompt, 30).await.map_err(|e| {
            tracing::warn!(error = %e, mood = %mood, "Title generation failed");
            AppError::EnrichmentFailed("Failed to generate daily title".into())
        })?;
        Ok(strip_quotes(&raw))
    }
}

fn motivation_prompt(mood: Mood) -> String {
    format!(
        "Generate a unique motivational message for someone feeling {}. \
         Make it positive and encouraging. Keep it under 20 words. \
         Reply with the message only.",
        mood
    )
}

fn title_prompt(mood: Mood, satisfaction: Option<Satisfaction>) -> String {
    let satisfaction = satisfaction.map(|s| s.as_str()).unwrap_or("not recorded");
    format!(
        "Generate a short engaging title (3-5 words) for a daily mood log. \
         Mood: {}, Satisfaction: {}. Example: \"Balanced\", \"Gentle\", \"Restore\". \
         Reply with the title only.",
        mood, satisfaction
    )
}

/// Drops one pair of surrounding quotes the model tends to add.
fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let is_quote = |c: char| c == '"' || c == '\'';
    let trimmed = trimmed.strip_prefix(is_quote).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(is_quote).unwrap_or(trimmed);
    trimmed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"Quiet Strength\""), "Quiet Strength");
        assert_eq!(strip_quotes("'Gentle Reset'"), "Gentle Reset");
        assert_eq!(strip_quotes("  Balanced  "), "Balanced");
        assert_eq!(strip_quotes("Don't Stop"), "Don't Stop");
    }

    #[test]
    fn test_title_prompt_handles_missing_satisfaction() {
        let prompt = title_prompt(Mood::Curious, None);
        assert!(prompt.contains("Mood: curious"));
        assert!(prompt.contains("Satisfaction: not recorded"));

        let prompt = title_prompt(Mood::Happy, Some(Satisfaction::VeryGood));
        assert!(prompt.contains("Satisfaction: Very good"));
    }

    #[test]
    fn test_motivation_prompt_names_mood() {
        assert!(motivation_prompt(Mood::Anxious).contains("feeling anxious"));
    }
}
