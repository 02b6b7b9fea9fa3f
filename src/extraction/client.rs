use async_trait::async_trait;

use super::{EntityExtractor, ExtractedEntities};
use crate::config::ExtractionConfig;
use crate::errors::AppError;

const ENTITY_PROMPT: &str = r#"Extract the following entities from this car search query. Return a JSON object with these fields (use null if not present):
- color (string)
- year (integer)
- year_min (integer)
- year_max (integer)
- price (float)
- price_min (float)
- price_max (float)
- mileage (float)
- mileage_min (float)
- mileage_max (float)
- transmission (string: automatic/manual)
- fuel_type (string: petrol/diesel/electric/hybrid/other)
- features (list of strings)
- company_name (string)
- model (string)
- sort_by (string: price, mileage, year, model, color, company_name, random, featured)
- sort_order (string: asc, desc)
- limit (integer, max 20)
Query: {query}
JSON:"#;

/// Extractor backed by a Gemini-style `generateContent` endpoint.
pub struct GeminiExtractor {
    client: reqwest::Client,
    config: ExtractionConfig,
}

impl GeminiExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Pull the JSON object out of a model completion. Models wrap the object
/// in prose or code fences, so take everything between the first `{` and
/// the last `}`.
fn parse_completion(text: &str) -> Result<ExtractedEntities, AppError> {
    let start = text
        .find('{')
        .ok_or_else(|| AppError::ExtractionError("No JSON object in completion".to_string()))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| AppError::ExtractionError("Unterminated JSON object".to_string()))?;
    if end < start {
        return Err(AppError::ExtractionError(
            "Malformed JSON object".to_string(),
        ));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| AppError::ExtractionError(format!("Schema mismatch: {}", e)))
}

#[async_trait]
impl EntityExtractor for GeminiExtractor {
    async fn extract(&self, query: &str) -> Result<ExtractedEntities, AppError> {
        let prompt = ENTITY_PROMPT.replace("{query}", query);
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.config.api_url, self.config.model, self.config.api_key
        );

        let payload = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::ExtractionError(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::ExtractionError(format!(
                "API error: {}",
                res.status()
            )));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::ExtractionError(format!("Parse error: {}", e)))?;

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| AppError::ExtractionError("Invalid response format".to_string()))?;

        parse_completion(text)
    }
}

/// Extractor that never finds anything. Used when no API key is configured
/// and in tests; the pipeline then relies purely on intent routing.
pub struct NoopExtractor;

#[async_trait]
impl EntityExtractor for NoopExtractor {
    async fn extract(&self, _query: &str) -> Result<ExtractedEntities, AppError> {
        Ok(ExtractedEntities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_completion() {
        let text = "Here you go:\n```json\n{\"color\": \"red\", \"limit\": 5}\n```";
        let bag = parse_completion(text).unwrap();
        assert_eq!(bag.color.as_deref(), Some("red"));
        assert_eq!(bag.limit, Some(5));
    }

    #[test]
    fn rejects_completion_without_json() {
        assert!(parse_completion("I couldn't find any entities.").is_err());
    }

    #[test]
    fn rejects_schema_mismatch() {
        assert!(parse_completion(r#"{"year": "definitely not a year"}"#).is_err());
    }

    #[tokio::test]
    async fn noop_extractor_yields_empty_bag() {
        let bag = NoopExtractor.extract("red cars under 20000").await.unwrap();
        assert!(bag.color.is_none());
        assert!(bag.features.is_empty());
    }
}
