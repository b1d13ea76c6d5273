//! Personalized recommendations and shopping-trend analysis.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use pricewatch_core::ProductId;

use crate::model::{DisabledModel, GenerativeModel};
use crate::prompt;
use crate::result::AiError;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Returned by [`RecommendationGateway::analyze_trends`] when the model is unavailable.
pub const TRENDS_FALLBACK: &str = "לא ניתן היה לנתח את דפוסי הקניה כרגע.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub product_id: ProductId,
    pub reason: String,
    /// Confidence in `[0, 1]`.
    pub score: f64,
}

/// Everything the model sees about one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationContext {
    pub preferences: JsonValue,
    pub history: JsonValue,
    pub catalog: JsonValue,
}

impl RecommendationContext {
    pub fn new<H, C>(preferences: JsonValue, history: &H, catalog: &C) -> Result<Self, AiError>
    where
        H: Serialize + ?Sized,
        C: Serialize + ?Sized,
    {
        let history =
            serde_json::to_value(history).map_err(|e| AiError::InvalidInput(e.to_string()))?;
        let catalog =
            serde_json::to_value(catalog).map_err(|e| AiError::InvalidInput(e.to_string()))?;
        Ok(Self {
            preferences,
            history,
            catalog,
        })
    }
}

/// Parse model output into at most `max` recommendations.
///
/// Accepts the JSON array bare or wrapped in a Markdown code fence. Entries that do not
/// have the expected shape, or whose score is not a finite number in `[0, 1]`, are
/// skipped. A response that is not an array at all is an error.
pub fn parse_recommendations(text: &str, max: usize) -> Result<Vec<Recommendation>, AiError> {
    let body = strip_code_fence(text);
    let entries: Vec<JsonValue> =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse(e.to_string()))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<Recommendation>(entry).ok())
        .filter(|rec| rec.score.is_finite() && (0.0..=1.0).contains(&rec.score))
        .take(max)
        .collect())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, ...) on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Stateless front for the generative model. Calls are not cached or deduplicated.
#[derive(Clone)]
pub struct RecommendationGateway {
    model: Arc<dyn GenerativeModel>,
    max_results: usize,
    language: String,
}

impl RecommendationGateway {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            max_results: MAX_RECOMMENDATIONS,
            language: prompt::DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledModel))
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.min(MAX_RECOMMENDATIONS);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Ranked suggestions for one user. Never fails: any upstream problem yields `[]`.
    pub async fn recommend(&self, ctx: &RecommendationContext) -> Vec<Recommendation> {
        match self.try_recommend(ctx).await {
            Ok(recs) => recs,
            Err(AiError::Disabled) => Vec::new(),
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "recommendation request failed");
                Vec::new()
            }
        }
    }

    async fn try_recommend(&self, ctx: &RecommendationContext) -> Result<Vec<Recommendation>, AiError> {
        let prompt = prompt::recommendations(
            &ctx.preferences,
            &ctx.history,
            &ctx.catalog,
            self.max_results,
            &self.language,
        );
        let text = self.model.generate(&prompt).await?;
        parse_recommendations(&text, self.max_results)
    }

    /// Free-text analysis of a shopping history, or [`TRENDS_FALLBACK`] on failure.
    pub async fn analyze_trends(&self, history: &JsonValue) -> String {
        let prompt = prompt::trends(history, &self.language);
        match self.model.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => TRENDS_FALLBACK.to_string(),
            Err(AiError::Disabled) => TRENDS_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "trend analysis failed");
                TRENDS_FALLBACK.to_string()
            }
        }
    }
}

impl std::fmt::Debug for RecommendationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationGateway")
            .field("model", &self.model.name())
            .field("max_results", &self.max_results)
            .field("language", &self.language)
            .finish()
    }
}
