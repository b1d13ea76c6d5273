//! Prompt text sent to the model.

use serde_json::Value as JsonValue;

/// Language the model is asked to write free text in.
pub const DEFAULT_LANGUAGE: &str = "Hebrew";

fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn recommendations(
    preferences: &JsonValue,
    history: &JsonValue,
    catalog: &JsonValue,
    count: usize,
    language: &str,
) -> String {
    format!(
        r#"As a shopping assistant, analyze the following user data and available products to provide personalized recommendations.

User Preferences:
{preferences}

Shopping History:
{history}

Available Products:
{catalog}

Based on this information, recommend {count} products that this user might be interested in.
For each recommendation, provide:
1. The product ID
2. A reason for the recommendation in {language}
3. A confidence score between 0 and 1

Respond only with JSON in the following format:
[
  {{
    "productId": number,
    "reason": "string",
    "score": number
  }}
]
"#,
        preferences = pretty(preferences),
        history = pretty(history),
        catalog = pretty(catalog),
    )
}

pub fn trends(history: &JsonValue, language: &str) -> String {
    format!(
        r#"Analyze the following shopping history and provide insights about shopping patterns and trends.
Please write the analysis in {language}.

Shopping History:
{history}

Focus on:
1. Most frequently bought items
2. Shopping patterns (time, frequency)
3. Price sensitivity
4. Category preferences
"#,
        history = pretty(history),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recommendation_prompt_embeds_inputs_and_count() {
        let text = recommendations(
            &json!({ "diet": "vegan" }),
            &json!([]),
            &json!([{ "id": 7, "name": "Oat milk" }]),
            5,
            "English",
        );
        assert!(text.contains("\"diet\": \"vegan\""));
        assert!(text.contains("Oat milk"));
        assert!(text.contains("recommend 5 products"));
        assert!(text.contains("in English"));
        assert!(text.contains("\"productId\": number"));
    }

    #[test]
    fn trends_prompt_embeds_history() {
        let text = trends(&json!([{ "name": "Weekly" }]), DEFAULT_LANGUAGE);
        assert!(text.contains("Weekly"));
        assert!(text.contains("in Hebrew"));
    }
}
