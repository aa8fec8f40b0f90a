use crate::domain::meal_plan::{parse_model_json, MealPreferences, IU_PER_MCG, PLAN_SIZE};
use anyhow::{anyhow, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    CreateChatCompletionRequestArgs, Role,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

const MAX_RETRIES: u64 = 2;

/// Produces a raw meal payload; the normalizer decides what survives.
#[async_trait]
pub trait MealModel: Send + Sync {
    async fn suggest(&self, prefs: &MealPreferences) -> Result<Value>;
}

#[derive(Clone)]
pub struct OpenAiMealModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiMealModel {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);
        Self { client, model }
    }
}

fn system_prompt() -> String {
    format!(
        r#"You plan vitamin D friendly food for Australian shoppers.
Generate exactly {PLAN_SIZE} options with at least one snack and one full meal.
Rules:
- All items must satisfy every dietary tag in the preferences.
- Each item MUST include: name, kind ('meal'|'snack'), cost_aud, prep_minutes, vitd_mcg, vitd_iu, tags[], ingredients[], recipe_steps[].
- vitd_iu = vitd_mcg * {IU_PER_MCG}.
- Provide an itemised ingredients list and a short step-by-step recipe.
- Keep ingredients simple, no gimmicky titles like 'UV treated mushrooms'.
- Prices and prep times must be realistic for AU supermarkets.
Return ONLY JSON with a top-level key "items"."#
    )
}

fn user_prompt(prefs: &MealPreferences) -> String {
    json!({
        "preferences": {
            "dietary": prefs.dietary,
            "max_prep_minutes": prefs.max_prep_minutes,
            "budget_aud": prefs.budget_aud,
        }
    })
    .to_string()
}

#[async_trait]
impl MealModel for OpenAiMealModel {
    async fn suggest(&self, prefs: &MealPreferences) -> Result<Value> {
        let mut retries = 0;
        loop {
            let messages = vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    role: Role::System,
                    content: system_prompt(),
                    name: None,
                }),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    role: Role::User,
                    content: ChatCompletionRequestUserMessageContent::Text(user_prompt(prefs)),
                    name: None,
                }),
            ];

            let request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages(messages)
                .build()?;

            match self.client.chat().create(request).await {
                Ok(resp) => {
                    let content = resp
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .unwrap_or_default();
                    return Ok(payload_from_content(&content));
                }
                Err(err) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(anyhow!("OpenAI error: {err}"));
                    }
                    tracing::warn!(attempt = retries, error = %err, "meal model call failed, retrying");
                    sleep(Duration::from_millis(500 * retries)).await;
                }
            }
        }
    }
}

fn payload_from_content(content: &str) -> Value {
    parse_model_json(content).unwrap_or_else(|| {
        tracing::warn!("meal model returned non-JSON content");
        json!({ "items": [] })
    })
}
