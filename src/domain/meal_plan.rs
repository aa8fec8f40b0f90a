//! Repairs loosely typed meal suggestions coming back from a generative model
//! into a fixed three-item plan. Nothing in here fails: malformed fields fall
//! back to defaults and unusable items are dropped.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

pub const PLAN_SIZE: usize = 3;
pub const IU_PER_MCG: f64 = 40.0;
pub const MAX_INGREDIENTS: usize = 20;
pub const MAX_RECIPE_STEPS: usize = 12;
pub const DEFAULT_MAX_PREP_MINUTES: i64 = 60;
const MISSING_PREP_MINUTES: f64 = 999.0;
const PLACEHOLDER_NAME: &str = "Suggested Option";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealKind {
    Meal,
    Snack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealItem {
    pub name: String,
    pub kind: MealKind,
    pub cost_aud: f64,
    pub prep_minutes: i64,
    pub vitd_mcg: f64,
    pub vitd_iu: i64,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub recipe_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealPreferences {
    pub dietary: BTreeSet<String>,
    pub max_prep_minutes: i64,
    pub budget_aud: f64,
}

impl Default for MealPreferences {
    fn default() -> Self {
        Self {
            dietary: BTreeSet::new(),
            max_prep_minutes: DEFAULT_MAX_PREP_MINUTES,
            budget_aud: 0.0,
        }
    }
}

impl MealPreferences {
    /// Accepts `dietary` or `dietary_restrictions`, `budgetAud` or `budget_aud`,
    /// and numbers encoded as strings.
    pub fn from_json(value: &Value) -> Self {
        let dietary_raw = non_empty(value.get("dietary"))
            .or_else(|| non_empty(value.get("dietary_restrictions")));
        let dietary = dietary_raw
            .map(|raw| match raw {
                Value::String(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
                other => string_list(Some(other)),
            })
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let max_prep_minutes = coerce_f64(value.get("max_prep_minutes"))
            .map(|m| m as i64)
            .unwrap_or(DEFAULT_MAX_PREP_MINUTES);
        let budget_aud = coerce_f64(value.get("budgetAud"))
            .or_else(|| coerce_f64(value.get("budget_aud")))
            .unwrap_or(0.0);

        Self {
            dietary,
            max_prep_minutes,
            budget_aud,
        }
    }
}

impl From<Value> for MealPreferences {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl<'de> Deserialize<'de> for MealPreferences {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

/// How requested dietary tags are enforced against model items.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPolicy {
    /// Dietary tags are ignored.
    Off,
    /// Tagged items must carry every requested tag; untagged items pass.
    #[default]
    Lenient,
    /// Every item must carry every requested tag.
    Strict,
}

impl DietaryPolicy {
    fn admits(&self, requested: &BTreeSet<String>, tags: &[String]) -> bool {
        if requested.is_empty() {
            return true;
        }
        match self {
            DietaryPolicy::Off => true,
            DietaryPolicy::Lenient if tags.is_empty() => true,
            DietaryPolicy::Lenient | DietaryPolicy::Strict => {
                requested.iter().all(|d| tags.contains(d))
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid dietary policy {0:?} (expected off, lenient or strict)")]
pub struct DietaryPolicyParseError(pub String);

impl std::str::FromStr for DietaryPolicy {
    type Err = DietaryPolicyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "off" | "false" | "0" | "no" => Ok(DietaryPolicy::Off),
            "lenient" | "true" | "1" | "yes" | "on" => Ok(DietaryPolicy::Lenient),
            "strict" => Ok(DietaryPolicy::Strict),
            _ => Err(DietaryPolicyParseError(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub dietary: DietaryPolicy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealSummary {
    pub total_cost_aud: f64,
    pub budget_limit_aud: f64,
    pub within_budget: bool,
    pub has_snack: bool,
    pub has_meal: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealPlan {
    pub items: Vec<MealItem>,
    pub summary: MealSummary,
}

pub static FALLBACK_ITEMS: Lazy<Vec<MealItem>> = Lazy::new(|| {
    vec![
        MealItem {
            name: "Fortified oat milk (250ml)".into(),
            kind: MealKind::Snack,
            cost_aud: 1.2,
            prep_minutes: 1,
            vitd_mcg: 3.0,
            vitd_iu: 120,
            tags: strings(&["vegan", "lactose-free", "nut-free"]),
            ingredients: strings(&["250ml fortified oat milk"]),
            recipe_steps: strings(&["Serve chilled."]),
        },
        MealItem {
            name: "Eggs on toast".into(),
            kind: MealKind::Meal,
            cost_aud: 2.1,
            prep_minutes: 10,
            vitd_mcg: 2.0,
            vitd_iu: 80,
            tags: strings(&["nut-free"]),
            ingredients: strings(&["2 eggs", "2 slices wholegrain bread", "salt", "pepper"]),
            recipe_steps: strings(&["Toast bread.", "Pan-fry eggs to preference.", "Season and serve."]),
        },
        MealItem {
            name: "Canned tuna on crackers".into(),
            kind: MealKind::Snack,
            cost_aud: 2.2,
            prep_minutes: 3,
            vitd_mcg: 2.0,
            vitd_iu: 80,
            tags: strings(&["nut-free"]),
            ingredients: strings(&["Tuna in springwater", "Wholegrain crackers", "Lemon wedge"]),
            recipe_steps: strings(&["Drain tuna.", "Top crackers with tuna.", "Finish with lemon."]),
        },
    ]
});

pub fn normalize(raw_items: &[Value], prefs: &MealPreferences, config: NormalizerConfig) -> MealPlan {
    let mut items: Vec<MealItem> = Vec::with_capacity(PLAN_SIZE);

    for (idx, raw) in raw_items.iter().enumerate() {
        if !raw.is_object() {
            tracing::debug!(idx, "dropping non-object meal item");
            continue;
        }

        let tags = normalize_tags(raw.get("tags"));
        if !config.dietary.admits(&prefs.dietary, &tags) {
            tracing::debug!(idx, ?tags, "dropping meal item missing dietary tags");
            continue;
        }

        let prep_minutes = coerce_f64(raw.get("prep_minutes")).unwrap_or(MISSING_PREP_MINUTES) as i64;
        if prep_minutes > prefs.max_prep_minutes {
            tracing::debug!(idx, prep_minutes, "dropping meal item over prep limit");
            continue;
        }

        items.push(coerce_item(raw, tags, prep_minutes));
    }

    repair_coverage(&mut items);

    let mut fallbacks = FALLBACK_ITEMS.iter();
    while items.len() < PLAN_SIZE {
        let Some(fallback) = fallbacks.next() else { break };
        items.push(fallback.clone());
    }
    items.truncate(PLAN_SIZE);

    let summary = summarize(&items, prefs.budget_aud);
    MealPlan { items, summary }
}

fn coerce_item(raw: &Value, tags: Vec<String>, prep_minutes: i64) -> MealItem {
    let kind = match raw.get("kind").and_then(Value::as_str).map(|k| k.trim().to_lowercase()) {
        Some(k) if k == "snack" => MealKind::Snack,
        _ => MealKind::Meal,
    };

    let vitd_mcg = coerce_f64(raw.get("vitd_mcg")).unwrap_or(0.0);
    let vitd_iu = coerce_f64(raw.get("vitd_iu")).unwrap_or(vitd_mcg * IU_PER_MCG) as i64;
    let cost_aud = round2(coerce_f64(raw.get("cost_aud")).unwrap_or(0.0));

    let mut ingredients = string_list(raw.get("ingredients"));
    ingredients.truncate(MAX_INGREDIENTS);

    let mut recipe_steps = match non_empty(raw.get("recipe_steps")) {
        Some(Value::String(text)) => split_recipe(text),
        Some(steps) => string_list(Some(steps)),
        None => raw
            .get("recipe")
            .and_then(Value::as_str)
            .map(split_recipe)
            .unwrap_or_default(),
    };
    recipe_steps.truncate(MAX_RECIPE_STEPS);

    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| name_from_ingredient(ingredients.first()))
        .unwrap_or_else(|| PLACEHOLDER_NAME.to_string());

    MealItem {
        name,
        kind,
        cost_aud,
        prep_minutes,
        vitd_mcg: round1(vitd_mcg),
        vitd_iu,
        tags,
        ingredients,
        recipe_steps,
    }
}

/// First slot is reserved for the snack fix, second for the meal fix.
fn repair_coverage(items: &mut [MealItem]) {
    if !items.is_empty() && !items.iter().any(|i| i.kind == MealKind::Snack) {
        items[0].kind = MealKind::Snack;
    }
    if items.len() > 1 && !items.iter().any(|i| i.kind == MealKind::Meal) {
        items[1].kind = MealKind::Meal;
    }
}

fn summarize(items: &[MealItem], budget_aud: f64) -> MealSummary {
    let total = round2(items.iter().map(|i| i.cost_aud).sum());
    let budget_limit_aud = round2(budget_aud);
    MealSummary {
        total_cost_aud: total,
        budget_limit_aud,
        within_budget: if budget_limit_aud > 0.0 {
            total <= budget_limit_aud
        } else {
            true
        },
        has_snack: items.iter().any(|i| i.kind == MealKind::Snack),
        has_meal: items.iter().any(|i| i.kind == MealKind::Meal),
    }
}

/// Pulls the raw `items` array out of whatever shape the model proxy returned.
pub fn extract_items(payload: &Value) -> Vec<Value> {
    if let Some(items) = payload.as_array() {
        return items.clone();
    }
    if let Some(items) = payload.get("items") {
        return items.as_array().cloned().unwrap_or_default();
    }
    if let Some(items) = payload.get("output").and_then(|o| o.get("items")) {
        return items.as_array().cloned().unwrap_or_default();
    }

    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for part in parts {
            let Some(text) = part.get("text").and_then(Value::as_str) else {
                continue;
            };
            if let Some(doc) = parse_model_json(text) {
                if let Some(items) = doc.get("items").and_then(Value::as_array) {
                    return items.clone();
                }
            }
        }
    }
    Vec::new()
}

pub fn extract_items_from_text(text: &str) -> Vec<Value> {
    parse_model_json(text)
        .map(|doc| extract_items(&doc))
        .unwrap_or_default()
}

/// Parses a model answer, tolerating Markdown code fences around the JSON.
pub fn parse_model_json(text: &str) -> Option<Value> {
    serde_json::from_str(strip_code_fences(text)).ok()
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Splits "1. Boil water 2. Add oats" into steps; falls back to the whole text.
pub fn split_recipe(recipe: &str) -> Vec<String> {
    let chars: Vec<char> = recipe.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            if j < chars.len() && chars[j] == '.' {
                parts.push(std::mem::take(&mut current));
                i = j + 1;
            } else {
                current.extend(&chars[i..j]);
                i = j;
            }
            continue;
        }
        current.push(chars[i]);
        i += 1;
    }
    parts.push(current);

    let steps: Vec<String> = parts
        .iter()
        .map(|p| p.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if steps.is_empty() && !recipe.trim().is_empty() {
        vec![recipe.to_string()]
    } else {
        steps
    }
}

fn name_from_ingredient(first: Option<&String>) -> Option<String> {
    let head = first?.split(',').next()?.trim();
    (!head.is_empty()).then(|| title_case(head))
}

/// Capitalizes the first letter of every alphabetic run.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn normalize_tags(raw: Option<&Value>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in string_list(raw) {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(values)) => values.iter().filter_map(value_to_string).collect(),
        Some(other) => value_to_string(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `None` for missing, null, empty strings and empty arrays.
fn non_empty(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        _ => true,
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
