//! Prompt construction for the Gemini-backed routes.
//!
//! Everything here is pure string building over the request payloads so it
//! can be tested without a network.

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;

/// Plants past this many are left out of the chat system prompt.
pub const MAX_CONTEXT_PLANTS: usize = 20;

/// Garden context sent by the app alongside chat and diagnosis requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenContext {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub weather: Option<Value>,
    #[serde(default)]
    pub plants: Vec<PlantSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub planted_date: Option<String>,
    #[serde(default)]
    pub days_since_planted: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Render a loosely-typed JSON scalar the way a person would write it.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ADVISOR_PREAMBLE: &str = "\
You are Furrow's Garden Advisor, an expert on outdoor vegetable gardening. \
You provide practical, actionable advice for home gardeners growing food.

Rules:
- Keep responses concise (2-4 paragraphs max)
- Focus on vegetable, herb, and fruit gardening
- Be encouraging but honest about challenges
- When relevant, suggest specific actionable steps
- If you're not sure about something, say so
- Use simple language, avoid jargon unless explaining it";

pub fn chat_system_prompt(context: Option<&GardenContext>) -> String {
    let mut prompt = ADVISOR_PREAMBLE.to_string();
    let Some(ctx) = context else {
        return prompt;
    };

    if let Some(zone) = non_empty(&ctx.zone) {
        let _ = write!(prompt, "\n\nThe gardener is in USDA Hardiness Zone {zone}.");
    }
    if let Some(season) = non_empty(&ctx.season) {
        let _ = write!(prompt, "\nCurrent season: {season}.");
    }
    if let Some(weather) = ctx.weather.as_ref().filter(|w| w.is_object()) {
        let field = |key: &str| weather.get(key).and_then(scalar);
        let _ = write!(
            prompt,
            "\nCurrent weather: {}, {} temperature.",
            field("condition").unwrap_or_else(|| "unknown".into()),
            field("temp").unwrap_or_else(|| "unknown".into()),
        );
        if let Some(forecast) = field("forecast") {
            let _ = write!(prompt, " 7-day forecast: {forecast}");
        }
    }

    if !ctx.plants.is_empty() {
        prompt.push_str("\n\nTheir current garden contains:");
        for p in ctx.plants.iter().take(MAX_CONTEXT_PLANTS) {
            let _ = write!(prompt, "\n- {}", p.name);
            if let Some(species) = non_empty(&p.species) {
                let _ = write!(prompt, " ({species})");
            }
            if let Some(date) = non_empty(&p.planted_date) {
                let _ = write!(prompt, ", planted {date}");
            }
            if let Some(days) = p.days_since_planted.as_ref().and_then(scalar) {
                let _ = write!(prompt, " ({days} days ago)");
            }
            if let Some(status) = non_empty(&p.status) {
                let _ = write!(prompt, ", status: {status}");
            }
        }
    }

    prompt
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recommendations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// The base (non-personalized) recommendation prompt.  Depends only on
/// zone, month and garden size so the answer can be shared across users.
pub fn recommend_prompt(zone: &str, month: u32, garden_size: Option<&str>) -> String {
    let size = garden_size
        .filter(|s| !s.is_empty())
        .map(|s| format!("Garden size: {s}."))
        .unwrap_or_default();

    format!(
        "You are a vegetable garden planting advisor. Give practical planting \
recommendations for USDA Hardiness Zone {zone} in {month}.

{size}

Provide:
1. **Plant Now (Direct Sow)**: what can be planted directly in the ground right now
2. **Start Indoors**: what seeds to start indoors for transplanting later
3. **Harvest Time**: what may be ready to harvest if previously planted
4. **Garden Tasks**: 2-3 important tasks for this month (mulching, pruning, pest prevention, etc.)
5. **Pro Tip**: one expert tip specific to this zone and month

Focus on common vegetable garden crops: tomatoes, peppers, squash, beans, peas, lettuce, herbs, root vegetables, etc.
Keep it concise and actionable. Use bullet points.",
        month = month_name(month),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Diagnosis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const DOCTOR_PREAMBLE: &str = "\
You are Furrow's Plant Doctor, an expert at diagnosing vegetable garden plant problems from photos.

When analyzing a photo, provide:
1. **Diagnosis**: what you observe (disease, pest, deficiency, environmental stress, or healthy)
2. **Severity**: Mild, Moderate, or Severe
3. **Cause**: most likely cause
4. **Treatment**: specific, actionable steps the home gardener can take
5. **Prevention**: how to prevent this in the future

Keep responses concise and practical. If the plant looks healthy, celebrate that!
If you're unsure, say so and suggest what additional information would help.
Don't make up issues that aren't visible in the photo.";

pub fn diagnosis_system_prompt(context: &GardenContext) -> String {
    let mut prompt = DOCTOR_PREAMBLE.to_string();
    if let Some(zone) = non_empty(&context.zone) {
        let _ = write!(prompt, "\n\nGardener's USDA Zone: {zone}");
    }
    if let Some(season) = non_empty(&context.season) {
        let _ = write!(prompt, "\nSeason: {season}");
    }
    if let Some(weather) = context.weather.as_ref().filter(|w| !w.is_null()) {
        let _ = write!(prompt, "\nRecent weather: {weather}");
    }
    prompt
}

/// The user turn that accompanies the photo.
pub fn diagnosis_question(plant_name: &str, description: &str) -> String {
    if description.is_empty() {
        format!(
            "Analyze this photo of my {plant_name}. Identify any diseases, pests, nutrient \
deficiencies, or other issues. If the plant looks healthy, say so."
        )
    } else {
        format!("What's wrong with this {plant_name}? {description}")
    }
}
