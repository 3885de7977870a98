use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::curriculum::CurriculumRecord;
use crate::{LESSON_PROMPT, LESSON_SYSTEM_PROMPT};

/// Everything the prompt needs besides the resolved curriculum context.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub grade: String,
    pub subject: String,
    pub topic: String,
    pub curriculum_context: String,
    pub teacher_input: Option<String>,
    pub language: String,
    pub classroom_context: String,
    pub output_mode: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedPlan {
    pub from_cache: bool,
    pub result: Value,
}

/// Flatten a resolved record into the context block the prompt expects.
pub fn curriculum_context(record: &CurriculumRecord) -> String {
    let mut out = String::new();
    for (title, items) in [
        ("Objectives", &record.objectives),
        ("Content", &record.content),
        ("Teacher activities", &record.teacher_activities),
        ("Student activities", &record.student_activities),
        ("Resources", &record.resources),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(title);
        out.push_str(":\n");
        for item in items {
            out.push_str("- ");
            out.push_str(item);
            out.push('\n');
        }
    }
    out
}

fn cache_dir() -> PathBuf {
    PathBuf::from(env::var("LESSON_CACHE_DIR").unwrap_or_else(|_| "tmp_cache".to_string()))
}

/// Plans are cached per distinct request so repeated demo queries don't
/// burn API calls.
fn cache_key(req: &PlanRequest) -> String {
    let raw = serde_json::to_string(&json!([
        req.subject,
        req.grade,
        req.topic,
        req.teacher_input.as_deref().unwrap_or(""),
        req.language,
        req.output_mode == "short",
    ]))
    .unwrap_or_default();

    hex::encode(Sha256::digest(raw.as_bytes()))
}

fn read_cache(key: &str) -> Option<Value> {
    let path = cache_dir().join(format!("{key}.json"));
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_cache(key: &str, value: &Value) {
    let dir = cache_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!("could not create lesson cache dir {}: {}", dir.display(), e);
        return;
    }
    let path = dir.join(format!("{key}.json"));
    if let Err(e) = fs::write(&path, serde_json::to_string_pretty(value).unwrap_or_default()) {
        warn!("could not write lesson cache {}: {}", path.display(), e);
    }
}

fn build_prompt(req: &PlanRequest) -> String {
    let mut context = req.curriculum_context.trim().to_string();
    if context.is_empty() {
        context = "(no curriculum context provided)".to_string();
    } else if context.chars().count() > 4000 {
        context = context.chars().take(3900).collect::<String>() + " ... [truncated]";
    }

    LESSON_PROMPT
        .replace("{curriculum_context}", &context)
        .replace("{grade}", &req.grade)
        .replace("{subject}", &req.subject)
        .replace("{topic}", &req.topic)
        .replace("{language}", &req.language)
        .replace("{classroom_context}", &req.classroom_context)
        .replace(
            "{teacher_input}",
            req.teacher_input.as_deref().unwrap_or("None provided"),
        )
        .replace(
            "{output_mode}",
            if req.output_mode == "short" { "short" } else { "full" },
        )
}

/// Offline stub used when no LLM credentials are configured, so local dev
/// and demos still produce something renderable.
fn offline_plan() -> Value {
    json!({
        "title": "SAMPLE LESSON - offline mode",
        "objectives": ["(offline) practice objective 1", "(offline) practice objective 2"],
        "introduction": "Introduce topic briefly (offline fallback).",
        "activities": ["Activity 1 (discussion)", "Activity 2 (hands-on)"],
        "assessment": ["Ask students to summarize key points"],
        "materials": ["Local objects, chalk, paper"],
        "notes": "Offline fallback used because no LLM credentials configured."
    })
}

async fn call_llm(client: &reqwest::Client, prompt: &str) -> String {
    let api_url = env::var("LLM_API_URL").unwrap_or_default();
    let api_key = env::var("LLM_API_KEY").unwrap_or_default();
    let mut model = env::var("LLM_MODEL").unwrap_or_default();
    if model.is_empty() {
        model = "default".to_string();
    }

    if api_url.is_empty() || api_key.is_empty() {
        warn!("LLM_API_URL or LLM_API_KEY not configured, using offline fallback");
        return offline_plan().to_string();
    }

    let payload = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": LESSON_SYSTEM_PROMPT},
            {"role": "user", "content": prompt}
        ],
        "temperature": 0.15,
        "max_tokens": 1200
    });

    let response = client
        .post(&api_url)
        .bearer_auth(&api_key)
        .json(&payload)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .and_then(|r| r.error_for_status());

    let data: Value = match response {
        Ok(resp) => match resp.json().await {
            Ok(data) => data,
            Err(e) => return json!({"error": format!("LLM request failed: {e}")}).to_string(),
        },
        Err(e) => return json!({"error": format!("LLM request failed: {e}")}).to_string(),
    };

    // OpenAI-style first, then a plain `text` field, then the raw body.
    if let Some(content) = data
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return content.to_string();
    }
    if let Some(text) = data.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    data.to_string()
}

/// Some models wrap the JSON plan in prose; pull out the first
/// brace-delimited object before giving up.
fn parse_plan(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return value;
            }
        }
    }

    json!({"error": "LLM did not return valid JSON", "raw": raw})
}

/// Generate (or fetch from cache) a lesson plan for an already resolved
/// curriculum lookup.
pub async fn generate_lesson_plan(client: &reqwest::Client, req: &PlanRequest) -> GeneratedPlan {
    let key = cache_key(req);
    if let Some(cached) = read_cache(&key) {
        return GeneratedPlan {
            from_cache: true,
            result: cached,
        };
    }

    let prompt = build_prompt(req);
    let raw = call_llm(client, &prompt).await;
    let parsed = parse_plan(&raw);

    if parsed.is_object() {
        write_cache(&key, &parsed);
    }

    GeneratedPlan {
        from_cache: false,
        result: parsed,
    }
}
