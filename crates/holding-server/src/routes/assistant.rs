use axum::extract::State;
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::ok;
use crate::state::AppState;
use holding_core::config::Config;

#[derive(serde::Deserialize)]
pub struct AssistantBody {
    pub prompt: String,
    /// Optional system instruction (persona) prepended to the request.
    #[serde(default)]
    pub persona: Option<String>,
    /// Optional extracted document text for the analysis flow.
    #[serde(default)]
    pub document_text: Option<String>,
}

/// POST /api/assistant/chat — relay a prompt to the external model.
///
/// Upstream failures never surface as HTTP errors: the contract is an
/// in-thread assistant message either way, with `error: true` when the
/// upstream call failed. Suggestions are advisory; nothing here writes
/// project state.
pub async fn chat(
    State(app): State<AppState>,
    Extension(CurrentUser(_current)): Extension<CurrentUser>,
    Json(body): Json<AssistantBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = tokio::task::spawn_blocking(move || Config::load(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    match generate(&config, &body).await {
        Ok(reply) => Ok(ok(serde_json::json!({ "reply": reply, "error": false }))),
        Err(e) => {
            tracing::warn!("assistant call failed: {e}");
            Ok(ok(serde_json::json!({
                "reply": "O assistente está indisponível no momento. Tente novamente mais tarde.",
                "error": true,
            })))
        }
    }
}

/// POST /api/assistant/analyze-document — structured document analysis.
/// Returns `{summary, key_info, suggested_tasks}`; suggested tasks are only
/// proposals a human confirms through the normal task endpoints.
pub async fn analyze_document(
    State(app): State<AppState>,
    Extension(CurrentUser(_current)): Extension<CurrentUser>,
    Json(body): Json<AssistantBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let config = tokio::task::spawn_blocking(move || Config::load(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let request = AssistantBody {
        prompt: format!(
            "Analise o documento a seguir e responda apenas com JSON no formato \
             {{\"summary\": string, \"key_info\": [string], \"suggested_tasks\": [string]}}.\n\n{}",
            body.document_text.as_deref().unwrap_or(&body.prompt)
        ),
        persona: body.persona,
        document_text: None,
    };

    match generate(&config, &request).await {
        Ok(reply) => {
            let parsed: serde_json::Value = serde_json::from_str(reply.trim()).unwrap_or_else(|_| {
                serde_json::json!({
                    "summary": reply,
                    "key_info": [],
                    "suggested_tasks": [],
                })
            });
            Ok(ok(serde_json::json!({ "analysis": parsed, "error": false })))
        }
        Err(e) => {
            tracing::warn!("assistant analysis failed: {e}");
            Ok(ok(serde_json::json!({ "analysis": null, "error": true })))
        }
    }
}

async fn generate(config: &Config, body: &AssistantBody) -> anyhow::Result<String> {
    let api_key = std::env::var(&config.assistant.api_key_env).unwrap_or_default();
    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        config.assistant.base_url.trim_end_matches('/'),
        config.assistant.model,
        api_key,
    );

    let mut payload = serde_json::json!({
        "contents": [{ "parts": [{ "text": body.prompt }] }],
    });
    if let Some(persona) = &body.persona {
        payload["systemInstruction"] = serde_json::json!({ "parts": [{ "text": persona }] });
    }

    let response = reqwest::Client::new().post(&url).json(&payload).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("assistant upstream returned {}", response.status());
    }
    let value: serde_json::Value = response.json().await?;
    let text = value["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("assistant response missing text"))?;
    Ok(text.to_string())
}
