use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub model: Option<String>,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

pub async fn generate(
    req: HttpRequest,
    body: web::Json<GenerateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let user_prompt = match body.user_prompt.as_deref() {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => return Err(AppError::Validation("userPrompt required".into())),
    };

    // Bad or expired tokens fall back to anonymous rather than failing the
    // call; they just lose any plan-aware treatment.
    let identity = state.auth.resolve_identity(bearer_token(&req)).await;
    state.quota.admit(&identity).await?;

    let result = state
        .llm
        .complete(body.system_prompt.as_deref(), user_prompt, body.model.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "result": result })))
}
