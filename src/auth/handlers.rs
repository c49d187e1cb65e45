use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::models::{Plan, PublicUser};
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    // Optional so missing keys surface as the documented 400, not a
    // deserializer error.
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub plan: Option<Plan>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User object embedded in the login response. Narrower than the listing
/// projection; the field set is part of the wire contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginUser {
    id: Uuid,
    name: String,
    email: String,
    plan: Plan,
    free_requests_used: i32,
}

pub async fn create_user(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let (name, email, password) = match (req.name, req.email, req.password) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(AppError::Validation("all fields required".into())),
    };

    info!("registration request for email: {}", email);
    match state
        .auth
        .register(&name, &email, &password, req.plan.unwrap_or_default())
        .await
    {
        Ok(user) => {
            info!("user created: {}", user.id);
            Ok(HttpResponse::Created().json(json!({
                "message": "user created",
                "id": user.id,
            })))
        }
        Err(e) => {
            error!("registration failed for {}: {}", email, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let (email, password) = match (req.email, req.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(AppError::Validation("email and password required".into())),
    };

    info!("login request for email: {}", email);
    let (token, user) = state.auth.login(&email, &password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "user": LoginUser {
            id: user.id,
            name: user.name,
            email: user.email,
            plan: user.plan,
            free_requests_used: user.free_requests_used,
        },
    })))
}

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = state.store.list().await?;
    let users: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(HttpResponse::Ok().json(users))
}
