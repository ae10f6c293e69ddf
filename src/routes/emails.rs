use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{EmailInput, EmailQuery},
    services::EmailService,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

/// Sends an email on behalf of the authenticated user.
///
/// Expects a JSON payload conforming to `EmailInput`. The email record is
/// created before any delivery is attempted, so failed sends are visible in
/// the listing with their failure detail.
///
/// ## Responses:
/// - `201 Created`: Returns `{success, email_id, message_id}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: If recipients, subject, or body are missing.
/// - `502 Bad Gateway` / `504 Gateway Timeout`: If the transport rejected the
///   message or the send exceeded the configured bound. The attempt is
///   recorded as failed either way.
#[post("")]
pub async fn send_email(
    service: web::Data<EmailService>,
    input: web::Json<EmailInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let outcome = service.send_email(user.0, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(outcome))
}

/// Lists the authenticated user's emails, newest first.
///
/// ## Query Parameters:
/// - `limit` (optional, default 10): page size.
/// - `page` (optional, default 1): 1-based page number.
/// - `status` (optional): filter by `draft`, `sent`, or `failed`.
///
/// ## Responses:
/// - `200 OK`: `{emails: [...], pagination: {total, page, pages, limit}}`.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_emails(
    service: web::Data<EmailService>,
    query: web::Query<EmailQuery>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let page = service.user_emails(user.0, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Probes the configured SMTP relay without sending anything.
#[get("/test/connection")]
pub async fn test_connection(
    service: web::Data<EmailService>,
) -> Result<impl Responder, AppError> {
    let reachable = service.test_connection().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": reachable })))
}

/// Open-tracking hit from a recipient's mail client.
///
/// Public (no auth): mail clients fetch the pixel anonymously. The hit is
/// logged server side; the response body does not matter to the client.
#[get("/track/{id}")]
pub async fn track_email(id: web::Path<String>) -> impl Responder {
    let id = id.into_inner();
    log::info!("Track email with ID: {}", id);
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Track",
        "email_id": id
    }))
}

/// Retrieves a specific email record by its ID.
///
/// The authenticated user must be the sender of the record; a record that
/// exists but belongs to someone else is reported as not found.
///
/// ## Responses:
/// - `200 OK`: Returns the `EmailRecord` as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the record does not exist or is not owned by the user.
#[get("/{id}")]
pub async fn get_email(
    service: web::Data<EmailService>,
    email_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let email = service.email_by_id(email_id.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(email))
}
