use actix_web::web::Data;
use actix_web::HttpResponse;
use crate::store::UserStore;
use crate::types::{ErrorResponse, SuccessResponse};
use crate::utils::Mailer;
use crate::verification::EmailVerification;

/// Reports healthy only while the user store answers.
#[tracing::instrument(name = "Health check", skip(verification))]
pub async fn health_check<S: UserStore, M: Mailer>(
    verification: Data<EmailVerification<S, M>>,
) -> HttpResponse {
    match verification.store().ping().await {
        Ok(()) => HttpResponse::Ok().json(SuccessResponse {
            message: "Application is safe and healthy.".to_string(),
        }),
        Err(e) => {
            tracing::event!(target: "verify_email", tracing::Level::ERROR, "User store is unreachable: {}", e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "User store is unreachable.".to_string(),
            })
        }
    }
}
