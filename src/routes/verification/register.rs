use actix_web::HttpResponse;
use actix_web::web::{Data, Form};
use crate::error::VerificationError;
use crate::store::{StoreError, UserStore};
use crate::types::{ErrorResponse, RegistrationForm, SuccessResponse};
use crate::utils::Mailer;
use crate::verification::{send_verification_email, EmailVerification};

#[tracing::instrument(name = "Registering a new user", skip(verification, form))]
pub async fn register_user<S: UserStore, M: Mailer>(
    verification: Data<EmailVerification<S, M>>,
    form: Form<RegistrationForm>,
) -> HttpResponse {
    match send_verification_email(verification.get_ref(), &form.0).await {
        Ok(()) => {
            tracing::event!(target: "verify_email", tracing::Level::INFO, "User created and verification email sent");
            HttpResponse::Ok().json(SuccessResponse {
                message: "Your account was created successfully. Check your email address to activate your \
                account as we just sent you an activation link.".to_string(),
            })
        }
        Err(VerificationError::Store(StoreError::AlreadyExists)) => {
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "A user with that email address already exists".to_string(),
            })
        }
        Err(e) => {
            tracing::event!(target: "verify_email", tracing::Level::ERROR, "Registration failed: {:#?}", e);
            let error = if verification.debug() {
                e.to_string()
            } else {
                "We could not send your verification email. Kindly try again.".to_string()
            };
            HttpResponse::InternalServerError().json(ErrorResponse { error })
        }
    }
}
