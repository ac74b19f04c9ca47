use actix_web::http::header::{ContentType, LOCATION};
use actix_web::web::{Data, Path};
use actix_web::HttpResponse;
use minijinja::context;
use tracing::instrument;
use crate::settings::SettingKey;
use crate::store::UserStore;
use crate::types::{ErrorResponse, SuccessResponse};
use crate::utils::Mailer;
use crate::verification::{verify_user, EmailVerification};

const SUCCESS_STATUS: &str = "Verification Successful!";
const FAILED_STATUS: &str = "Verification Failed!";

/// Target of the emailed link. Activates the account and answers with the
/// configured success or failure page.
///
/// A redirect setting without a template redirects; otherwise the template
/// is rendered with `msg`, `status` and `link` (the redirect target, if any).
#[instrument(name = "Activating a new user", skip(verification, path))]
pub async fn verify_user_and_activate<S: UserStore, M: Mailer>(
    verification: Data<EmailVerification<S, M>>,
    path: Path<(String, String)>,
) -> HttpResponse {
    let (useremail, usertoken) = path.into_inner();
    let settings = verification.settings();

    let verified = verify_user(verification.get_ref(), &useremail, &usertoken).await;
    let (redirect_key, template_key, msg_key, status) = if verified {
        (SettingKey::SuccessRedirect, SettingKey::SuccessTemplate, SettingKey::SuccessMsg, SUCCESS_STATUS)
    } else {
        (SettingKey::FailedRedirect, SettingKey::FailedTemplate, SettingKey::FailedMsg, FAILED_STATUS)
    };
    let redirect = settings.get(redirect_key);
    let msg = settings.get(msg_key).unwrap_or(status);

    match (redirect, settings.get(template_key)) {
        (Some(target), None) => HttpResponse::SeeOther()
            .insert_header((LOCATION, target.to_string()))
            .finish(),
        (_, Some(template)) => {
            match verification
                .templates()
                .render(template, context! { msg => msg, status => status, link => redirect })
            {
                Ok(page) => HttpResponse::Ok().content_type(ContentType::html()).body(page),
                Err(e) => {
                    tracing::event!(target: "verify_email", tracing::Level::ERROR, "Cannot render `{}`: {:#?}", template, e);
                    let error = if verification.debug() {
                        e.to_string()
                    } else {
                        "Something unexpected happened. Kindly try again.".to_string()
                    };
                    HttpResponse::InternalServerError().json(ErrorResponse { error })
                }
            }
        }
        (None, None) if verified => HttpResponse::Ok().json(SuccessResponse {
            message: msg.to_string(),
        }),
        (None, None) => HttpResponse::BadRequest().json(ErrorResponse {
            error: msg.to_string(),
        }),
    }
}
