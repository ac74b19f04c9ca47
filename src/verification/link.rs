use crate::error::VerificationError;
use crate::types::User;
use crate::utils::{encode, TokenGenerator};

pub const VERIFY_EMAIL_PATH: &str = "/verification/user/verify-email";

/// `{site_origin}/verification/user/verify-email/{b64(email)}/{b64(token)}/`
pub(crate) fn build_link(
    site_origin: &str,
    tokens: &TokenGenerator,
    inactive_user: &User,
    useremail: &str,
) -> Result<String, VerificationError> {
    let token = tokens.make_token(inactive_user)?;
    Ok(format!(
        "{}{}/{}/{}/",
        site_origin,
        VERIFY_EMAIL_PATH,
        encode(useremail),
        encode(token)
    ))
}
