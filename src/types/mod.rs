mod general;
mod users;

pub use general::{ErrorResponse, SuccessResponse};

pub use users::{NewUser, RegistrationForm, User};
