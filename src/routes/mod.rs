mod health;
mod verification;

pub use health::health_check;

pub use verification::{register_user, verification_routes_config, verify_user_and_activate};
