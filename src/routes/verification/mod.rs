use actix_web::web::{get, post, resource, scope, ServiceConfig};
use crate::store::UserStore;
use crate::utils::Mailer;

mod register;
mod verify;

pub use register::register_user;
pub use verify::verify_user_and_activate;

/// Mounts the registration and verification endpoints under `/verification/user`.
pub fn verification_routes_config<S: UserStore, M: Mailer>(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/verification/user")
            .service(resource("/register/").route(post().to(register_user::<S, M>)))
            .service(
                resource("/verify-email/{useremail}/{usertoken}/")
                    .route(get().to(verify_user_and_activate::<S, M>)),
            ),
    );
}
