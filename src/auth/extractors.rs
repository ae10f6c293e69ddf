use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The id of the user behind the current request.
///
/// Reads the `Claims` that `AuthMiddleware` left in the request extensions
/// after verifying the bearer token. On a route that is not behind the
/// middleware there are no claims to read, and extraction fails with
/// `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    // AppError converts into the actix error type through ResponseError.
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .extensions()
            .get::<Claims>()
            .map(|claims| AuthenticatedUserId(claims.sub))
            .ok_or_else(|| {
                AppError::Unauthorized("No authenticated user on this request".into()).into()
            });
        ready(user_id)
    }
}
