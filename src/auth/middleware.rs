//! Bearer-token gate in front of the API scope.
//!
//! Verified claims are stashed in request extensions for the
//! `AuthenticatedUserId` extractor to pick up. A small set of paths stays
//! public: the health probe, and the open-tracking pixel that recipients'
//! mail clients fetch without credentials.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::verify_token;
use crate::error::AppError;

/// Paths reachable without a token.
fn is_public(path: &str) -> bool {
    path == "/health" || path.starts_with("/api/emails/track")
}

/// Pulls the token out of a `Bearer` authorization header, if any.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthService { inner: service }))
    }
}

pub struct AuthService<S> {
    inner: S,
}

impl<S, B> Service<ServiceRequest> for AuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(inner);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.path()) {
            return Box::pin(self.inner.call(req));
        }

        let verified = match bearer_token(&req) {
            Some(token) => verify_token(token),
            None => Err(AppError::Unauthorized("Missing token".into())),
        };

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.inner.call(req))
            }
            Err(err) => Box::pin(async move { Err(err.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App, HttpResponse};

    #[::core::prelude::v1::test]
    fn test_public_paths() {
        assert!(is_public("/health"));
        assert!(is_public("/api/emails/track/some-id"));
        assert!(!is_public("/api/emails"));
        assert!(!is_public("/api/emails/test/connection"));
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        // No Authorization header at all; the gate rejects before any
        // token verification happens, so no JWT secret is needed.
        let app = test::init_service(
            App::new().service(web::scope("/api").wrap(AuthMiddleware).route(
                "/emails",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            )),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/emails").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_track_path_skips_the_gate() {
        let app = test::init_service(
            App::new().service(web::scope("/api").wrap(AuthMiddleware).route(
                "/emails/track/{id}",
                web::get().to(|| async { HttpResponse::Ok().finish() }),
            )),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/emails/track/abc")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }
}
