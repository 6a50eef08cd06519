//! Bearer token authentication for salon-owner routes
//!
//! Verifies the auth provider's access token on every request and stores the
//! authenticated owner in request extensions. Failures are answered with the
//! same JSON error body the services use: `{error, code, status}`.

use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::StatusCode,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use crypto_core::jwt::{AccessTokenVerifier, JwtError};
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Salon owner extracted from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedOwner {
    pub user_id: Uuid,
    pub email: Option<String>,
}

fn unauthorized(message: &'static str) -> Error {
    let body = serde_json::json!({
        "error": message,
        "code": "AUTHENTICATION_FAILED",
        "status": StatusCode::UNAUTHORIZED.as_u16(),
    });
    InternalError::from_response(message, HttpResponse::Unauthorized().json(body)).into()
}

fn authenticate(
    req: &ServiceRequest,
    verifier: &AccessTokenVerifier,
) -> Result<AuthenticatedOwner, Error> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

    let claims = verifier.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "Access token validation failed");
        match e {
            JwtError::Expired => unauthorized("Access token expired"),
            _ => unauthorized("Invalid access token"),
        }
    })?;

    let user_id = claims.user_id().map_err(|e| {
        tracing::error!(error = %e, "Access token subject is not a UUID");
        unauthorized("Invalid access token")
    })?;

    Ok(AuthenticatedOwner {
        user_id,
        email: claims.email,
    })
}

/// Access token authentication middleware
#[derive(Clone)]
pub struct BearerAuthMiddleware {
    verifier: Arc<AccessTokenVerifier>,
}

impl BearerAuthMiddleware {
    pub fn new(verifier: Arc<AccessTokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = BearerAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct BearerAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<AccessTokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let owner = authenticate(&req, &verifier)?;
            tracing::debug!(user_id = %owner.user_id, "Salon owner authenticated");
            req.extensions_mut().insert(owner);

            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedOwner {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedOwner>() {
            Some(owner) => ready(Ok(owner.clone())),
            None => ready(Err(unauthorized("User not authenticated"))),
        }
    }
}
