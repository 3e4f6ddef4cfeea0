use std::ops::Deref;

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use log::debug;
use payment_order_engine::db_types::Principal;

use crate::errors::ServerError;

/// The buyer making the request, as established by the identity middleware.
///
/// Handlers that take an `AuthenticatedPrincipal` answer 401 when nobody has been identified. Use
/// `Option<AuthenticatedPrincipal>` where the caller may be anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub Principal);

impl Deref for AuthenticatedPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedPrincipal {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned().filter(|p| !p.email.trim().is_empty());
        let result = principal.map(AuthenticatedPrincipal).ok_or_else(|| {
            debug!("💻️ No authenticated principal for {}", req.path());
            ServerError::Unauthenticated
        });
        ready(result)
    }
}
