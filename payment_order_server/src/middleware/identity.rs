//! Identity header middleware.
//!
//! Authentication happens upstream of this server. When the upstream proxy is trusted, it passes the authenticated
//! buyer on in `X-Authenticated-*` headers, and this middleware turns them into a [`Principal`] in the request
//! extensions. When it is not trusted, the headers are ignored, and the principal must be supplied by some other
//! middleware.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use payment_order_engine::db_types::Principal;

pub const EMAIL_HEADER: &str = "X-Authenticated-Email";
pub const FIRST_NAME_HEADER: &str = "X-Authenticated-First-Name";
pub const LAST_NAME_HEADER: &str = "X-Authenticated-Last-Name";
pub const DISPLAY_NAME_HEADER: &str = "X-Authenticated-Name";

pub struct IdentityHeadersFactory {
    trusted: bool,
}

impl IdentityHeadersFactory {
    pub fn new(trusted: bool) -> Self {
        IdentityHeadersFactory { trusted }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityHeadersFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = IdentityHeadersService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdentityHeadersService { trusted: self.trusted, service: Rc::new(service) })
    }
}

pub struct IdentityHeadersService<S> {
    trusted: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityHeadersService<S>
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
        let service = Rc::clone(&self.service);
        if self.trusted {
            // An upstream middleware may already have identified the caller
            let known = req.extensions().get::<Principal>().is_some();
            if !known {
                if let Some(principal) = principal_from_headers(req.headers()) {
                    trace!("💻️ Identified {} from identity headers", principal.email);
                    req.extensions_mut().insert(principal);
                }
            }
        } else if req.headers().contains_key(EMAIL_HEADER) {
            debug!("💻️ Ignoring identity headers from an untrusted source");
        }
        Box::pin(async move { service.call(req).await })
    }
}

pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let get = |name: &str| {
        headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|s| !s.is_empty()).map(String::from)
    };
    let email = get(EMAIL_HEADER)?;
    let mut principal = Principal::new(email);
    let first_name = get(FIRST_NAME_HEADER);
    let last_name = get(LAST_NAME_HEADER);
    if first_name.is_some() || last_name.is_some() {
        principal =
            principal.with_names(first_name.as_deref().unwrap_or_default(), last_name.as_deref().unwrap_or_default());
    }
    if let Some(name) = get(DISPLAY_NAME_HEADER) {
        principal = principal.with_display_name(&name);
    }
    Some(principal)
}
