//! Webhook signature middleware for Actix Web.
//!
//! The payment provider signs every notification it delivers. The signature is sent in the `x-signature` header and
//! covers a manifest made up of the payment id (the same [`WebhookQuery::payment_id`] the webhook handler reconciles),
//! the `x-request-id` header and the signature timestamp. See [`crate::helpers`] for the format.
//!
//! Wrap the webhook route with this middleware to reject notifications that were not signed with the configured
//! webhook secret.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorForbidden,
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use quiz_common::Secret;

use crate::{
    data_objects::WebhookQuery,
    helpers::{parse_signature_header, signature_manifest, verify_hmac},
};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HmacMiddlewareFactory {
    key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl HmacMiddlewareFactory {
    pub fn new(key: Secret<String>, enabled: bool) -> Self {
        HmacMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { key: self.key.clone(), enabled: self.enabled, service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            if !enabled {
                trace!("🔐️ Webhook signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            if secret.is_empty() {
                warn!("🔐️ No webhook secret is configured. Denying access.");
                return Err(ErrorForbidden("Webhook signatures cannot be verified."));
            }
            let signature = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_signature_header)
                .ok_or_else(|| {
                    warn!("🔐️ No valid webhook signature found in request. Denying access.");
                    ErrorForbidden("No webhook signature found.")
                })?;
            let request_id = req.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok());
            let query = web::Query::<WebhookQuery>::from_query(req.query_string())
                .map(|q| q.into_inner())
                .unwrap_or_default();
            let manifest = signature_manifest(query.payment_id(), request_id, &signature.ts);
            if verify_hmac(&secret, manifest.as_bytes(), &signature.v1) {
                trace!("🔐️ Webhook signature for request ✅️");
                service.call(req).await
            } else {
                warn!("🔐️ Invalid webhook signature found in request. Denying access.");
                Err(ErrorForbidden("Invalid webhook signature."))
            }
        })
    }
}
