//! Shared-secret check on the `X-API-Key` header.

use std::collections::HashSet;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::{Error, HttpResponse};

pub(crate) const API_KEY_HEADER: &str = "X-API-Key";

type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

/// In-memory set of accepted keys. An empty set disables the check.
#[derive(Debug, Default, Clone)]
pub(crate) struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub(crate) fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    pub(crate) fn allows(&self, presented: Option<&str>) -> bool {
        !self.is_enabled() || presented.is_some_and(|key| self.keys.contains(key))
    }
}

/// Rejects requests without a configured key with `401` before they reach
/// any handler.
pub(crate) struct ApiKeyAuth {
    keys: Arc<ApiKeys>,
}

impl ApiKeyAuth {
    pub(crate) fn new(keys: Arc<ApiKeys>) -> Self {
        ApiKeyAuth { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthService {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub(crate) struct ApiKeyAuthService<S> {
    service: S,
    keys: Arc<ApiKeys>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let presented = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if self.keys.allows(presented) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        log::warn!("Rejected request to {} without a valid API key", req.path());
        let response = HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "Invalid or missing API key" }));
        Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
    }
}
