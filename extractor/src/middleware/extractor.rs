use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform}, web, Error, HttpMessage
};
use futures::future::{Ready, ok};

use common::{
    env_config::Config, error::Res, jwt::{self, JwtClaims}
};

pub struct ExtractionMiddleware {}

impl ExtractionMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // retrieve token from authorization header
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_owned());

        let jwt_secret = req
            .app_data::<web::Data<Arc<Config>>>()
            .map(|config| config.jwt_config.secret.clone());
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            match (bearer, jwt_secret) {
                (Some(token), Some(secret)) => {
                    // validate token and insert claims to request object for future use
                    let claims_res = jwt::validate_jwt(&token, &secret);
                    if let Err(e) = &claims_res {
                        log::debug!("Rejected bearer token: {}", e);
                    }
                    req.extensions_mut().insert::<Res<JwtClaims>>(claims_res);
                }
                (Some(_), None) => {
                    log::warn!("Bearer token present but no config registered; ignoring it");
                }
                _ => {}
            }
            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}
