use std::{sync::Arc, time::Instant};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use colored::{ColoredString, Colorize};
use futures::future::{LocalBoxFuture, Ready, ready};
use log::info;

/// Logs one line per request. The request body is left untouched so
/// handlers that verify the raw payload still see every byte.
pub struct LoggerMiddleware {}

impl LoggerMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = LoggerMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddlewareService {
            service: Arc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let user_id = extractor::claimed_user_id(&req);
        let started = Instant::now();
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            let res = srv.call(req).await?;
            let elapsed_ms = started.elapsed().as_millis();

            info!(
                "[{}] {} {} {} user_id={}",
                colored_status(res.status().as_u16()),
                colored_method(&method),
                path.bright_white(),
                format!("({}ms)", elapsed_ms).bright_black(),
                user_id
                    .map_or("None".to_string(), |id| id.to_string())
                    .bright_blue(),
            );

            Ok(res.map_into_boxed_body())
        })
    }
}

fn colored_status(status_code: u16) -> ColoredString {
    match status_code {
        200..=299 => status_code.to_string().green(),
        300..=399 => status_code.to_string().yellow(),
        400..=499 => status_code.to_string().bright_red(),
        _ => status_code.to_string().red(),
    }
}

fn colored_method(method: &str) -> ColoredString {
    match method {
        "GET" => method.blue(),
        "POST" => method.yellow(),
        "PUT" => method.purple(),
        "DELETE" => method.red(),
        _ => method.normal(),
    }
}
