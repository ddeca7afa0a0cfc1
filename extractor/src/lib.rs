use middleware::extractor::ExtractionMiddleware;

pub mod auth;

pub mod middleware {
    pub mod extractor;
}

pub use auth::{AuthRecord, claimed_user_id};

pub fn middleware() -> ExtractionMiddleware {
    ExtractionMiddleware::new()
}
