use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub version: &'static str,
}
