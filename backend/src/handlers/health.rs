//! Health check handler

/// Health check endpoint for load balancers and uptime monitors
pub async fn health_check() -> &'static str {
    "OK"
}
