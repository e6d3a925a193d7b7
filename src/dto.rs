use serde::Serialize;

/// Body of responses that only carry a human-readable outcome.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
