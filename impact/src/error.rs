#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event at {current}s arrived after an event at {previous}s")]
    OutOfOrder { previous: f64, current: f64 },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
