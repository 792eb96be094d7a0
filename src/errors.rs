/// Failures of the alert-delivery path and of startup wiring.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("alert delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error(transparent)]
    Email(#[from] lettre::error::Error),
}
