#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AggregatorError {
    #[error("Channel name must not be empty")]
    EmptyChannel,

    #[error("Logging setup failed: {msg}")]
    LoggingSetup { msg: String },
}
