pub type ScenographResult<T> = Result<T, ScenographError>;

/// Error taxonomy for recoverable scene-graph violations and collaborator
/// failures.
///
/// Structural and unsupported-combination rejections leave the graph
/// untouched; temporal violations are auto-corrected at the call site and
/// never surface here.
#[derive(thiserror::Error, Debug)]
pub enum ScenographError {
    #[error("structural violation: {0}")]
    Structural(String),

    #[error("temporal violation: {0}")]
    Temporal(String),

    #[error("unsupported combination: {0}")]
    Unsupported(String),

    #[error("pipeline failure: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenographError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn temporal(msg: impl Into<String>) -> Self {
        Self::Temporal(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }
}
