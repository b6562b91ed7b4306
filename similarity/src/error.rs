use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("face region is empty")]
    EmptyRegion,
    #[error("embedding dimensions differ: left {left}, right {right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("embedding has zero magnitude")]
    ZeroVector,
    #[error("embedder failed: {0}")]
    EmbedderFailure(String),
}
