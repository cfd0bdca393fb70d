use crate::ai::TransformServiceError;
use crate::compositor::CompositorError;
use crate::editor::SessionError;
use crate::media::MediaError;
use crate::state::StateError;
use crate::text::TextError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Compositor(#[from] CompositorError),
    #[error(transparent)]
    TransformService(#[from] TransformServiceError),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("failed to read input {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
