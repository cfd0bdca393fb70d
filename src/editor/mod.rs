//! Editing session and the models it drives: adjustments, crop presets, mask
//! painting and overlay objects.

pub mod adjustments;
pub mod crop;
pub mod mask;
pub mod session;
pub mod tools;

pub use adjustments::{EditorAdjustments, FilterPreset, TransformState};
pub use crop::CropPreset;
pub use mask::{DrawHistory, MaskLayer};
pub use session::{CropState, EditorSession, ImageState, SessionError, SessionResult};
pub use tools::{
    NewObject, ObjectId, ObjectKind, ObjectPatch, OverlayObject, OverlayObjects, SelectionState,
    ToolError,
};
