#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod core;
pub mod error;
pub mod export;
pub mod fx;
pub mod gesture;
pub mod model;
pub mod render;
pub mod service;
pub mod state;
mod text;

pub use assets::{AssetStore, PreparedImage};
pub use core::{Canvas, Rgba8, Vec2};
pub use error::{FailureClass, ThumbError, ThumbResult};
pub use export::export_scene;
pub use gesture::{GestureController, GestureTarget};
pub use model::{
    ArrowMarker, CircleHighlight, FocusBadge, Scene, TextAlign, TextBlock, TextStyleId,
};
pub use render::{Compositor, FrameRgba};
pub use service::{
    CredentialPicker, Gate, ImageStandardizer, ServiceError, StandardizeOutcome,
    StandardizeRequest, TitleTranslator,
};
pub use state::EditorState;
