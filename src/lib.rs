//! Plakat renders promotional banner images from declarative templates.
//!
//! The pipeline is deterministic and split like a small compiler:
//!
//! - Describe the banner with a [`TemplateDescriptor`] (or start from its
//!   default template)
//! - Create a [`TemplateRenderer`] over an [`AssetSource`]; construction
//!   validates the descriptor and front-loads every fixed asset
//! - Stage overrides (user photo, background color, caption text) and call
//!   [`TemplateRenderer::render`] for a premultiplied RGBA8 frame
//!
//! Layers draw in a fixed order: background color, design pattern, user
//! photo, stroke overlay, caption, CTA button. A fixed asset that fails to
//! load skips its layer and is reported; it never fails the render.
#![forbid(unsafe_code)]

pub mod assets;
pub mod button;
pub mod color;
pub mod compile;
pub mod core;
pub mod editor;
pub mod error;
pub mod model;
pub mod render;
pub mod text;
pub mod wrap;

pub use crate::assets::{
    AssetSource, DirAssets, FixedAsset, LoadState, LoadStatus, MemoryAssets, PhotoSource,
};
pub use crate::color::Color;
pub use crate::compile::{Layer, LayerSkip, RenderPlan};
pub use crate::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8Premul, Vec2};
pub use crate::editor::{
    LatestFrame, RenderGeneration, RenderReport, RenderedBanner, TemplateRenderer,
};
pub use crate::error::{PlakatError, PlakatResult};
pub use crate::model::{
    Alignment, Caption, Cta, DEFAULT_BACKGROUND, MaskRect, TemplateAssets, TemplateDescriptor,
};
pub use crate::render::{FrameRGBA, RenderBackend};
pub use crate::wrap::WrapMode;
