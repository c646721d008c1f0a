//! Stateful banner renderer: one descriptor, mutable overrides, frames out.

use crate::{
    assets::{
        AssetSource, LoadStatus, PhotoSource, PreparedAssetStore, PreparedImage, prepare_photo,
    },
    color::Color,
    compile::{LayerSkip, compile_template},
    error::PlakatResult,
    model::{DEFAULT_BACKGROUND, TemplateDescriptor},
    render::{FrameRGBA, RenderBackend, cpu::CpuRasterizer},
    text::TextShaper,
};

/// Monotone id for one render submission. Newer renders compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderGeneration(pub u64);

/// Per-render account of layers that compiled to nothing.
#[derive(Clone, Debug, Default)]
pub struct RenderReport {
    pub skipped: Vec<LayerSkip>,
}

/// One finished render.
#[derive(Clone, Debug)]
pub struct RenderedBanner {
    pub generation: RenderGeneration,
    pub frame: FrameRGBA,
    pub report: RenderReport,
}

/// Mutable per-session overrides layered over the descriptor.
#[derive(Clone, Debug, Default)]
struct RenderState {
    background_color: Option<Color>,
    photo: Option<PreparedImage>,
}

/// Renders one template descriptor with interactive overrides.
///
/// Construction validates the descriptor and front-loads every fixed asset;
/// after that, rendering is IO-free and deterministic. Setters stage state
/// for the next [`render`](Self::render) call and never draw on their own.
pub struct TemplateRenderer {
    descriptor: TemplateDescriptor,
    state: RenderState,
    assets: PreparedAssetStore,
    shaper: TextShaper,
    backend: Box<dyn RenderBackend>,
    generation: u64,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("descriptor", &self.descriptor)
            .field("state", &self.state)
            .field("asset_statuses", &self.assets.statuses())
            .field("generation", &self.generation)
            .finish()
    }
}

impl TemplateRenderer {
    /// Validate `descriptor`, load its fixed assets from `source`, and stand
    /// up the CPU rasterizer.
    pub fn new(descriptor: TemplateDescriptor, source: &dyn AssetSource) -> PlakatResult<Self> {
        Self::with_backend(descriptor, source, Box::new(CpuRasterizer::new()))
    }

    pub fn with_backend(
        descriptor: TemplateDescriptor,
        source: &dyn AssetSource,
        backend: Box<dyn RenderBackend>,
    ) -> PlakatResult<Self> {
        descriptor.validate()?;
        let assets = PreparedAssetStore::prepare(&descriptor, source);
        Ok(Self {
            descriptor,
            state: RenderState::default(),
            assets,
            shaper: TextShaper::new(),
            backend,
            generation: 0,
        })
    }

    pub fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    /// Load outcome of each fixed asset, from construction time.
    pub fn asset_statuses(&self) -> &[LoadStatus] {
        self.assets.statuses()
    }

    /// The backdrop color the next render will use.
    pub fn background_color(&self) -> Color {
        self.state.background_color.unwrap_or(DEFAULT_BACKGROUND)
    }

    /// Override the backdrop color; `None` restores the default.
    pub fn set_background_color(&mut self, color: Option<Color>) {
        self.state.background_color = color;
    }

    /// Swap the user photo.
    ///
    /// Decodes eagerly so a bad input fails here and the previously staged
    /// photo stays in place.
    pub fn set_photo(&mut self, photo: Option<PhotoSource>) -> PlakatResult<()> {
        self.state.photo = match photo {
            Some(source) => Some(prepare_photo(&source)?),
            None => None,
        };
        Ok(())
    }

    /// Replace the caption text and render the result.
    pub fn update_caption_text(&mut self, text: impl Into<String>) -> PlakatResult<RenderedBanner> {
        self.descriptor.caption.text = text.into();
        self.render()
    }

    /// Compile and rasterize the current state into a fresh frame.
    #[tracing::instrument(skip_all)]
    pub fn render(&mut self) -> PlakatResult<RenderedBanner> {
        self.generation += 1;
        let plan = compile_template(
            &self.descriptor,
            self.background_color(),
            self.state.photo.as_ref(),
            &self.assets,
            &mut self.shaper,
        )?;
        let frame = self.backend.render_plan(&plan)?;
        tracing::debug!(
            generation = self.generation,
            skipped = plan.skipped.len(),
            "rendered banner"
        );

        Ok(RenderedBanner {
            generation: RenderGeneration(self.generation),
            frame,
            report: RenderReport {
                skipped: plan.skipped,
            },
        })
    }
}

/// Keep-newest gate for banner consumers.
///
/// Renders issued from concurrent tasks can settle out of order; `submit`
/// accepts a banner only when its generation is newer than everything seen,
/// so a slow early render can never overwrite a later one.
#[derive(Debug, Default)]
pub struct LatestFrame {
    newest: Option<RenderGeneration>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `banner` is newer than every previously submitted banner.
    pub fn submit(&mut self, banner: &RenderedBanner) -> bool {
        if self.newest.is_some_and(|seen| seen >= banner.generation) {
            return false;
        }
        self.newest = Some(banner.generation);
        true
    }

    pub fn newest(&self) -> Option<RenderGeneration> {
        self.newest
    }
}
