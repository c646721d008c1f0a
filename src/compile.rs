//! Pure compile stage: descriptor plus prepared inputs to a [`RenderPlan`].
//!
//! Compilation does no IO. Every image and font it touches was loaded by
//! [`PreparedAssetStore::prepare`] or [`crate::assets::prepare_photo`]; a
//! fixed asset that failed to load turns into a [`LayerSkip`] record rather
//! than an error, so one bad file never takes down the other layers.

use std::sync::Arc;

use kurbo::{Cap, Join, Stroke, StrokeOpts};

use crate::{
    assets::{FixedAsset, LoadState, PreparedAssetStore, PreparedFont, PreparedImage},
    button::{self, ButtonMetrics},
    color::Color,
    core::{BezPath, Canvas, Point, Rect},
    error::PlakatResult,
    model::{Caption, TemplateDescriptor},
    text::{TextBrushRgba8, TextShaper},
    wrap::{self, WrapMode},
};

/// Caption line advance as a multiple of the font size.
const LINE_SPACING_FACTOR: f64 = 1.2;

/// Tolerance for expanding the border ring to a fillable path.
const STROKE_TOLERANCE: f64 = 0.1;

/// Layer slots in settled draw order, bottom to top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Backdrop,
    DesignPattern,
    Photo,
    StrokeOverlay,
    Caption,
    Cta,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Layer::Backdrop => "backdrop",
            Layer::DesignPattern => "design pattern",
            Layer::Photo => "photo",
            Layer::StrokeOverlay => "stroke overlay",
            Layer::Caption => "caption",
            Layer::Cta => "cta button",
        })
    }
}

/// A layer that compiled to nothing, and why.
#[derive(Clone, Debug)]
pub struct LayerSkip {
    pub layer: Layer,
    pub reason: String,
}

/// Everything a backend needs to draw one banner.
///
/// Ops are already in draw order; executing them front to back yields the
/// settled layering regardless of which layers were skipped.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    pub canvas: Canvas,
    pub ops: Vec<LayerOp>,
    pub skipped: Vec<LayerSkip>,
}

#[derive(Clone, Debug)]
pub enum LayerOp {
    /// Fill the whole canvas with a color.
    Backdrop { color: Color },
    /// Stretch an image onto a destination rectangle.
    Blit(BlitOp),
    /// Draw shaped caption lines.
    Text(TextOp),
    /// Draw the CTA plate, border ring, and label.
    Button(ButtonOp),
}

impl LayerOp {
    pub fn layer(&self) -> Layer {
        match self {
            LayerOp::Backdrop { .. } => Layer::Backdrop,
            LayerOp::Blit(blit) => blit.layer,
            LayerOp::Text(_) => Layer::Caption,
            LayerOp::Button(_) => Layer::Cta,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlitOp {
    pub layer: Layer,
    pub image: PreparedImage,
    /// Canvas-space destination; the image stretches to fill it exactly.
    pub dst: Rect,
}

/// One shaped line placed at a canvas-space origin (top-left of its box).
#[derive(Clone)]
pub struct ShapedLine {
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    pub origin: Point,
}

impl std::fmt::Debug for ShapedLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapedLine")
            .field("origin", &self.origin)
            .field("width", &self.layout.full_width())
            .field("height", &self.layout.height())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct TextOp {
    pub font: PreparedFont,
    pub lines: Vec<ShapedLine>,
}

#[derive(Clone, Debug)]
pub struct ButtonOp {
    pub font: PreparedFont,
    pub plate: BezPath,
    pub plate_color: Color,
    /// Border ring pre-expanded to a fillable path around the plate edge.
    pub border: BezPath,
    pub border_color: Color,
    pub label: ShapedLine,
}

/// Compile one banner frame.
///
/// `background` is the resolved backdrop color and `photo` the prepared
/// user photo, if any. An absent photo is the normal empty state and is not
/// reported as a skip; missing fixed assets are.
#[tracing::instrument(skip_all)]
pub fn compile_template(
    desc: &TemplateDescriptor,
    background: Color,
    photo: Option<&PreparedImage>,
    assets: &PreparedAssetStore,
    shaper: &mut TextShaper,
) -> PlakatResult<RenderPlan> {
    let canvas = desc.canvas;
    let full = canvas.rect();

    let mut ops = Vec::new();
    let mut skipped = Vec::new();

    ops.push(LayerOp::Backdrop { color: background });

    match assets.design_pattern() {
        Some(image) => ops.push(LayerOp::Blit(BlitOp {
            layer: Layer::DesignPattern,
            image: image.clone(),
            dst: full,
        })),
        None => skipped.push(skip_for(assets, Layer::DesignPattern, FixedAsset::DesignPattern)),
    }

    if let Some(photo) = photo {
        ops.push(LayerOp::Blit(BlitOp {
            layer: Layer::Photo,
            image: photo.clone(),
            dst: desc.image_mask.rect(),
        }));
    }

    match assets.stroke_overlay() {
        Some(image) => ops.push(LayerOp::Blit(BlitOp {
            layer: Layer::StrokeOverlay,
            image: image.clone(),
            dst: full,
        })),
        None => skipped.push(skip_for(assets, Layer::StrokeOverlay, FixedAsset::StrokeOverlay)),
    }

    match assets.font() {
        Some(font) => {
            ops.push(compile_caption(desc, font, shaper)?);
            ops.push(compile_cta(desc, font, shaper)?);
        }
        None => {
            skipped.push(skip_for(assets, Layer::Caption, FixedAsset::Font));
            skipped.push(skip_for(assets, Layer::Cta, FixedAsset::Font));
        }
    }

    Ok(RenderPlan {
        canvas,
        ops,
        skipped,
    })
}

fn skip_for(assets: &PreparedAssetStore, layer: Layer, asset: FixedAsset) -> LayerSkip {
    let reason = match assets.status_of(asset).map(|s| &s.state) {
        Some(LoadState::Failed(err)) => format!("{asset} failed to load: {err}"),
        Some(LoadState::Unconfigured) => format!("no {asset} configured"),
        _ => format!("{asset} unavailable"),
    };
    LayerSkip { layer, reason }
}

fn compile_caption(
    desc: &TemplateDescriptor,
    font: &PreparedFont,
    shaper: &mut TextShaper,
) -> PlakatResult<LayerOp> {
    let caption = &desc.caption;
    let lines = wrap_caption(caption, font, shaper)?;

    let brush = TextBrushRgba8::from(caption.text_color);
    let advance = caption.font_size * LINE_SPACING_FACTOR;

    let mut shaped = Vec::with_capacity(lines.len());
    for (k, line) in lines.iter().enumerate() {
        let layout = shaper.shape_line(line, font, caption.font_size, brush)?;
        let x = caption.position.x
            - caption.alignment.x_offset_factor() * f64::from(layout.full_width());
        let y = caption.position.y + k as f64 * advance;
        shaped.push(ShapedLine {
            layout: Arc::new(layout),
            origin: Point::new(x, y),
        });
    }

    Ok(LayerOp::Text(TextOp {
        font: font.clone(),
        lines: shaped,
    }))
}

fn wrap_caption(
    caption: &Caption,
    font: &PreparedFont,
    shaper: &mut TextShaper,
) -> PlakatResult<Vec<String>> {
    match caption.wrap {
        WrapMode::CharCount => Ok(wrap::wrap_chars(
            &caption.text,
            caption.max_characters_per_line,
        )),
        WrapMode::PixelWidth => {
            // The measure closure cannot return a Result; capture the first
            // failure and treat the candidate as over budget to end the loop
            // quickly, then surface the error.
            let mut measure_err = None;
            let lines = wrap::wrap_measured(&caption.text, caption.max_line_width, |candidate| {
                match shaper.measure(candidate, font, caption.font_size) {
                    Ok(width) => width,
                    Err(err) => {
                        measure_err.get_or_insert(err);
                        f64::INFINITY
                    }
                }
            });
            match measure_err {
                Some(err) => Err(err),
                None => Ok(lines),
            }
        }
    }
}

fn compile_cta(
    desc: &TemplateDescriptor,
    font: &PreparedFont,
    shaper: &mut TextShaper,
) -> PlakatResult<LayerOp> {
    let cta = &desc.cta;
    let layout = shaper.shape_line(
        &cta.text,
        font,
        button::LABEL_FONT_SIZE,
        TextBrushRgba8::from(cta.text_color),
    )?;
    let label_width = f64::from(layout.full_width());

    let metrics = ButtonMetrics::new(cta.position, label_width, cta.border_radius);
    let plate = metrics.outline();
    let border = kurbo::stroke(
        plate.elements().iter().copied(),
        &Stroke::new(button::BORDER_WIDTH)
            .with_join(Join::Miter)
            .with_caps(Cap::Butt),
        &StrokeOpts::default(),
        STROKE_TOLERANCE,
    );

    // The label centers on half its own width from the plate's left edge,
    // so its left edge lands exactly on the anchor x.
    let center = metrics.label_center();
    let origin = Point::new(
        center.x - label_width / 2.0,
        center.y - f64::from(layout.height()) / 2.0,
    );

    Ok(LayerOp::Button(ButtonOp {
        font: font.clone(),
        plate,
        plate_color: cta.background_color,
        border,
        border_color: button::BORDER_COLOR,
        label: ShapedLine {
            layout: Arc::new(layout),
            origin,
        },
    }))
}
