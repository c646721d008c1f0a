//! CPU rasterizer on top of `vello_cpu`.

use std::collections::{HashMap, HashSet};

use crate::{
    assets::{AssetId, PreparedFont, PreparedImage},
    color::Color,
    compile::{LayerOp, RenderPlan, ShapedLine},
    core::Rect,
    error::{PlakatError, PlakatResult},
    render::{FrameRGBA, RenderBackend},
};

/// Software rasterizer with paint caches keyed by content id.
///
/// The target pixmap and decoded paints persist across renders; paints for
/// assets no longer referenced by the incoming plan are dropped, so swapping
/// photos does not accumulate stale uploads.
pub struct CpuRasterizer {
    image_cache: HashMap<AssetId, vello_cpu::Image>,
    font_cache: HashMap<AssetId, vello_cpu::peniko::FontData>,
    surface: Option<Surface>,
}

struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self {
            image_cache: HashMap::new(),
            font_cache: HashMap::new(),
            surface: None,
        }
    }
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for CpuRasterizer {
    fn render_plan(&mut self, plan: &RenderPlan) -> PlakatResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| PlakatError::render("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| PlakatError::render("canvas height exceeds u16"))?;

        self.retain_plan_paints(plan);

        let mut surface = match self.surface.take() {
            Some(s) if s.width == width && s.height == height => s,
            _ => Surface {
                width,
                height,
                pixmap: vello_cpu::Pixmap::new(width, height),
            },
        };
        surface.pixmap.data_as_u8_slice_mut().fill(0);

        let full = plan.canvas.rect();
        let mut ctx = vello_cpu::RenderContext::new(width, height);
        for op in &plan.ops {
            self.draw_op(&mut ctx, op, full)?;
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut surface.pixmap);

        let data = surface.pixmap.data_as_u8_slice().to_vec();
        self.surface = Some(surface);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

impl CpuRasterizer {
    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &LayerOp,
        full: Rect,
    ) -> PlakatResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            LayerOp::Backdrop { color } => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(paint_color(*color));
                ctx.fill_rect(&rect_to_cpu(full));
            }
            LayerOp::Blit(blit) => {
                let paint = self.image_paint_for(&blit.image)?;
                // Map the image's own pixel rect onto the destination.
                let sx = blit.dst.width() / f64::from(blit.image.width);
                let sy = blit.dst.height() / f64::from(blit.image.height);
                ctx.set_transform(
                    vello_cpu::kurbo::Affine::translate((blit.dst.x0, blit.dst.y0))
                        * vello_cpu::kurbo::Affine::scale_non_uniform(sx, sy),
                );
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(blit.image.width),
                    f64::from(blit.image.height),
                ));
            }
            LayerOp::Text(text) => {
                let font = self.font_paint_for(&text.font);
                for line in &text.lines {
                    draw_shaped_line(ctx, &font, line);
                }
            }
            LayerOp::Button(button) => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(paint_color(button.plate_color));
                ctx.fill_path(&bezpath_to_cpu(&button.plate));

                ctx.set_paint(paint_color(button.border_color));
                ctx.fill_path(&bezpath_to_cpu(&button.border));

                let font = self.font_paint_for(&button.font);
                draw_shaped_line(ctx, &font, &button.label);
            }
        }
        Ok(())
    }

    fn image_paint_for(&mut self, image: &PreparedImage) -> PlakatResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(&image.id) {
            return Ok(paint.clone());
        }

        let pixmap =
            premul_bytes_to_pixmap(image.rgba8_premul.as_slice(), image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.image_cache.insert(image.id, paint.clone());
        Ok(paint)
    }

    fn font_paint_for(&mut self, font: &PreparedFont) -> vello_cpu::peniko::FontData {
        if let Some(data) = self.font_cache.get(&font.id) {
            return data.clone();
        }

        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            0,
        );
        self.font_cache.insert(font.id, data.clone());
        data
    }

    fn retain_plan_paints(&mut self, plan: &RenderPlan) {
        let mut images = HashSet::new();
        let mut fonts = HashSet::new();
        for op in &plan.ops {
            match op {
                LayerOp::Backdrop { .. } => {}
                LayerOp::Blit(blit) => {
                    images.insert(blit.image.id);
                }
                LayerOp::Text(text) => {
                    fonts.insert(text.font.id);
                }
                LayerOp::Button(button) => {
                    fonts.insert(button.font.id);
                }
            }
        }
        self.image_cache.retain(|id, _| images.contains(id));
        self.font_cache.retain(|id, _| fonts.contains(id));
    }
}

fn draw_shaped_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    line: &ShapedLine,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        line.origin.x,
        line.origin.y,
    )));

    for layout_line in line.layout.lines() {
        for item in layout_line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn paint_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: crate::core::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &crate::core::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PlakatResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PlakatError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PlakatError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PlakatError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
