//! Backend seam between compiled plans and raster output.

use crate::{compile::RenderPlan, error::PlakatResult};

pub mod cpu;

/// One rendered frame in row-major RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel bytes, for encoders that expect
    /// unassociated alpha (PNG).
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = px[3];
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
            } else if a != 255 {
                let a16 = u16::from(a);
                for c in px.iter_mut().take(3) {
                    let straight = (u16::from(*c) * 255 + a16 / 2) / a16;
                    *c = straight.min(255) as u8;
                }
            }
        }
        out
    }
}

/// Rasterizer for compiled plans.
///
/// Backends may hold paint caches keyed by [`AssetId`](crate::assets::AssetId)
/// across calls; rendering the same plan twice must produce identical bytes.
pub trait RenderBackend {
    fn render_plan(&mut self, plan: &RenderPlan) -> PlakatResult<FrameRGBA>;
}
