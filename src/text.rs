use std::{borrow::Cow, collections::HashMap};

use crate::{
    assets::{AssetId, PreparedFont},
    color::Color,
    error::{PlakatError, PlakatResult},
};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Color> for TextBrushRgba8 {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for shaping and measuring single lines of text.
///
/// Font bytes register into the Parley collection once per [`AssetId`];
/// repeated shaping calls reuse the resolved family.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<AssetId, String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Shape `text` as a single unbroken line at `size_px`.
    pub fn shape_line(
        &mut self,
        text: &str,
        font: &PreparedFont,
        size_px: f64,
        brush: TextBrushRgba8,
    ) -> PlakatResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PlakatError::layout("text size must be finite and > 0"));
        }

        let family = self.family_for(font)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px as f32));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of `text` at `size_px`, trailing whitespace included
    /// (lines keep their trailing space and the CTA label starts with one).
    pub fn measure(&mut self, text: &str, font: &PreparedFont, size_px: f64) -> PlakatResult<f64> {
        let layout = self.shape_line(text, font, size_px, TextBrushRgba8::default())?;
        Ok(f64::from(layout.full_width()))
    }

    fn family_for(&mut self, font: &PreparedFont) -> PlakatResult<String> {
        if let Some(name) = self.families.get(&font.id) {
            return Ok(name.clone());
        }
        let name = register_family(&mut self.font_ctx, font.bytes.as_slice())?;
        self.families.insert(font.id, name.clone());
        Ok(name)
    }
}

/// Register font bytes and resolve the primary family name.
///
/// Used at asset-prepare time to reject unusable font files early.
pub(crate) fn resolve_family_name(bytes: &[u8]) -> PlakatResult<String> {
    let mut font_ctx = parley::FontContext::default();
    register_family(&mut font_ctx, bytes)
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> PlakatResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| PlakatError::layout("no font families registered from font bytes"))?;

    Ok(font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| PlakatError::layout("registered font family has no name"))?
        .to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn junk_font() -> PreparedFont {
        PreparedFont {
            id: AssetId::from_u64(1),
            bytes: Arc::new(vec![0, 1, 2, 3]),
            family: "junk".to_string(),
        }
    }

    #[test]
    fn garbage_bytes_register_no_family() {
        let err = resolve_family_name(&[0, 1, 2, 3]).unwrap_err();
        assert!(err.to_string().contains("layout error:"));
    }

    #[test]
    fn non_positive_size_is_rejected_before_shaping() {
        let mut shaper = TextShaper::new();
        assert!(
            shaper
                .shape_line("x", &junk_font(), 0.0, TextBrushRgba8::default())
                .is_err()
        );
        assert!(shaper.measure("x", &junk_font(), f64::NAN).is_err());
    }

    #[test]
    fn brush_carries_straight_alpha_color() {
        let b = TextBrushRgba8::from(Color::rgba(1, 2, 3, 4));
        assert_eq!((b.r, b.g, b.b, b.a), (1, 2, 3, 4));
    }
}
