use kurbo::{Point, Rect};

use crate::{
    color::Color,
    core::Canvas,
    error::{PlakatError, PlakatResult},
    wrap::WrapMode,
};

/// Backdrop color used when the host has not set one.
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x03, 0x69, 0xa1);

/// Declarative description of one banner layout.
///
/// The JSON form (camelCase keys) is the stable descriptor schema; every
/// field this crate added on top of it is defaulted, so descriptors in the
/// legacy shape deserialize unchanged.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptor {
    #[serde(default)]
    pub canvas: Canvas,
    pub caption: Caption,
    pub cta: Cta,
    pub image_mask: MaskRect,
    pub urls: TemplateAssets,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub text: String,
    pub position: Point, // top-left anchor of the first line, canvas px
    #[serde(default)]
    pub max_characters_per_line: u32, // 0 falls back to the wrap default
    pub font_size: f64,
    #[serde(default)]
    pub alignment: Alignment,
    pub text_color: Color,
    #[serde(default)]
    pub wrap: WrapMode,
    #[serde(default)]
    pub max_line_width: f64, // px budget, read only by WrapMode::PixelWidth
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cta {
    pub text: String,
    pub position: Point, // left edge x, vertical center y (not top-left)
    pub text_color: Color,
    pub background_color: Color,
    #[serde(default)]
    pub border_radius: f64,
}

/// Rectangle the uploaded photo is clipped and stretched into.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaskRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MaskRect {
    pub fn rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Relative paths of the fixed decorative assets, resolved by an asset
/// source. `mask` is carried for schema compatibility only; no layer draws
/// it. `font` is optional; without a loadable font the two text layers are
/// skipped and reported.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAssets {
    pub mask: String,
    pub stroke: String,
    pub design_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Fraction of a line's measured width subtracted from its x position.
    pub fn x_offset_factor(self) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => 0.5,
            Alignment::Right => 1.0,
        }
    }
}

impl TemplateDescriptor {
    pub fn validate(&self) -> PlakatResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(PlakatError::validation("canvas width/height must be > 0"));
        }

        if !self.caption.font_size.is_finite() || self.caption.font_size <= 0.0 {
            return Err(PlakatError::validation(
                "caption.fontSize must be finite and > 0",
            ));
        }
        validate_point("caption.position", self.caption.position)?;
        if self.caption.wrap == WrapMode::PixelWidth
            && (!self.caption.max_line_width.is_finite() || self.caption.max_line_width <= 0.0)
        {
            return Err(PlakatError::validation(
                "caption.maxLineWidth must be finite and > 0 when caption.wrap is pixel_width",
            ));
        }

        validate_point("cta.position", self.cta.position)?;
        if !self.cta.border_radius.is_finite() || self.cta.border_radius < 0.0 {
            return Err(PlakatError::validation(
                "cta.borderRadius must be finite and >= 0",
            ));
        }

        let m = self.image_mask;
        if !(m.x.is_finite() && m.y.is_finite() && m.width.is_finite() && m.height.is_finite()) {
            return Err(PlakatError::validation("imageMask fields must be finite"));
        }
        if m.width <= 0.0 || m.height <= 0.0 {
            return Err(PlakatError::validation(
                "imageMask width/height must be > 0",
            ));
        }

        validate_path("urls.mask", &self.urls.mask)?;
        validate_path("urls.stroke", &self.urls.stroke)?;
        validate_path("urls.designPattern", &self.urls.design_pattern)?;
        if let Some(font) = &self.urls.font {
            validate_path("urls.font", font)?;
        }

        Ok(())
    }

    /// Parse a descriptor from its JSON form.
    pub fn from_json(json: &str) -> PlakatResult<Self> {
        serde_json::from_str(json).map_err(|e| PlakatError::serde(e.to_string()))
    }

    /// Pretty-printed JSON form of this descriptor.
    pub fn to_json_pretty(&self) -> PlakatResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PlakatError::serde(e.to_string()))
    }
}

fn validate_point(field: &str, p: Point) -> PlakatResult<()> {
    if !(p.x.is_finite() && p.y.is_finite()) {
        return Err(PlakatError::validation(format!("{field} must be finite")));
    }
    Ok(())
}

fn validate_path(field: &str, path: &str) -> PlakatResult<()> {
    if path.trim().is_empty() {
        return Err(PlakatError::validation(format!("{field} must be non-empty")));
    }
    Ok(())
}

impl Default for TemplateDescriptor {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            caption: Caption {
                text: "1 & 2 BHK Luxury Apartments at just Rs.34.97 Lakhs".to_string(),
                position: Point::new(80.0, 100.0),
                max_characters_per_line: 31,
                font_size: 44.0,
                alignment: Alignment::Left,
                text_color: Color::rgb(255, 255, 255),
                wrap: WrapMode::CharCount,
                max_line_width: 0.0,
            },
            cta: Cta {
                // The leading space is part of the label and of its
                // measured width.
                text: " Shop Now".to_string(),
                position: Point::new(90.0, 250.0),
                text_color: Color::rgb(0, 0, 0),
                background_color: Color::rgb(255, 255, 255),
                border_radius: 5.0,
            },
            image_mask: MaskRect {
                x: 56.0,
                y: 442.0,
                width: 970.0,
                height: 600.0,
            },
            urls: TemplateAssets {
                mask: "templates/mask.png".to_string(),
                stroke: "templates/mask_stroke.png".to_string(),
                design_pattern: "templates/design_pattern.png".to_string(),
                font: Some("fonts/arial.ttf".to_string()),
            },
        }
    }
}
