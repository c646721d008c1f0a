//! CTA button geometry.

use kurbo::{BezPath, Point, Rect};

use crate::color::Color;

/// Label font size in pixels. The plate width is derived from the label
/// measured at exactly this size, independent of the caption style.
pub const LABEL_FONT_SIZE: f64 = 30.0;

/// Horizontal padding added to the measured label width.
pub const WIDTH_PADDING: f64 = 20.0;

/// Half the plate height; the anchor y sits at the vertical center.
pub const HALF_HEIGHT: f64 = 30.0;

/// Border stroke width in pixels.
pub const BORDER_WIDTH: f64 = 2.0;

/// Border ring color; the outline always strokes in opaque black.
pub const BORDER_COLOR: Color = Color::rgb(0, 0, 0);

/// Resolved plate geometry for one CTA layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonMetrics {
    /// Plate bounds: left edge at the anchor x, vertically centered on the
    /// anchor y, width `label_width + WIDTH_PADDING`, height exactly
    /// `2 * HALF_HEIGHT`.
    pub rect: Rect,
    /// Corner radius after clamping to `min(width, height) / 2`.
    pub radius: f64,
    /// Measured label advance width at [`LABEL_FONT_SIZE`].
    pub label_width: f64,
}

impl ButtonMetrics {
    pub fn new(anchor: Point, label_width: f64, border_radius: f64) -> Self {
        let rect = Rect::new(
            anchor.x,
            anchor.y - HALF_HEIGHT,
            anchor.x + label_width + WIDTH_PADDING,
            anchor.y + HALF_HEIGHT,
        );
        let radius = border_radius.clamp(0.0, rect.width().min(rect.height()) / 2.0);
        Self {
            rect,
            radius,
            label_width,
        }
    }

    /// Center of the label, both axes: half the measured width right of the
    /// anchor (10px left of the plate center), on the anchor y.
    pub fn label_center(&self) -> Point {
        Point::new(self.rect.x0 + self.label_width / 2.0, self.rect.center().y)
    }

    /// Plate outline, built clockwise from the top edge with quadratic
    /// corner curves. A zero radius emits straight edges only.
    pub fn outline(&self) -> BezPath {
        let Rect { x0, y0, x1, y1 } = self.rect;
        let r = self.radius;

        let mut p = BezPath::new();
        if r <= 0.0 {
            p.move_to((x0, y0));
            p.line_to((x1, y0));
            p.line_to((x1, y1));
            p.line_to((x0, y1));
            p.close_path();
        } else {
            p.move_to((x0 + r, y0));
            p.line_to((x1 - r, y0));
            p.quad_to((x1, y0), (x1, y0 + r));
            p.line_to((x1, y1 - r));
            p.quad_to((x1, y1), (x1 - r, y1));
            p.line_to((x0 + r, y1));
            p.quad_to((x0, y1), (x0, y1 - r));
            p.line_to((x0, y0 + r));
            p.quad_to((x0, y0), (x0 + r, y0));
            p.close_path();
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn plate_spans_label_plus_padding_and_fixed_height() {
        let m = ButtonMetrics::new(Point::new(90.0, 250.0), 120.5, 5.0);
        assert_eq!(m.rect, Rect::new(90.0, 220.0, 230.5, 280.0));
        assert_eq!(m.rect.width(), 120.5 + WIDTH_PADDING);
        assert_eq!(m.rect.height(), 60.0);
        assert_eq!(m.radius, 5.0);
    }

    #[test]
    fn height_is_sixty_for_any_label() {
        for w in [0.0, 1.0, 333.3] {
            let m = ButtonMetrics::new(Point::new(0.0, 0.0), w, 0.0);
            assert_eq!(m.rect.height(), 60.0);
        }
    }

    #[test]
    fn oversized_radius_clamps_to_half_extent() {
        let m = ButtonMetrics::new(Point::new(0.0, 0.0), 120.0, 1000.0);
        assert_eq!(m.radius, 30.0);

        // Narrow plate: the width is the limiting extent.
        let m = ButtonMetrics::new(Point::new(0.0, 0.0), 0.0, 1000.0);
        assert_eq!(m.radius, 10.0);
    }

    #[test]
    fn zero_radius_outline_is_a_pure_rectangle() {
        let m = ButtonMetrics::new(Point::new(90.0, 250.0), 100.0, 0.0);
        let path = m.outline();
        assert!(
            path.elements()
                .iter()
                .all(|el| !matches!(el, PathEl::QuadTo(..) | PathEl::CurveTo(..))),
            "rectangle must not contain curve elements"
        );
        assert_eq!(
            path.elements()
                .iter()
                .filter(|el| matches!(el, PathEl::LineTo(..)))
                .count(),
            3
        );
    }

    #[test]
    fn rounded_outline_has_four_quadratic_corners() {
        let m = ButtonMetrics::new(Point::new(90.0, 250.0), 100.0, 8.0);
        let path = m.outline();
        let quads = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::QuadTo(..)))
            .count();
        assert_eq!(quads, 4);

        // Corner curves are controlled by the true corner points.
        assert!(path.elements().iter().any(
            |el| matches!(el, PathEl::QuadTo(c, _) if *c == Point::new(m.rect.x1, m.rect.y0))
        ));
    }

    #[test]
    fn label_centers_half_the_measured_width_from_the_left_edge() {
        let m = ButtonMetrics::new(Point::new(90.0, 250.0), 120.0, 5.0);
        assert_eq!(m.label_center(), Point::new(150.0, 250.0));
        // 10px left of the plate's geometric center.
        assert_eq!(m.rect.center().x - m.label_center().x, 10.0);
    }
}
