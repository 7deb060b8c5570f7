use glam::DVec2;

use crate::scene::{PaneRegion, TransformParams};

/// Visible data-space window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRange {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DataRange {
    pub fn x_span(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn y_span(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl Default for DataRange {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 100.0,
            y_min: 0.0,
            y_max: 100.0,
        }
    }
}

/// Bijection between data space, clip space and pane-local pixel space.
///
/// Conventions: data-space y grows upward; pixel-space y grows downward with
/// (0, 0) at the pane's top-left. Clip space is the renderer's `[-1, +1]`
/// square, restricted to the pane's clip region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pixel_width: f32,
    pixel_height: f32,
    clip: PaneRegion,
    range: DataRange,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            pixel_width: 800.0,
            pixel_height: 600.0,
            clip: PaneRegion::default(),
            range: DataRange::default(),
        }
    }

    // -- state --

    pub fn set_pixel_viewport(&mut self, width: f32, height: f32) {
        self.pixel_width = width;
        self.pixel_height = height;
    }

    pub fn pixel_size(&self) -> (f32, f32) {
        (self.pixel_width, self.pixel_height)
    }

    pub fn set_clip_region(&mut self, region: PaneRegion) {
        self.clip = region;
    }

    pub fn clip_region(&self) -> PaneRegion {
        self.clip
    }

    pub fn set_data_range(&mut self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
        self.range = DataRange { x_min, x_max, y_min, y_max };
    }

    pub fn data_range(&self) -> DataRange {
        self.range
    }

    // -- mappings --

    pub fn data_to_clip(&self, x: f64, y: f64) -> DVec2 {
        let p = self.transform_f64();
        DVec2::new(x * p.0 + p.1, y * p.2 + p.3)
    }

    pub fn clip_to_data(&self, cx: f64, cy: f64) -> DVec2 {
        let p = self.transform_f64();
        DVec2::new((cx - p.1) / p.0, (cy - p.3) / p.2)
    }

    pub fn pixel_to_data(&self, px: f64, py: f64) -> DVec2 {
        let x = self.range.x_min + px / f64::from(self.pixel_width) * self.range.x_span();
        let y = self.range.y_min
            + (f64::from(self.pixel_height) - py) / f64::from(self.pixel_height)
                * self.range.y_span();
        DVec2::new(x, y)
    }

    pub fn data_to_pixel(&self, x: f64, y: f64) -> DVec2 {
        let px = (x - self.range.x_min) / self.range.x_span() * f64::from(self.pixel_width);
        let py = f64::from(self.pixel_height)
            - (y - self.range.y_min) / self.range.y_span() * f64::from(self.pixel_height);
        DVec2::new(px, py)
    }

    pub fn contains_pixel(&self, px: f64, py: f64) -> bool {
        px >= 0.0
            && px <= f64::from(self.pixel_width)
            && py >= 0.0
            && py <= f64::from(self.pixel_height)
    }

    pub fn pixels_per_data_unit_x(&self) -> f64 {
        f64::from(self.pixel_width) / self.range.x_span()
    }

    pub fn pixels_per_data_unit_y(&self) -> f64 {
        f64::from(self.pixel_height) / self.range.y_span()
    }

    // -- interaction --

    /// Drag the content by a pixel delta: dragging right/down moves the
    /// visible window left/up.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64) {
        let dx = dx_px / self.pixels_per_data_unit_x();
        let dy = dy_px / self.pixels_per_data_unit_y();
        self.range.x_min -= dx;
        self.range.x_max -= dx;
        self.range.y_min += dy;
        self.range.y_max += dy;
    }

    /// Zoom by `factor` (> 1 zooms in), keeping the data point under the
    /// cursor fixed.
    pub fn zoom(&mut self, factor: f64, cursor_px: f64, cursor_py: f64) {
        if factor <= 0.0 {
            return;
        }
        let anchor = self.pixel_to_data(cursor_px, cursor_py);
        let r = &mut self.range;
        r.x_min = anchor.x - (anchor.x - r.x_min) / factor;
        r.x_max = anchor.x + (r.x_max - anchor.x) / factor;
        r.y_min = anchor.y - (anchor.y - r.y_min) / factor;
        r.y_max = anchor.y + (r.y_max - anchor.y) / factor;
    }

    // -- renderer contract --

    /// Affine params mapping data space onto the pane's clip rectangle.
    pub fn compute_transform_params(&self) -> TransformParams {
        let (sx, tx, sy, ty) = self.transform_f64();
        TransformParams {
            sx: sx as f32,
            sy: sy as f32,
            tx: tx as f32,
            ty: ty as f32,
        }
    }

    /// (sx, tx, sy, ty) in f64, shared by the mapping helpers.
    fn transform_f64(&self) -> (f64, f64, f64, f64) {
        let cw = f64::from(self.clip.clip_x_max) - f64::from(self.clip.clip_x_min);
        let ch = f64::from(self.clip.clip_y_max) - f64::from(self.clip.clip_y_min);
        let sx = cw / self.range.x_span();
        let sy = ch / self.range.y_span();
        let tx = f64::from(self.clip.clip_x_min) - self.range.x_min * sx;
        let ty = f64::from(self.clip.clip_y_min) - self.range.y_min * sy;
        (sx, tx, sy, ty)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut vp = Viewport::new();
        vp.set_pixel_viewport(800.0, 600.0);
        vp.set_data_range(0.0, 100.0, 0.0, 50.0);
        vp
    }

    #[test]
    fn transform_params_map_range_onto_clip() {
        let vp = viewport();
        let p = vp.compute_transform_params();
        // Full clip region: sx = 2/100, tx = -1 - 0*sx.
        assert!((p.sx - 0.02).abs() < 1e-6);
        assert!((p.tx - -1.0).abs() < 1e-6);
        assert!((p.sy - 0.04).abs() < 1e-6);
        assert!((p.ty - -1.0).abs() < 1e-6);

        // Corners of the range land on the clip corners.
        let lo = vp.data_to_clip(0.0, 0.0);
        let hi = vp.data_to_clip(100.0, 50.0);
        assert!((lo.x + 1.0).abs() < 1e-9 && (lo.y + 1.0).abs() < 1e-9);
        assert!((hi.x - 1.0).abs() < 1e-9 && (hi.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sub_region_shifts_transform() {
        let mut vp = viewport();
        vp.set_clip_region(PaneRegion {
            clip_x_min: -1.0,
            clip_x_max: 1.0,
            clip_y_min: 0.0,
            clip_y_max: 1.0,
        });
        let p = vp.compute_transform_params();
        assert!((p.sy - 0.02).abs() < 1e-6);
        assert!((p.ty - 0.0).abs() < 1e-6);
    }

    #[test]
    fn pixel_round_trip() {
        let vp = viewport();
        let d = vp.pixel_to_data(200.0, 150.0);
        let p = vp.data_to_pixel(d.x, d.y);
        assert!((p.x - 200.0).abs() < 1e-9);
        assert!((p.y - 150.0).abs() < 1e-9);
        // Top-left pixel is (x_min, y_max).
        let tl = vp.pixel_to_data(0.0, 0.0);
        assert!((tl.x - 0.0).abs() < 1e-9);
        assert!((tl.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn clip_round_trip() {
        let vp = viewport();
        let c = vp.data_to_clip(30.0, 20.0);
        let d = vp.clip_to_data(c.x, c.y);
        assert!((d.x - 30.0).abs() < 1e-9);
        assert!((d.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn contains_pixel_bounds() {
        let vp = viewport();
        assert!(vp.contains_pixel(0.0, 0.0));
        assert!(vp.contains_pixel(800.0, 600.0));
        assert!(!vp.contains_pixel(-1.0, 10.0));
        assert!(!vp.contains_pixel(10.0, 601.0));
    }

    #[test]
    fn ppdu_reflects_zoom_level() {
        let vp = viewport();
        assert!((vp.pixels_per_data_unit_x() - 8.0).abs() < 1e-9);
        assert!((vp.pixels_per_data_unit_y() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn pan_shifts_range_by_pixel_delta() {
        let mut vp = viewport();
        vp.pan(80.0, 0.0); // 80 px = 10 data units
        let r = vp.data_range();
        assert!((r.x_min + 10.0).abs() < 1e-9);
        assert!((r.x_max - 90.0).abs() < 1e-9);
        assert!((r.y_min - 0.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_anchors_at_cursor() {
        let mut vp = viewport();
        let anchor_before = vp.pixel_to_data(200.0, 300.0);
        vp.zoom(2.0, 200.0, 300.0);
        let anchor_after = vp.pixel_to_data(200.0, 300.0);
        assert!((anchor_before.x - anchor_after.x).abs() < 1e-9);
        assert!((anchor_before.y - anchor_after.y).abs() < 1e-9);
        // Spans halved.
        let r = vp.data_range();
        assert!((r.x_span() - 50.0).abs() < 1e-9);
        assert!((r.y_span() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_out_reverses_zoom_in() {
        let mut vp = viewport();
        let before = vp.data_range();
        vp.zoom(2.0, 123.0, 456.0);
        vp.zoom(0.5, 123.0, 456.0);
        let after = vp.data_range();
        assert!((before.x_min - after.x_min).abs() < 1e-9);
        assert!((before.y_max - after.y_max).abs() < 1e-9);
    }
}
