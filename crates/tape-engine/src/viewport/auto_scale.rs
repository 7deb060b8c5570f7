use crate::ingest::IngestProcessor;
use crate::scene::{Candle6, Id, SceneGraph, VertexFormat};

use super::viewport::Viewport;

#[derive(Debug, Clone, Copy)]
pub struct AutoScaleConfig {
    /// Padding applied on each side of the fitted range.
    pub margin_fraction: f32,
    /// Force the range to include zero (volume-style panes).
    pub include_zero: bool,
}

impl Default for AutoScaleConfig {
    fn default() -> Self {
        Self {
            margin_fraction: 0.05,
            include_zero: false,
        }
    }
}

/// Computes the optimal Y range for a set of draw items over the viewport's
/// currently visible X range.
#[derive(Debug, Default)]
pub struct AutoScale {
    config: AutoScaleConfig,
}

impl AutoScale {
    pub fn new(config: AutoScaleConfig) -> Self {
        Self { config }
    }

    pub fn set_config(&mut self, config: AutoScaleConfig) {
        self.config = config;
    }

    /// Scan the given draw items' records and return `(yMin, yMax)` covering
    /// everything visible in the viewport's X range, padded by the margin.
    /// `None` when no visible data was found.
    pub fn compute_y_range(
        &self,
        draw_item_ids: &[Id],
        scene: &SceneGraph,
        ingest: &IngestProcessor,
        viewport: &Viewport,
    ) -> Option<(f64, f64)> {
        let range = viewport.data_range();
        let mut lo = f64::MAX;
        let mut hi = f64::MIN;
        let mut found = false;

        for &item_id in draw_item_ids {
            let Some(item) = scene.draw_item(item_id) else { continue };
            if item.geometry_id == 0 {
                continue;
            }
            let Some(geometry) = scene.geometry(item.geometry_id) else { continue };
            let data = ingest.data(geometry.vertex_buffer_id);
            let stride = geometry.format.stride() as usize;
            if data.is_empty() || stride == 0 {
                continue;
            }

            for record in data.chunks_exact(stride) {
                let (x, rec_lo, rec_hi) = match geometry.format {
                    VertexFormat::Pos2Clip => {
                        let p: crate::scene::Pos2 = bytemuck::pod_read_unaligned(record);
                        (f64::from(p.x), f64::from(p.y), f64::from(p.y))
                    }
                    VertexFormat::Candle6 => {
                        let c: Candle6 = bytemuck::pod_read_unaligned(record);
                        (f64::from(c.x), f64::from(c.low), f64::from(c.high))
                    }
                    VertexFormat::Rect4 => {
                        let r: [f32; 4] = bytemuck::pod_read_unaligned(record);
                        let x = f64::from(r[0] + r[2]) * 0.5;
                        let lo = f64::from(r[1].min(r[3]));
                        let hi = f64::from(r[1].max(r[3]));
                        (x, lo, hi)
                    }
                    _ => continue,
                };

                if x < range.x_min || x > range.x_max {
                    continue;
                }
                lo = lo.min(rec_lo);
                hi = hi.max(rec_hi);
                found = true;
            }
        }

        if !found {
            return None;
        }

        let mut span = hi - lo;
        if span < 1e-12 {
            span = 1.0;
        }
        let margin = span * f64::from(self.config.margin_fraction);
        let mut lo = lo - margin;
        let mut hi = hi + margin;

        if self.config.include_zero {
            lo = lo.min(0.0);
            hi = hi.max(0.0);
        }
        Some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandProcessor;
    use crate::ingest::{encode_record, OP_APPEND};

    fn scaffold(candles: &[Candle6]) -> (CommandProcessor, IngestProcessor) {
        let mut cp = CommandProcessor::new();
        cp.apply_json_text(r#"{"cmd":"createPane","id":1}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"createLayer","id":10,"paneId":1}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"createBuffer","id":100,"byteLength":0}"#).unwrap();
        cp.apply_json_text(
            r#"{"cmd":"createGeometry","id":101,"vertexBufferId":100,"format":"candle6","vertexCount":1}"#,
        )
        .unwrap();
        cp.apply_json_text(r#"{"cmd":"createDrawItem","id":102,"layerId":10}"#).unwrap();
        cp.apply_json_text(
            r#"{"cmd":"bindDrawItem","drawItemId":102,"pipeline":"instancedCandle@1","geometryId":101}"#,
        )
        .unwrap();

        let mut payload = Vec::new();
        for c in candles {
            payload.extend_from_slice(bytemuck::bytes_of(c));
        }
        let mut batch = Vec::new();
        encode_record(&mut batch, OP_APPEND, 100, 0, &payload);
        let mut ingest = IngestProcessor::new();
        ingest.process_batch(&batch);
        (cp, ingest)
    }

    fn candle(x: f32, low: f32, high: f32) -> Candle6 {
        Candle6 { x, open: low, high, low, close: high, half_width: 0.4 }
    }

    #[test]
    fn fits_only_visible_candles() {
        let candles: Vec<Candle6> = (0..10)
            .map(|i| candle(i as f32, 100.0 + i as f32, 120.0 + i as f32))
            .collect();
        let (cp, ingest) = scaffold(&candles);

        let mut vp = Viewport::new();
        vp.set_pixel_viewport(400.0, 300.0);
        vp.set_data_range(2.0, 7.0, 0.0, 200.0);

        let scale = AutoScale::default();
        let (lo, hi) = scale
            .compute_y_range(&[102], cp.scene(), &ingest, &vp)
            .unwrap();
        // Visible lows 102..=107, highs 122..=127; span 25, margin 1.25.
        assert!((lo - 100.75).abs() < 1e-6);
        assert!((hi - 128.25).abs() < 1e-6);
    }

    #[test]
    fn empty_visible_range_returns_none() {
        let candles: Vec<Candle6> = (0..5).map(|i| candle(i as f32, 90.0, 110.0)).collect();
        let (cp, ingest) = scaffold(&candles);

        let mut vp = Viewport::new();
        vp.set_data_range(100.0, 200.0, 0.0, 200.0);

        let scale = AutoScale::default();
        assert!(scale
            .compute_y_range(&[102], cp.scene(), &ingest, &vp)
            .is_none());
    }

    #[test]
    fn include_zero_extends_range() {
        let candles = [candle(0.0, 50.0, 60.0)];
        let (cp, ingest) = scaffold(&candles);

        let mut vp = Viewport::new();
        vp.set_data_range(0.0, 10.0, 0.0, 100.0);

        let scale = AutoScale::new(AutoScaleConfig {
            margin_fraction: 0.0,
            include_zero: true,
        });
        let (lo, hi) = scale
            .compute_y_range(&[102], cp.scene(), &ingest, &vp)
            .unwrap();
        assert_eq!(lo, 0.0);
        assert!((hi - 60.0).abs() < 1e-9);
    }
}
