use serde_json::json;

use crate::commands::CommandProcessor;
use crate::ingest::IngestProcessor;
use crate::scene::{Candle6, Id};
use crate::viewport::Viewport;

use super::source::DataSource;

/// Wires a CPU buffer to the geometry whose vertex count must track it.
#[derive(Debug, Clone, Copy)]
pub struct BufferGeometryBinding {
    pub buffer_id: Id,
    pub geometry_id: Id,
    /// Record stride, e.g. 24 for candle6, 8 for pos2_clip.
    pub bytes_per_vertex: u32,
}

#[derive(Debug, Clone)]
pub struct LiveIngestConfig {
    pub auto_scroll_x: bool,
    pub auto_scale_y: bool,
    /// Fraction of the X span kept as right margin when auto-scrolling.
    pub scroll_margin: f32,
}

impl Default for LiveIngestConfig {
    fn default() -> Self {
        Self {
            auto_scroll_x: true,
            auto_scale_y: true,
            scroll_margin: 0.1,
        }
    }
}

/// Per-frame bridge between a data source and the scene.
///
/// Drains every queued batch into the ingest processor, keeps geometry vertex
/// counts in step with the touched buffers, and optionally follows the feed
/// with the viewport (scroll to the newest candle, rescale Y to the visible
/// price range).
#[derive(Debug, Default)]
pub struct LiveIngestLoop {
    config: LiveIngestConfig,
    bindings: Vec<BufferGeometryBinding>,
}

impl LiveIngestLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&mut self, config: LiveIngestConfig) {
        self.config = config;
    }

    pub fn add_binding(&mut self, binding: BufferGeometryBinding) {
        self.bindings.push(binding);
    }

    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    pub fn bindings(&self) -> &[BufferGeometryBinding] {
        &self.bindings
    }

    /// Drain the source and propagate the effects. Returns the touched buffer
    /// ids, deduplicated in first-touch order; empty when no batch arrived.
    pub fn consume_and_update(
        &self,
        source: &mut dyn DataSource,
        ingest: &mut IngestProcessor,
        cp: &mut CommandProcessor,
        viewport: Option<&mut Viewport>,
    ) -> Vec<Id> {
        let mut touched: Vec<Id> = Vec::new();
        while let Some(batch) = source.poll() {
            let result = ingest.process_batch(&batch);
            for id in result.touched_buffer_ids {
                if !touched.contains(&id) {
                    touched.push(id);
                }
            }
        }
        if touched.is_empty() {
            return touched;
        }

        for binding in &self.bindings {
            if !touched.contains(&binding.buffer_id) {
                continue;
            }
            let size = ingest.size(binding.buffer_id);
            let vertex_count = if binding.bytes_per_vertex > 0 {
                size / binding.bytes_per_vertex
            } else {
                0
            };
            let _ = cp.apply_json(&json!({
                "cmd": "setGeometryVertexCount",
                "geometryId": binding.geometry_id,
                "vertexCount": vertex_count,
            }));
        }

        if let Some(viewport) = viewport {
            self.follow_feed(&touched, ingest, viewport);
        }

        touched
    }

    /// Auto-scroll then auto-scale, driven by the first touched candle
    /// binding.
    fn follow_feed(&self, touched: &[Id], ingest: &IngestProcessor, viewport: &mut Viewport) {
        let stride = Candle6::STRIDE_BYTES;
        let Some(binding) = self.bindings.iter().find(|b| {
            b.bytes_per_vertex == stride as u32 && touched.contains(&b.buffer_id)
        }) else {
            return;
        };

        let data = ingest.data(binding.buffer_id);
        let candle_count = data.len() / stride;
        if candle_count == 0 {
            return;
        }

        if self.config.auto_scroll_x {
            let last: Candle6 =
                bytemuck::pod_read_unaligned(&data[(candle_count - 1) * stride..][..stride]);
            let range = viewport.data_range();
            let span = range.x_span();
            let margin = span * f64::from(self.config.scroll_margin);
            let new_x_max = f64::from(last.x) + margin;
            viewport.set_data_range(new_x_max - span, new_x_max, range.y_min, range.y_max);
        }

        if self.config.auto_scale_y {
            let range = viewport.data_range();
            let mut y_min = f32::INFINITY;
            let mut y_max = f32::NEG_INFINITY;
            for i in 0..candle_count {
                let c: Candle6 = bytemuck::pod_read_unaligned(&data[i * stride..][..stride]);
                let x = f64::from(c.x);
                if x < range.x_min || x > range.x_max {
                    continue;
                }
                y_min = y_min.min(c.low);
                y_max = y_max.max(c.high);
            }
            if y_min < y_max {
                let padding = (y_max - y_min) * 0.05;
                viewport.set_data_range(
                    range.x_min,
                    range.x_max,
                    f64::from(y_min - padding),
                    f64::from(y_max + padding),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::source::OneShotSource;
    use crate::ingest::{encode_record, OP_APPEND};

    fn candle_batch(buffer_id: u32, candles: &[Candle6]) -> Vec<u8> {
        let mut payload = Vec::new();
        for c in candles {
            payload.extend_from_slice(bytemuck::bytes_of(c));
        }
        let mut batch = Vec::new();
        encode_record(&mut batch, OP_APPEND, buffer_id, 0, &payload);
        batch
    }

    fn candle(x: f32, low: f32, high: f32) -> Candle6 {
        Candle6 {
            x,
            open: low + 1.0,
            high,
            low,
            close: high - 1.0,
            half_width: 0.4,
        }
    }

    fn scaffold() -> (CommandProcessor, IngestProcessor) {
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
        (cp, IngestProcessor::new())
    }

    #[test]
    fn ingest_updates_vertex_count() {
        let (mut cp, mut ingest) = scaffold();
        let mut liveloop = LiveIngestLoop::new();
        liveloop.add_binding(BufferGeometryBinding {
            buffer_id: 100,
            geometry_id: 101,
            bytes_per_vertex: 24,
        });

        let mut source = OneShotSource::new();
        // Three APPENDs, one candle each.
        for i in 0..3 {
            source.push_batch(candle_batch(100, &[candle(i as f32, 95.0, 105.0)]));
        }
        source.start();

        let touched = liveloop.consume_and_update(&mut source, &mut ingest, &mut cp, None);
        assert_eq!(touched, vec![100]);
        assert_eq!(ingest.size(100), 72);
        assert_eq!(cp.scene().geometry(101).unwrap().vertex_count, 3);
    }

    #[test]
    fn no_batches_means_no_effect() {
        let (mut cp, mut ingest) = scaffold();
        let liveloop = LiveIngestLoop::new();
        let mut source = OneShotSource::new();
        source.start();
        let touched = liveloop.consume_and_update(&mut source, &mut ingest, &mut cp, None);
        assert!(touched.is_empty());
        assert_eq!(cp.scene().geometry(101).unwrap().vertex_count, 1);
    }

    #[test]
    fn auto_scroll_follows_last_candle() {
        let (mut cp, mut ingest) = scaffold();
        let mut liveloop = LiveIngestLoop::new();
        liveloop.set_config(LiveIngestConfig {
            auto_scroll_x: true,
            auto_scale_y: false,
            scroll_margin: 0.1,
        });
        liveloop.add_binding(BufferGeometryBinding {
            buffer_id: 100,
            geometry_id: 101,
            bytes_per_vertex: 24,
        });

        let mut viewport = Viewport::new();
        viewport.set_pixel_viewport(800.0, 600.0);
        viewport.set_data_range(0.0, 100.0, 0.0, 200.0);

        let candles: Vec<Candle6> = (0..50).map(|i| candle(i as f32, 95.0, 105.0)).collect();
        let mut source = OneShotSource::new();
        source.push_batch(candle_batch(100, &candles));
        source.start();

        liveloop.consume_and_update(&mut source, &mut ingest, &mut cp, Some(&mut viewport));
        let r = viewport.data_range();
        // lastX = 49, margin = 10% of span 100.
        assert!((r.x_max - 59.0).abs() < 1e-6);
        assert!((r.x_min - -41.0).abs() < 1e-6);
        assert!((r.x_span() - 100.0).abs() < 1e-9);
        // Y untouched.
        assert!((r.y_max - 200.0).abs() < 1e-9);
    }

    #[test]
    fn auto_scale_fits_visible_candles_with_padding() {
        let (mut cp, mut ingest) = scaffold();
        let mut liveloop = LiveIngestLoop::new();
        liveloop.set_config(LiveIngestConfig {
            auto_scroll_x: false,
            auto_scale_y: true,
            scroll_margin: 0.1,
        });
        liveloop.add_binding(BufferGeometryBinding {
            buffer_id: 100,
            geometry_id: 101,
            bytes_per_vertex: 24,
        });

        let mut viewport = Viewport::new();
        viewport.set_pixel_viewport(800.0, 600.0);
        viewport.set_data_range(0.0, 5.0, 0.0, 1000.0);

        // Candles 0..5 in range [90, 110]; candle 20 out of view is wilder.
        let mut candles: Vec<Candle6> = (0..6).map(|i| candle(i as f32, 90.0, 110.0)).collect();
        candles.push(candle(20.0, 1.0, 999.0));
        let mut source = OneShotSource::new();
        source.push_batch(candle_batch(100, &candles));
        source.start();

        liveloop.consume_and_update(&mut source, &mut ingest, &mut cp, Some(&mut viewport));
        let r = viewport.data_range();
        // [90, 110] padded by 5% of the 20-unit span.
        assert!((r.y_min - 89.0).abs() < 1e-6);
        assert!((r.y_max - 111.0).abs() < 1e-6);
    }
}
