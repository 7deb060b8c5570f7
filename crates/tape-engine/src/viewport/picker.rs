use crate::ingest::IngestProcessor;
use crate::scene::{Candle6, Id, Pos2, SceneGraph, VertexFormat};

use super::viewport::Viewport;

#[derive(Debug, Clone, Copy)]
pub struct PickConfig {
    /// Maximum cursor distance for a hit, in pixels.
    pub max_distance_px: f64,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self { max_distance_px: 8.0 }
    }
}

/// A successful hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub draw_item_id: Id,
    pub record_index: u32,
    pub data_x: f64,
    pub data_y: f64,
    pub distance_px: f64,
}

/// Cursor hit-testing against the records of a pane's draw items.
///
/// Draw items without a transform are treated as non-data overlays and
/// skipped. Distances are measured in pixels so the tolerance is zoom
/// independent.
#[derive(Debug, Default)]
pub struct DataPicker {
    config: PickConfig,
}

impl DataPicker {
    pub fn new(config: PickConfig) -> Self {
        Self { config }
    }

    pub fn set_config(&mut self, config: PickConfig) {
        self.config = config;
    }

    pub fn pick(
        &self,
        cursor_px: f64,
        cursor_py: f64,
        pane_id: Id,
        scene: &SceneGraph,
        ingest: &IngestProcessor,
        viewport: &Viewport,
    ) -> Option<HitResult> {
        let cursor = viewport.pixel_to_data(cursor_px, cursor_py);
        let ppdu_x = viewport.pixels_per_data_unit_x();
        let ppdu_y = viewport.pixels_per_data_unit_y();

        let mut best: Option<HitResult> = None;
        let mut best_dist = self.config.max_distance_px;

        for &layer_id in scene.layer_ids() {
            let Some(layer) = scene.layer(layer_id) else { continue };
            if layer.pane_id != pane_id {
                continue;
            }
            for &item_id in scene.draw_item_ids() {
                let Some(item) = scene.draw_item(item_id) else { continue };
                if item.layer_id != layer_id || item.transform_id == 0 || item.geometry_id == 0 {
                    continue;
                }
                let Some(geometry) = scene.geometry(item.geometry_id) else { continue };
                let data = ingest.data(geometry.vertex_buffer_id);
                let stride = geometry.format.stride() as usize;
                if data.is_empty() || stride == 0 {
                    continue;
                }

                for (index, record) in data.chunks_exact(stride).enumerate() {
                    let Some((dx, dy, dist)) = record_distance(
                        geometry.format,
                        record,
                        cursor.x,
                        cursor.y,
                        ppdu_x,
                        ppdu_y,
                    ) else {
                        continue;
                    };
                    if dist < best_dist {
                        best_dist = dist;
                        best = Some(HitResult {
                            draw_item_id: item_id,
                            record_index: index as u32,
                            data_x: dx,
                            data_y: dy,
                            distance_px: dist,
                        });
                    }
                }
            }
        }
        best
    }
}

/// Representative data point and pixel distance of one record to the cursor.
fn record_distance(
    format: VertexFormat,
    record: &[u8],
    cursor_x: f64,
    cursor_y: f64,
    ppdu_x: f64,
    ppdu_y: f64,
) -> Option<(f64, f64, f64)> {
    match format {
        VertexFormat::Pos2Clip => {
            let p: Pos2 = bytemuck::pod_read_unaligned(record);
            let ddx = (f64::from(p.x) - cursor_x) * ppdu_x;
            let ddy = (f64::from(p.y) - cursor_y) * ppdu_y;
            Some((f64::from(p.x), f64::from(p.y), (ddx * ddx + ddy * ddy).sqrt()))
        }
        VertexFormat::Candle6 => {
            let c: Candle6 = bytemuck::pod_read_unaligned(record);
            let cx = f64::from(c.x);
            let body_center = f64::from(c.open + c.close) * 0.5;

            let x_dist_data = (cursor_x - cx).abs();
            let x_dist_px = if x_dist_data <= f64::from(c.half_width) {
                0.0
            } else {
                x_dist_data * ppdu_x
            };

            let y_dist_data = if cursor_y >= f64::from(c.low) && cursor_y <= f64::from(c.high) {
                0.0
            } else {
                (cursor_y - f64::from(c.low))
                    .abs()
                    .min((cursor_y - f64::from(c.high)).abs())
            };
            let y_dist_px = y_dist_data * ppdu_y;

            Some((cx, body_center, (x_dist_px * x_dist_px + y_dist_px * y_dist_px).sqrt()))
        }
        VertexFormat::Rect4 => {
            let r: [f32; 4] = bytemuck::pod_read_unaligned(record);
            let min_x = f64::from(r[0].min(r[2]));
            let max_x = f64::from(r[0].max(r[2]));
            let min_y = f64::from(r[1].min(r[3]));
            let max_y = f64::from(r[1].max(r[3]));
            let center_x = (min_x + max_x) * 0.5;
            let center_y = (min_y + max_y) * 0.5;

            let dist = if cursor_x >= min_x && cursor_x <= max_x && cursor_y >= min_y && cursor_y <= max_y
            {
                0.0
            } else {
                let clamp_x = cursor_x.clamp(min_x, max_x);
                let clamp_y = cursor_y.clamp(min_y, max_y);
                let ddx = (cursor_x - clamp_x) * ppdu_x;
                let ddy = (cursor_y - clamp_y) * ppdu_y;
                (ddx * ddx + ddy * ddy).sqrt()
            };
            Some((center_x, center_y, dist))
        }
        _ => None,
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
        cp.apply_json_text(r#"{"cmd":"createTransform","id":50}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"attachTransform","drawItemId":102,"transformId":50}"#)
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

    fn viewport() -> Viewport {
        let mut vp = Viewport::new();
        vp.set_pixel_viewport(400.0, 300.0);
        vp.set_data_range(0.0, 10.0, 0.0, 200.0);
        vp
    }

    #[test]
    fn picks_the_candle_under_the_cursor() {
        let candles: Vec<Candle6> = (0..10)
            .map(|i| Candle6 {
                x: i as f32,
                open: 95.0,
                high: 110.0,
                low: 90.0,
                close: 105.0,
                half_width: 0.4,
            })
            .collect();
        let (cp, ingest) = scaffold(&candles);
        let vp = viewport();

        // Cursor on candle 3's body.
        let cursor = vp.data_to_pixel(3.0, 100.0);
        let picker = DataPicker::default();
        let hit = picker
            .pick(cursor.x, cursor.y, 1, cp.scene(), &ingest, &vp)
            .expect("hit");
        assert_eq!(hit.draw_item_id, 102);
        assert_eq!(hit.record_index, 3);
        assert_eq!(hit.distance_px, 0.0);
    }

    #[test]
    fn respects_pixel_tolerance() {
        let candles = [Candle6 {
            x: 5.0,
            open: 95.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            half_width: 0.1,
        }];
        let (cp, ingest) = scaffold(&candles);
        let vp = viewport();
        let picker = DataPicker::default();

        // Far away from the candle: no hit.
        let cursor = vp.data_to_pixel(9.0, 20.0);
        assert!(picker
            .pick(cursor.x, cursor.y, 1, cp.scene(), &ingest, &vp)
            .is_none());
    }

    #[test]
    fn ignores_other_panes() {
        let candles = [Candle6 {
            x: 1.0,
            open: 95.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            half_width: 0.4,
        }];
        let (cp, ingest) = scaffold(&candles);
        let vp = viewport();
        let picker = DataPicker::default();
        let cursor = vp.data_to_pixel(1.0, 100.0);
        assert!(picker
            .pick(cursor.x, cursor.y, 2, cp.scene(), &ingest, &vp)
            .is_none());
    }
}
