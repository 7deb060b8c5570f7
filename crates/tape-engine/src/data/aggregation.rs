use serde_json::json;

use crate::commands::CommandProcessor;
use crate::ingest::IngestProcessor;
use crate::scene::{Candle6, Id};

use super::aggregator::aggregate_candles;
use super::resolution::{ResolutionController, ResolutionPolicyConfig, ResolutionTier};

/// One raw candle buffer shadowed by a pre-aggregated buffer, and the
/// geometry that flips between them.
#[derive(Debug, Clone, Copy)]
pub struct AggregationBinding {
    pub raw_buffer_id: Id,
    /// Shadow buffer: `raw_buffer_id + offset`.
    pub agg_buffer_id: Id,
    pub geometry_id: Id,
}

#[derive(Debug, Clone)]
pub struct AggregationManagerConfig {
    pub resolution: ResolutionPolicyConfig,
    /// `agg_buffer_id = raw_buffer_id + offset`.
    pub agg_buffer_id_offset: Id,
}

impl Default for AggregationManagerConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionPolicyConfig::default(),
            agg_buffer_id_offset: 50_000,
        }
    }
}

/// Keeps each candle geometry bound to the buffer matching the current
/// resolution tier, and the shadow buffers' contents fresh.
pub struct AggregationManager {
    config: AggregationManagerConfig,
    controller: ResolutionController,
    bindings: Vec<AggregationBinding>,
}

impl AggregationManager {
    pub fn new(config: AggregationManagerConfig) -> Self {
        let controller = ResolutionController::new(config.resolution.clone());
        Self {
            config,
            controller,
            bindings: Vec::new(),
        }
    }

    pub fn set_config(&mut self, config: AggregationManagerConfig) {
        self.controller.set_config(config.resolution.clone());
        self.config = config;
    }

    pub fn config(&self) -> &AggregationManagerConfig {
        &self.config
    }

    pub fn add_binding(&mut self, binding: AggregationBinding) {
        self.bindings.push(binding);
    }

    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    pub fn bindings(&self) -> &[AggregationBinding] {
        &self.bindings
    }

    pub fn current_tier(&self) -> ResolutionTier {
        self.controller.tier()
    }

    /// Re-evaluate the tier for a new pixels-per-data-unit signal. On a tier
    /// change every binding is rebound to the active buffer (recomputing the
    /// shadow when leaving Raw). Returns the buffer ids whose contents or
    /// binding changed, for GPU sync downstream.
    pub fn on_viewport_changed(
        &mut self,
        ppdu: f64,
        ingest: &mut IngestProcessor,
        cp: &mut CommandProcessor,
    ) -> Vec<Id> {
        let mut modified = Vec::new();
        if !self.controller.evaluate(ppdu) {
            return modified;
        }

        let tier = self.controller.tier();
        let factor = self.controller.factor();
        for binding in &self.bindings {
            match tier {
                ResolutionTier::Raw => {
                    rebind_geometry(binding, binding.raw_buffer_id, ingest, cp);
                    modified.push(binding.raw_buffer_id);
                }
                ResolutionTier::Agg(_) => {
                    recompute_agg_buffer(binding, factor, ingest);
                    rebind_geometry(binding, binding.agg_buffer_id, ingest, cp);
                    modified.push(binding.agg_buffer_id);
                }
            }
        }
        modified
    }

    /// Refresh the shadow buffers whose raw side was touched. No-op at the
    /// Raw tier. Returns the modified shadow buffer ids.
    pub fn on_raw_data_changed(
        &mut self,
        touched_raw: &[Id],
        ingest: &mut IngestProcessor,
    ) -> Vec<Id> {
        let mut modified = Vec::new();
        if self.controller.tier() == ResolutionTier::Raw {
            return modified;
        }
        let factor = self.controller.factor();
        for binding in &self.bindings {
            if touched_raw.contains(&binding.raw_buffer_id) {
                recompute_agg_buffer(binding, factor, ingest);
                modified.push(binding.agg_buffer_id);
            }
        }
        modified
    }
}

impl Default for AggregationManager {
    fn default() -> Self {
        Self::new(AggregationManagerConfig::default())
    }
}

fn recompute_agg_buffer(binding: &AggregationBinding, factor: u32, ingest: &mut IngestProcessor) {
    let agg = aggregate_candles(ingest.data(binding.raw_buffer_id), factor);
    ingest.ensure_buffer(binding.agg_buffer_id);
    ingest.set_buffer_data(binding.agg_buffer_id, &agg.data);
}

fn rebind_geometry(
    binding: &AggregationBinding,
    target_buffer_id: Id,
    ingest: &IngestProcessor,
    cp: &mut CommandProcessor,
) {
    let _ = cp.apply_json(&json!({
        "cmd": "setGeometryBuffer",
        "geometryId": binding.geometry_id,
        "vertexBufferId": target_buffer_id,
    }));

    let vertex_count = (ingest.size(target_buffer_id) / Candle6::STRIDE_BYTES as u32).max(1);
    let _ = cp.apply_json(&json!({
        "cmd": "setGeometryVertexCount",
        "geometryId": binding.geometry_id,
        "vertexCount": vertex_count,
    }));
}
