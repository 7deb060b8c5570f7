use std::collections::HashMap;

use serde_json::json;

use crate::commands::{CmdError, CommandProcessor};
use crate::data::{
    AggregationBinding, AggregationManager, AggregationManagerConfig, BufferGeometryBinding,
    DataSource, LiveIngestConfig, LiveIngestLoop, ResolutionTier,
};
use crate::ingest::IngestProcessor;
use crate::recipe::{Recipe, RecipeBuildResult};
use crate::scene::{Id, SceneGraph, VertexFormat};
use crate::viewport::{DataRange, Viewport};

/// Opaque handle to a mounted recipe.
pub type RecipeHandle = u32;

/// Compute callbacks run on the main thread against the session's own ingest
/// and command processors, and return the buffer ids they mutated.
pub type ComputeCallback =
    Box<dyn FnMut(&mut IngestProcessor, &mut CommandProcessor) -> Vec<Id>>;

#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_bytes_per_buffer: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_bytes_per_buffer: 4 * 1024 * 1024,
        }
    }
}

/// Scales each candle buffer's cap with the visible data width.
#[derive(Debug, Clone, Copy)]
pub struct SmartRetentionConfig {
    /// Keep this many times the visible data's worth of bytes.
    pub retention_multiplier: f32,
    pub min_retention: u32,
    pub max_retention: u32,
}

impl Default for SmartRetentionConfig {
    fn default() -> Self {
        Self {
            retention_multiplier: 3.0,
            min_retention: 64 * 1024,
            max_retention: 8 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartSessionConfig {
    pub retention: RetentionPolicy,
    pub aggregation: AggregationManagerConfig,
    pub smart_retention: SmartRetentionConfig,
    pub enable_aggregation: bool,
    pub enable_smart_retention: bool,
}

/// What one `update()` did, in the order it did it: ingest, compute
/// callbacks, aggregation, viewport/transform sync.
#[derive(Debug, Clone, Default)]
pub struct FrameResult {
    /// Union of buffers touched by ingest, compute callbacks and
    /// aggregation, deduplicated in first-touch order.
    pub touched_buffer_ids: Vec<Id>,
    pub data_changed: bool,
    pub viewport_changed: bool,
    pub resolution_changed: bool,
}

struct MountedSlot {
    recipe: Box<dyn Recipe>,
    build: RecipeBuildResult,
    shared_transform_id: Id,
    compute: Option<ComputeCallback>,
}

struct PaneViewport {
    pane_id: Id,
    viewport: Viewport,
    transform_id: Id,
    /// Range at the end of the previous update; drives change detection.
    last_range: Option<DataRange>,
}

/// The per-frame coordinator: owns the command and ingest processors, mounts
/// recipes, drains the data source, propagates touched buffers through the
/// compute-dependency graph, keeps aggregation tiers current and syncs every
/// managed transform.
pub struct ChartSession {
    cp: CommandProcessor,
    ingest: IngestProcessor,
    live: LiveIngestLoop,
    aggregation: AggregationManager,
    config: ChartSessionConfig,
    link_x_axis: bool,
    viewports: Vec<PaneViewport>,
    next_handle: RecipeHandle,
    slots: HashMap<RecipeHandle, MountedSlot>,
    /// Upstream buffer id -> recipes whose compute callback depends on it.
    compute_deps: HashMap<Id, Vec<RecipeHandle>>,
    /// Recipes whose callback also runs when a viewport range changes.
    viewport_recompute: Vec<RecipeHandle>,
    /// Shared transforms registered at mount time, synced from the primary
    /// viewport.
    managed_transforms: Vec<Id>,
}

impl ChartSession {
    pub fn new(cp: CommandProcessor, ingest: IngestProcessor) -> Self {
        let aggregation = AggregationManager::new(AggregationManagerConfig::default());
        Self {
            cp,
            ingest,
            live: LiveIngestLoop::new(),
            aggregation,
            config: ChartSessionConfig::default(),
            link_x_axis: false,
            viewports: Vec::new(),
            next_handle: 1,
            slots: HashMap::new(),
            compute_deps: HashMap::new(),
            viewport_recompute: Vec::new(),
            managed_transforms: Vec::new(),
        }
    }

    pub fn set_config(&mut self, config: ChartSessionConfig) {
        self.aggregation.set_config(config.aggregation.clone());
        self.config = config;
    }

    pub fn config(&self) -> &ChartSessionConfig {
        &self.config
    }

    pub fn set_live_config(&mut self, config: LiveIngestConfig) {
        self.live.set_config(config);
    }

    pub fn set_link_x_axis(&mut self, enabled: bool) {
        self.link_x_axis = enabled;
    }

    // -- processors --

    pub fn commands(&self) -> &CommandProcessor {
        &self.cp
    }

    pub fn commands_mut(&mut self) -> &mut CommandProcessor {
        &mut self.cp
    }

    pub fn ingest(&self) -> &IngestProcessor {
        &self.ingest
    }

    pub fn ingest_mut(&mut self) -> &mut IngestProcessor {
        &mut self.ingest
    }

    pub fn scene(&self) -> &SceneGraph {
        self.cp.scene()
    }

    /// Copy every CPU buffer size into the scene-side byte lengths, upholding
    /// the render boundary's `vertexCount * stride <= byteLength` contract.
    pub fn sync_buffer_lengths(&mut self) {
        self.cp.sync_buffer_lengths(&self.ingest);
    }

    pub fn current_tier(&self) -> ResolutionTier {
        self.aggregation.current_tier()
    }

    // -- viewports --

    /// Register a per-pane viewport. The first registered one is the primary:
    /// it drives auto-scroll, tier selection, X-linking and shared
    /// transforms.
    pub fn add_pane_viewport(&mut self, pane_id: Id, viewport: Viewport, transform_id: Id) {
        self.viewports.push(PaneViewport {
            pane_id,
            viewport,
            transform_id,
            last_range: None,
        });
    }

    /// Single-pane convenience: one viewport, no dedicated transform.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.add_pane_viewport(0, viewport, 0);
    }

    pub fn viewport(&self, pane_id: Id) -> Option<&Viewport> {
        self.viewports
            .iter()
            .find(|pv| pv.pane_id == pane_id)
            .map(|pv| &pv.viewport)
    }

    pub fn viewport_mut(&mut self, pane_id: Id) -> Option<&mut Viewport> {
        self.viewports
            .iter_mut()
            .find(|pv| pv.pane_id == pane_id)
            .map(|pv| &mut pv.viewport)
    }

    pub fn primary_viewport(&self) -> Option<&Viewport> {
        self.viewports.first().map(|pv| &pv.viewport)
    }

    pub fn primary_viewport_mut(&mut self) -> Option<&mut Viewport> {
        self.viewports.first_mut().map(|pv| &mut pv.viewport)
    }

    // -- mounting --

    /// Mount a recipe: apply its create commands, attach the shared
    /// transform, apply retention caps and register subscriptions. A failing
    /// create command rolls the resources created so far back in reverse and
    /// returns the error, leaving the session unchanged.
    pub fn mount(
        &mut self,
        recipe: Box<dyn Recipe>,
        shared_transform_id: Id,
    ) -> Result<RecipeHandle, CmdError> {
        let build = recipe.build();

        let mut created: Vec<Id> = Vec::new();
        for cmd in &build.create_commands {
            match self.cp.apply_json_text(cmd) {
                Ok(out) => {
                    if out.created_id != 0 {
                        created.push(out.created_id);
                    }
                }
                Err(err) => {
                    log::warn!("mount aborted: {err}; rolling back partial create");
                    for &id in created.iter().rev() {
                        if let Ok(out) =
                            self.cp.apply_json(&json!({"cmd": "delete", "id": id}))
                        {
                            for released in out.released {
                                self.ingest.remove_buffer(released);
                            }
                        }
                    }
                    return Err(err);
                }
            }
        }

        if shared_transform_id != 0 {
            for draw_item_id in recipe.draw_item_ids() {
                let _ = self.cp.apply_json(&json!({
                    "cmd": "attachTransform",
                    "drawItemId": draw_item_id,
                    "transformId": shared_transform_id,
                }));
            }
            if !self.managed_transforms.contains(&shared_transform_id) {
                self.managed_transforms.push(shared_transform_id);
            }
        }

        for sub in &build.subscriptions {
            self.ingest
                .set_max_bytes(sub.buffer_id, self.config.retention.max_bytes_per_buffer);
        }

        if self.config.enable_aggregation {
            self.setup_aggregation(&build);
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        log::debug!("mounted recipe {} (id base {})", handle, recipe.id_base());
        self.slots.insert(
            handle,
            MountedSlot {
                recipe,
                build,
                shared_transform_id,
                compute: None,
            },
        );
        self.rebuild_bindings();
        Ok(handle)
    }

    /// Unmount: apply dispose commands in listed order and drop every
    /// registration. A second call with the same handle is a no-op.
    pub fn unmount(&mut self, handle: RecipeHandle) {
        let Some(slot) = self.slots.remove(&handle) else {
            return;
        };
        log::debug!("unmounting recipe {handle}");

        for cmd in &slot.build.dispose_commands {
            match self.cp.apply_json_text(cmd) {
                Ok(out) => {
                    for id in out.released {
                        self.ingest.remove_buffer(id);
                    }
                }
                Err(err) => log::debug!("dispose command failed: {err}"),
            }
        }

        for handles in self.compute_deps.values_mut() {
            handles.retain(|&h| h != handle);
        }
        self.viewport_recompute.retain(|&h| h != handle);

        if slot.shared_transform_id != 0
            && !self
                .slots
                .values()
                .any(|s| s.shared_transform_id == slot.shared_transform_id)
        {
            self.managed_transforms
                .retain(|&t| t != slot.shared_transform_id);
        }

        self.rebuild_bindings();
        if self.config.enable_aggregation {
            self.rebuild_aggregation_bindings(&slot.build);
        }
    }

    pub fn unmount_all(&mut self) {
        let handles: Vec<RecipeHandle> = self.slots.keys().copied().collect();
        for handle in handles {
            self.unmount(handle);
        }
    }

    pub fn is_mounted(&self, handle: RecipeHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn recipe(&self, handle: RecipeHandle) -> Option<&dyn Recipe> {
        self.slots.get(&handle).map(|s| s.recipe.as_ref())
    }

    // -- compute graph --

    pub fn set_compute_callback(&mut self, handle: RecipeHandle, callback: ComputeCallback) {
        if let Some(slot) = self.slots.get_mut(&handle) {
            slot.compute = Some(callback);
        }
    }

    /// Run the recipe's callback whenever `upstream_buffer_id` is touched.
    pub fn add_compute_dependency(&mut self, handle: RecipeHandle, upstream_buffer_id: Id) {
        self.compute_deps
            .entry(upstream_buffer_id)
            .or_default()
            .push(handle);
    }

    /// Also run the recipe's callback on frames where a viewport's data range
    /// changed.
    pub fn set_recompute_on_viewport_change(&mut self, handle: RecipeHandle, enabled: bool) {
        if enabled {
            if !self.viewport_recompute.contains(&handle) {
                self.viewport_recompute.push(handle);
            }
        } else {
            self.viewport_recompute.retain(|&h| h != handle);
        }
    }

    // -- per-frame update --

    pub fn update(&mut self, source: &mut dyn DataSource) -> FrameResult {
        let mut result = FrameResult::default();

        // 1. Drain every queued batch; vertex counts follow.
        let mut touched = self.live.consume_and_update(
            source,
            &mut self.ingest,
            &mut self.cp,
            self.viewports.first_mut().map(|pv| &mut pv.viewport),
        );
        result.data_changed = !touched.is_empty();

        // 2. Compute callbacks of recipes depending on touched buffers,
        // deduplicated, once per frame.
        let mut ran: Vec<RecipeHandle> = Vec::new();
        if !touched.is_empty() {
            let mut to_compute: Vec<RecipeHandle> = Vec::new();
            for id in &touched {
                if let Some(handles) = self.compute_deps.get(id) {
                    for &h in handles {
                        if !to_compute.contains(&h) {
                            to_compute.push(h);
                        }
                    }
                }
            }
            to_compute.sort_unstable();
            let produced = run_callbacks(
                &to_compute,
                &mut ran,
                &mut self.slots,
                &mut self.ingest,
                &mut self.cp,
            );
            union_into(&mut touched, produced);
        }

        // 3. Aggregation follows raw mutations while on an aggregated tier.
        if self.config.enable_aggregation && !touched.is_empty() {
            let modified = self.aggregation.on_raw_data_changed(&touched, &mut self.ingest);
            union_into(&mut touched, modified);
        }

        // 4. Tier re-evaluation precedes transform sync.
        if self.config.enable_aggregation {
            if let Some(ppdu) = self
                .viewports
                .first()
                .map(|pv| pv.viewport.pixels_per_data_unit_x())
            {
                let tier_before = self.aggregation.current_tier();
                let modified =
                    self.aggregation
                        .on_viewport_changed(ppdu, &mut self.ingest, &mut self.cp);
                result.resolution_changed = self.aggregation.current_tier() != tier_before;
                union_into(&mut touched, modified);
            }
        }

        // 5. Viewport change detection, then the flagged recompute callbacks.
        let viewport_changed = self
            .viewports
            .iter()
            .any(|pv| pv.last_range != Some(pv.viewport.data_range()));
        result.viewport_changed = viewport_changed;
        if viewport_changed && !self.viewport_recompute.is_empty() {
            let flagged = self.viewport_recompute.clone();
            let produced = run_callbacks(
                &flagged,
                &mut ran,
                &mut self.slots,
                &mut self.ingest,
                &mut self.cp,
            );
            union_into(&mut touched, produced);
        }

        // 6. Transform sync: each pane transform from its own viewport,
        // shared transforms from the primary. A transform owned by a pane
        // viewport is synced by that pane only.
        let pane_transforms: Vec<Id> = self
            .viewports
            .iter()
            .map(|pv| pv.transform_id)
            .filter(|&id| id != 0)
            .collect();
        for transform_id in pane_transforms {
            self.sync_transform(transform_id);
        }
        let managed = self.managed_transforms.clone();
        for transform_id in managed {
            let pane_owned = self
                .viewports
                .iter()
                .any(|pv| pv.transform_id == transform_id);
            if !pane_owned {
                self.sync_transform(transform_id);
            }
        }

        // 7. X-axis linking copies the primary X range onto the secondaries.
        if self.link_x_axis && self.viewports.len() > 1 {
            let primary_range = self.viewports[0].viewport.data_range();
            for pv in self.viewports.iter_mut().skip(1) {
                let r = pv.viewport.data_range();
                pv.viewport
                    .set_data_range(primary_range.x_min, primary_range.x_max, r.y_min, r.y_max);
            }
        }

        // 8. Smart retention tracks the visible data width.
        if self.config.enable_smart_retention {
            if let Some(primary) = self.viewports.first() {
                let visible_width = primary.viewport.data_range().x_span();
                let cfg = self.config.smart_retention;
                let target = (visible_width
                    * f64::from(VertexFormat::Candle6.stride())
                    * f64::from(cfg.retention_multiplier))
                .clamp(f64::from(cfg.min_retention), f64::from(cfg.max_retention))
                    as u32;
                let ingest = &mut self.ingest;
                for slot in self.slots.values() {
                    for sub in &slot.build.subscriptions {
                        if sub.format == VertexFormat::Candle6 {
                            ingest.set_max_bytes(sub.buffer_id, target);
                        }
                    }
                }
            }
        }

        for pv in &mut self.viewports {
            pv.last_range = Some(pv.viewport.data_range());
        }
        result.touched_buffer_ids = touched;
        result
    }

    /// Issue `setTransform` for one transform: from the pane viewport that
    /// owns it, or from the primary viewport for shared transforms.
    pub fn sync_transform(&mut self, transform_id: Id) {
        let viewport = self
            .viewports
            .iter()
            .find(|pv| pv.transform_id == transform_id)
            .map(|pv| &pv.viewport)
            .or_else(|| self.viewports.first().map(|pv| &pv.viewport));
        let Some(viewport) = viewport else {
            return;
        };
        apply_transform(&mut self.cp, transform_id, viewport);
    }

    // -- internals --

    fn rebuild_bindings(&mut self) {
        self.live.clear_bindings();
        for slot in self.slots.values() {
            for sub in &slot.build.subscriptions {
                self.live.add_binding(BufferGeometryBinding {
                    buffer_id: sub.buffer_id,
                    geometry_id: sub.geometry_id,
                    bytes_per_vertex: sub.format.stride(),
                });
            }
        }
    }

    /// Register aggregation shadows for a freshly mounted recipe's candle
    /// subscriptions, creating the shadow buffer resources as needed.
    fn setup_aggregation(&mut self, build: &RecipeBuildResult) {
        let offset = self.config.aggregation.agg_buffer_id_offset;
        for sub in &build.subscriptions {
            if sub.format != VertexFormat::Candle6 {
                continue;
            }
            let agg_buffer_id = sub.buffer_id + offset;
            if !self.cp.scene().has_buffer(agg_buffer_id) {
                let _ = self.cp.apply_json(&json!({
                    "cmd": "createBuffer",
                    "id": agg_buffer_id,
                    "byteLength": 0,
                }));
            }
            let exists = self
                .aggregation
                .bindings()
                .iter()
                .any(|b| b.raw_buffer_id == sub.buffer_id);
            if !exists {
                self.aggregation.add_binding(AggregationBinding {
                    raw_buffer_id: sub.buffer_id,
                    agg_buffer_id,
                    geometry_id: sub.geometry_id,
                });
            }
        }
    }

    /// Drop aggregation bindings owned by an unmounted recipe and re-add the
    /// survivors; shadow buffers nobody references any more are deleted.
    fn rebuild_aggregation_bindings(&mut self, removed: &RecipeBuildResult) {
        self.aggregation.clear_bindings();
        let remaining: Vec<RecipeBuildResult> =
            self.slots.values().map(|s| s.build.clone()).collect();
        for build in &remaining {
            self.setup_aggregation(build);
        }

        let offset = self.config.aggregation.agg_buffer_id_offset;
        for sub in &removed.subscriptions {
            if sub.format != VertexFormat::Candle6 {
                continue;
            }
            let agg_buffer_id = sub.buffer_id + offset;
            let still_used = self
                .aggregation
                .bindings()
                .iter()
                .any(|b| b.agg_buffer_id == agg_buffer_id);
            if !still_used && self.cp.scene().has_buffer(agg_buffer_id) {
                if let Ok(out) = self
                    .cp
                    .apply_json(&json!({"cmd": "delete", "id": agg_buffer_id}))
                {
                    for id in out.released {
                        self.ingest.remove_buffer(id);
                    }
                }
            }
        }
    }
}

fn apply_transform(cp: &mut CommandProcessor, transform_id: Id, viewport: &Viewport) {
    let params = viewport.compute_transform_params();
    let _ = cp.apply_json(&json!({
        "cmd": "setTransform",
        "id": transform_id,
        "sx": params.sx,
        "sy": params.sy,
        "tx": params.tx,
        "ty": params.ty,
    }));
}

/// Run each handle's callback unless it already ran this frame; returns the
/// union of buffer ids the callbacks report as mutated.
fn run_callbacks(
    handles: &[RecipeHandle],
    ran: &mut Vec<RecipeHandle>,
    slots: &mut HashMap<RecipeHandle, MountedSlot>,
    ingest: &mut IngestProcessor,
    cp: &mut CommandProcessor,
) -> Vec<Id> {
    let mut produced = Vec::new();
    for &handle in handles {
        if ran.contains(&handle) {
            continue;
        }
        if let Some(slot) = slots.get_mut(&handle) {
            if let Some(callback) = slot.compute.as_mut() {
                union_into(&mut produced, callback(ingest, cp));
                ran.push(handle);
            }
        }
    }
    produced
}

fn union_into(dst: &mut Vec<Id>, src: Vec<Id>) {
    for id in src {
        if !dst.contains(&id) {
            dst.push(id);
        }
    }
}
