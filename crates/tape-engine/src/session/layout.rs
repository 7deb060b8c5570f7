use serde_json::json;

use crate::commands::CommandProcessor;
use crate::scene::{Id, PaneRegion};

/// One pane's share of the vertical stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPaneEntry {
    pub pane_id: Id,
    pub fraction: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Clip-space gap between adjacent panes.
    pub gap: f32,
    /// Clip-space margin around the whole stack.
    pub margin: f32,
    /// Smallest share a divider drag may leave a pane with, as a fraction of
    /// the total.
    pub min_fraction: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap: 0.05,
            margin: 0.05,
            min_fraction: 0.1,
        }
    }
}

/// Stack panes vertically in clip space, top to bottom, honouring gap and
/// margin. Fractions are normalised by their sum.
pub fn compute_pane_layout(fractions: &[f32], gap: f32, margin: f32) -> Vec<PaneRegion> {
    if fractions.is_empty() {
        return Vec::new();
    }
    let total: f32 = fractions.iter().sum();
    let total = if total > 0.0 { total } else { 1.0 };
    let usable = 2.0 - 2.0 * margin - gap * (fractions.len() as f32 - 1.0);

    let mut regions = Vec::with_capacity(fractions.len());
    let mut y_top = 1.0 - margin;
    for &fraction in fractions {
        let height = usable * fraction / total;
        regions.push(PaneRegion {
            clip_x_min: -1.0 + margin,
            clip_x_max: 1.0 - margin,
            clip_y_min: y_top - height,
            clip_y_max: y_top,
        });
        y_top -= height + gap;
    }
    regions
}

/// Maintains the pane stack and pushes it into the scene via
/// `setPaneRegion` commands.
#[derive(Debug, Default)]
pub struct LayoutManager {
    config: LayoutConfig,
    entries: Vec<LayoutPaneEntry>,
    regions: Vec<PaneRegion>,
}

impl LayoutManager {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
            entries: Vec::new(),
            regions: Vec::new(),
        }
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.recompute();
    }

    pub fn set_panes(&mut self, entries: Vec<LayoutPaneEntry>) {
        self.entries = entries;
        self.recompute();
    }

    pub fn add_pane(&mut self, pane_id: Id, fraction: f32) {
        self.entries.push(LayoutPaneEntry { pane_id, fraction });
        self.recompute();
    }

    pub fn remove_pane(&mut self, pane_id: Id) {
        self.entries.retain(|e| e.pane_id != pane_id);
        self.recompute();
    }

    pub fn fraction_of(&self, pane_id: Id) -> f32 {
        self.entries
            .iter()
            .find(|e| e.pane_id == pane_id)
            .map_or(0.0, |e| e.fraction)
    }

    pub fn entries(&self) -> &[LayoutPaneEntry] {
        &self.entries
    }

    pub fn regions(&self) -> &[PaneRegion] {
        &self.regions
    }

    pub fn divider_count(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    /// Clip-space Y of the middle of a divider's gap.
    pub fn divider_clip_y(&self, divider_index: usize) -> f32 {
        if divider_index >= self.divider_count() || self.regions.len() <= divider_index + 1 {
            return 0.0;
        }
        (self.regions[divider_index].clip_y_min + self.regions[divider_index + 1].clip_y_max) / 2.0
    }

    /// Move a divider: grows the pane above by `delta` at the expense of the
    /// pane below, clamped so neither falls under the minimum fraction.
    pub fn resize_divider(&mut self, divider_index: usize, delta: f32) {
        if divider_index >= self.divider_count() {
            return;
        }
        let total: f32 = self.entries.iter().map(|e| e.fraction).sum();
        let floor = self.config.min_fraction * total;
        let max_grow = self.entries[divider_index + 1].fraction - floor;
        let max_shrink = self.entries[divider_index].fraction - floor;
        let clamped = delta.clamp(-max_shrink, max_grow);

        self.entries[divider_index].fraction += clamped;
        self.entries[divider_index + 1].fraction -= clamped;
        self.recompute();
    }

    /// Recompute regions and issue a `setPaneRegion` per entry. Idempotent:
    /// the same config and entries always produce the same regions.
    pub fn apply_layout(&mut self, cp: &mut CommandProcessor) {
        self.recompute();
        for (entry, region) in self.entries.iter().zip(&self.regions) {
            let _ = cp.apply_json(&json!({
                "cmd": "setPaneRegion",
                "id": entry.pane_id,
                "clipXMin": region.clip_x_min,
                "clipXMax": region.clip_x_max,
                "clipYMin": region.clip_y_min,
                "clipYMax": region.clip_y_max,
            }));
        }
    }

    fn recompute(&mut self) {
        let fractions: Vec<f32> = self.entries.iter().map(|e| e.fraction).collect();
        self.regions = compute_pane_layout(&fractions, self.config.gap, self.config.margin);
    }
}
