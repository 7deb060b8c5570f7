use std::collections::HashMap;

use super::ids::Id;
use super::types::{Buffer, DrawItem, Geometry, Layer, Pane, Transform};

/// Retained store of panes, layers, draw items, geometries, buffers and
/// transforms, keyed by id.
///
/// Pane/layer/draw-item enumeration preserves insertion order; that order is
/// the render order. Mutation is restricted to the command processor (and
/// in-crate coordinators); external consumers get the immutable queries.
#[derive(Debug, Default)]
pub struct SceneGraph {
    panes: HashMap<Id, Pane>,
    pane_order: Vec<Id>,
    layers: HashMap<Id, Layer>,
    layer_order: Vec<Id>,
    draw_items: HashMap<Id, DrawItem>,
    draw_item_order: Vec<Id>,
    buffers: HashMap<Id, Buffer>,
    geometries: HashMap<Id, Geometry>,
    transforms: HashMap<Id, Transform>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Insertion (command processor only) --

    pub(crate) fn add_pane(&mut self, pane: Pane) {
        self.pane_order.push(pane.id);
        self.panes.insert(pane.id, pane);
    }

    pub(crate) fn add_layer(&mut self, layer: Layer) {
        self.layer_order.push(layer.id);
        self.layers.insert(layer.id, layer);
    }

    pub(crate) fn add_draw_item(&mut self, item: DrawItem) {
        self.draw_item_order.push(item.id);
        self.draw_items.insert(item.id, item);
    }

    pub(crate) fn add_buffer(&mut self, buffer: Buffer) {
        self.buffers.insert(buffer.id, buffer);
    }

    pub(crate) fn add_geometry(&mut self, geometry: Geometry) {
        self.geometries.insert(geometry.id, geometry);
    }

    pub(crate) fn add_transform(&mut self, transform: Transform) {
        self.transforms.insert(transform.id, transform);
    }

    // -- Immutable queries --

    pub fn pane(&self, id: Id) -> Option<&Pane> {
        self.panes.get(&id)
    }

    pub fn layer(&self, id: Id) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn draw_item(&self, id: Id) -> Option<&DrawItem> {
        self.draw_items.get(&id)
    }

    pub fn buffer(&self, id: Id) -> Option<&Buffer> {
        self.buffers.get(&id)
    }

    pub fn geometry(&self, id: Id) -> Option<&Geometry> {
        self.geometries.get(&id)
    }

    pub fn transform(&self, id: Id) -> Option<&Transform> {
        self.transforms.get(&id)
    }

    pub fn has_pane(&self, id: Id) -> bool {
        self.panes.contains_key(&id)
    }

    pub fn has_layer(&self, id: Id) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn has_buffer(&self, id: Id) -> bool {
        self.buffers.contains_key(&id)
    }

    /// Pane ids in insertion (render) order.
    pub fn pane_ids(&self) -> &[Id] {
        &self.pane_order
    }

    /// Layer ids in insertion (render) order.
    pub fn layer_ids(&self) -> &[Id] {
        &self.layer_order
    }

    /// Draw-item ids in insertion (render) order.
    pub fn draw_item_ids(&self) -> &[Id] {
        &self.draw_item_order
    }

    // -- Mutable accessors (command processor + in-crate coordinators) --

    pub(crate) fn pane_mut(&mut self, id: Id) -> Option<&mut Pane> {
        self.panes.get_mut(&id)
    }

    pub(crate) fn draw_item_mut(&mut self, id: Id) -> Option<&mut DrawItem> {
        self.draw_items.get_mut(&id)
    }

    pub(crate) fn buffer_mut(&mut self, id: Id) -> Option<&mut Buffer> {
        self.buffers.get_mut(&id)
    }

    pub(crate) fn geometry_mut(&mut self, id: Id) -> Option<&mut Geometry> {
        self.geometries.get_mut(&id)
    }

    pub(crate) fn transform_mut(&mut self, id: Id) -> Option<&mut Transform> {
        self.transforms.get_mut(&id)
    }

    // -- Cascade deleters --
    // Each returns the flat list of removed ids (children first, root last)
    // so the registry can release every descendant exactly once.

    pub(crate) fn delete_pane(&mut self, id: Id) -> Vec<Id> {
        if !self.panes.contains_key(&id) {
            return Vec::new();
        }
        let child_layers: Vec<Id> = self
            .layer_order
            .iter()
            .copied()
            .filter(|lid| self.layers[lid].pane_id == id)
            .collect();
        let mut removed = Vec::new();
        for lid in child_layers {
            removed.extend(self.delete_layer(lid));
        }
        self.panes.remove(&id);
        self.pane_order.retain(|&p| p != id);
        removed.push(id);
        removed
    }

    pub(crate) fn delete_layer(&mut self, id: Id) -> Vec<Id> {
        if !self.layers.contains_key(&id) {
            return Vec::new();
        }
        let child_items: Vec<Id> = self
            .draw_item_order
            .iter()
            .copied()
            .filter(|did| self.draw_items[did].layer_id == id)
            .collect();
        let mut removed = Vec::new();
        for did in child_items {
            removed.extend(self.delete_draw_item(did));
        }
        self.layers.remove(&id);
        self.layer_order.retain(|&l| l != id);
        removed.push(id);
        removed
    }

    pub(crate) fn delete_draw_item(&mut self, id: Id) -> Vec<Id> {
        if self.draw_items.remove(&id).is_none() {
            return Vec::new();
        }
        self.draw_item_order.retain(|&d| d != id);
        vec![id]
    }

    pub(crate) fn delete_buffer(&mut self, id: Id) -> Vec<Id> {
        if self.buffers.remove(&id).is_none() {
            return Vec::new();
        }
        vec![id]
    }

    pub(crate) fn delete_geometry(&mut self, id: Id) -> Vec<Id> {
        if self.geometries.remove(&id).is_none() {
            return Vec::new();
        }
        vec![id]
    }

    pub(crate) fn delete_transform(&mut self, id: Id) -> Vec<Id> {
        if self.transforms.remove(&id).is_none() {
            return Vec::new();
        }
        vec![id]
    }
}
