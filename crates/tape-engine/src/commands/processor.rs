use serde_json::{json, Value};

use crate::ingest::IngestProcessor;
use crate::pipelines::PipelineCatalog;
use crate::scene::{
    parse_id_str, Buffer, DrawItem, Geometry, Id, IdRegistry, Layer, Pane, ResourceKind,
    SceneGraph, Transform, VertexFormat,
};

use super::error::{CmdCode, CmdError, CmdOutput, CmdResult};

/// The single write path into the scene and the id registry.
///
/// Parses one JSON command object per call, dispatches on the `cmd` string and
/// either applies the full effect or rejects with a typed error and no side
/// effect.
pub struct CommandProcessor {
    scene: SceneGraph,
    registry: IdRegistry,
    catalog: PipelineCatalog,
    in_frame: bool,
    frame_counter: u64,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self {
            scene: SceneGraph::new(),
            registry: IdRegistry::new(),
            catalog: PipelineCatalog::new(),
            in_frame: false,
            frame_counter: 0,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &PipelineCatalog {
        &self.catalog
    }

    pub fn frame(&self) -> u64 {
        self.frame_counter
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Parse a JSON text and apply it as a single command.
    pub fn apply_json_text(&mut self, text: &str) -> CmdResult {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            CmdError::new(CmdCode::ParseError, format!("invalid JSON: {e}"))
        })?;
        self.apply_json(&value)
    }

    /// Apply a single parsed command object.
    pub fn apply_json(&mut self, obj: &Value) -> CmdResult {
        if !obj.is_object() {
            return Err(CmdError::new(CmdCode::ParseError, "command must be a JSON object"));
        }
        let cmd = match member(obj, "cmd").and_then(Value::as_str) {
            Some(c) => c,
            None => return Err(CmdError::new(CmdCode::MissingField, "missing string field: cmd")),
        };

        let result = match cmd {
            "hello" => Ok(CmdOutput::default()),
            "beginFrame" => self.cmd_begin_frame(),
            "commitFrame" => self.cmd_commit_frame(),
            "createPane" => self.cmd_create_pane(obj),
            "createLayer" => self.cmd_create_layer(obj),
            "createDrawItem" => self.cmd_create_draw_item(obj),
            "createBuffer" => self.cmd_create_buffer(obj),
            "createGeometry" => self.cmd_create_geometry(obj),
            "createTransform" => self.cmd_create_transform(obj),
            "bindDrawItem" => self.cmd_bind_draw_item(obj),
            "attachTransform" => self.cmd_attach_transform(obj),
            "setTransform" => self.cmd_set_transform(obj),
            "setGeometryBuffer" => self.cmd_set_geometry_buffer(obj),
            "setGeometryVertexCount" => self.cmd_set_geometry_vertex_count(obj),
            "setGeometryBounds" => self.cmd_set_geometry_bounds(obj),
            "setDrawItemColor" => self.cmd_set_draw_item_color(obj),
            "setDrawItemStyle" => self.cmd_set_draw_item_style(obj),
            "setPaneClearColor" => self.cmd_set_pane_clear_color(obj),
            "setPaneRegion" => self.cmd_set_pane_region(obj),
            "delete" => self.cmd_delete(obj),
            other => Err(CmdError::new(
                CmdCode::ParseError,
                format!("unknown cmd: {other}"),
            )),
        };

        if let Err(err) = &result {
            log::debug!("command {cmd} rejected: {err}");
        }
        result
    }

    /// Diagnostic listing of live resources and frame state.
    pub fn list_resources_json(&self) -> String {
        json!({
            "panes": self.scene.pane_ids(),
            "layers": self.scene.layer_ids(),
            "drawItems": self.scene.draw_item_ids(),
            "frame": self.frame_counter,
            "inFrame": self.in_frame,
        })
        .to_string()
    }

    /// Copy every CPU buffer's current size into the scene-side byte length.
    pub fn sync_buffer_lengths(&mut self, ingest: &IngestProcessor) {
        ingest.sync_buffer_lengths(&mut self.scene);
    }

    // -- frame state --

    fn cmd_begin_frame(&mut self) -> CmdResult {
        if self.in_frame {
            return Err(CmdError::new(CmdCode::FrameState, "beginFrame: already in frame"));
        }
        self.in_frame = true;
        self.frame_counter += 1;
        Ok(CmdOutput::default())
    }

    fn cmd_commit_frame(&mut self) -> CmdResult {
        if !self.in_frame {
            return Err(CmdError::new(CmdCode::FrameState, "commitFrame: not in frame"));
        }
        self.in_frame = false;
        Ok(CmdOutput::default())
    }

    // -- creation --

    fn cmd_create_pane(&mut self, obj: &Value) -> CmdResult {
        let id = self.reserve_or_allocate(obj, ResourceKind::Pane)?;
        self.scene.add_pane(Pane {
            id,
            name: str_or_empty(obj, "name"),
            ..Pane::default()
        });
        Ok(CmdOutput::created(id))
    }

    fn cmd_create_layer(&mut self, obj: &Value) -> CmdResult {
        let pane_id = req_id(obj, "paneId")?;
        if !self.scene.has_pane(pane_id) {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("createLayer: invalid paneId {pane_id}"),
            ));
        }
        let id = self.reserve_or_allocate(obj, ResourceKind::Layer)?;
        self.scene.add_layer(Layer {
            id,
            pane_id,
            name: str_or_empty(obj, "name"),
        });
        Ok(CmdOutput::created(id))
    }

    fn cmd_create_draw_item(&mut self, obj: &Value) -> CmdResult {
        let layer_id = req_id(obj, "layerId")?;
        if !self.scene.has_layer(layer_id) {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("createDrawItem: invalid layerId {layer_id}"),
            ));
        }
        let id = self.reserve_or_allocate(obj, ResourceKind::DrawItem)?;
        self.scene.add_draw_item(DrawItem {
            id,
            layer_id,
            name: str_or_empty(obj, "name"),
            ..DrawItem::default()
        });
        Ok(CmdOutput::created(id))
    }

    fn cmd_create_buffer(&mut self, obj: &Value) -> CmdResult {
        let byte_length = req_u32(obj, "byteLength")?;
        let id = self.reserve_or_allocate(obj, ResourceKind::Buffer)?;
        self.scene.add_buffer(Buffer { id, byte_length });
        Ok(CmdOutput::created(id))
    }

    fn cmd_create_geometry(&mut self, obj: &Value) -> CmdResult {
        let vertex_buffer_id = req_id(obj, "vertexBufferId")?;
        if !self.scene.has_buffer(vertex_buffer_id) {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("createGeometry: invalid vertexBufferId {vertex_buffer_id}"),
            ));
        }
        let format_name = match member(obj, "format").and_then(Value::as_str) {
            Some(s) => s,
            None => {
                return Err(CmdError::new(
                    CmdCode::MissingField,
                    "createGeometry: missing string field: format",
                ))
            }
        };
        let format = VertexFormat::parse(format_name).ok_or_else(|| {
            CmdError::new(
                CmdCode::MissingField,
                format!("createGeometry: unknown vertex format {format_name:?}"),
            )
        })?;
        let vertex_count = req_u32(obj, "vertexCount")?;
        let id = self.reserve_or_allocate(obj, ResourceKind::Geometry)?;
        self.scene.add_geometry(Geometry {
            id,
            vertex_buffer_id,
            format,
            vertex_count,
            ..Geometry::default()
        });
        Ok(CmdOutput::created(id))
    }

    fn cmd_create_transform(&mut self, obj: &Value) -> CmdResult {
        let id = self.reserve_or_allocate(obj, ResourceKind::Transform)?;
        self.scene.add_transform(Transform {
            id,
            ..Transform::default()
        });
        Ok(CmdOutput::created(id))
    }

    // -- binding and mutation --

    fn cmd_bind_draw_item(&mut self, obj: &Value) -> CmdResult {
        let draw_item_id = req_id(obj, "drawItemId")?;
        if self.scene.draw_item(draw_item_id).is_none() {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("bindDrawItem: invalid drawItemId {draw_item_id}"),
            ));
        }
        let pipeline = match member(obj, "pipeline").and_then(Value::as_str) {
            Some(s) => s.to_owned(),
            None => {
                return Err(CmdError::new(
                    CmdCode::MissingField,
                    "bindDrawItem: missing string field: pipeline",
                ))
            }
        };
        let geometry_id = match opt_id(obj, "geometryId")? {
            0 => {
                return Err(CmdError::new(
                    CmdCode::ValidationMissingGeometry,
                    "bindDrawItem: no geometry to bind",
                ))
            }
            id => id,
        };
        let geometry = self.scene.geometry(geometry_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("bindDrawItem: invalid geometryId {geometry_id}"),
            )
        })?;
        let spec = self.catalog.find(&pipeline).ok_or_else(|| {
            CmdError::new(
                CmdCode::PipelineUnknown,
                format!("bindDrawItem: unknown pipeline {pipeline:?}"),
            )
        })?;
        if spec.required_format != geometry.format {
            return Err(CmdError::new(
                CmdCode::FormatMismatch,
                format!(
                    "bindDrawItem: pipeline {pipeline} requires {}, geometry has {}",
                    spec.required_format.as_str(),
                    geometry.format.as_str()
                ),
            )
            .with_details(json!({
                "required": spec.required_format.as_str(),
                "actual": geometry.format.as_str(),
            })));
        }
        let item = self.scene.draw_item_mut(draw_item_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("bindDrawItem: invalid drawItemId {draw_item_id}"),
            )
        })?;
        item.pipeline = pipeline;
        item.geometry_id = geometry_id;
        Ok(CmdOutput::default())
    }

    fn cmd_attach_transform(&mut self, obj: &Value) -> CmdResult {
        let draw_item_id = req_id(obj, "drawItemId")?;
        let transform_id = req_id(obj, "transformId")?;
        if self.scene.transform(transform_id).is_none() {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("attachTransform: invalid transformId {transform_id}"),
            ));
        }
        let item = self.scene.draw_item_mut(draw_item_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("attachTransform: invalid drawItemId {draw_item_id}"),
            )
        })?;
        item.transform_id = transform_id;
        Ok(CmdOutput::default())
    }

    fn cmd_set_transform(&mut self, obj: &Value) -> CmdResult {
        let id = req_id(obj, "id")?;
        let sx = req_f32(obj, "sx")?;
        let sy = req_f32(obj, "sy")?;
        let tx = req_f32(obj, "tx")?;
        let ty = req_f32(obj, "ty")?;
        let t = self.scene.transform_mut(id).ok_or_else(|| {
            CmdError::new(CmdCode::InvalidRef, format!("setTransform: invalid id {id}"))
        })?;
        t.params.sx = sx;
        t.params.sy = sy;
        t.params.tx = tx;
        t.params.ty = ty;
        Ok(CmdOutput::default())
    }

    fn cmd_set_geometry_buffer(&mut self, obj: &Value) -> CmdResult {
        let geometry_id = req_id(obj, "geometryId")?;
        let vertex_buffer_id = req_id(obj, "vertexBufferId")?;
        if !self.scene.has_buffer(vertex_buffer_id) {
            return Err(CmdError::new(
                CmdCode::InvalidRef,
                format!("setGeometryBuffer: invalid vertexBufferId {vertex_buffer_id}"),
            ));
        }
        let g = self.scene.geometry_mut(geometry_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("setGeometryBuffer: invalid geometryId {geometry_id}"),
            )
        })?;
        g.vertex_buffer_id = vertex_buffer_id;
        Ok(CmdOutput::default())
    }

    fn cmd_set_geometry_vertex_count(&mut self, obj: &Value) -> CmdResult {
        let geometry_id = req_id(obj, "geometryId")?;
        let vertex_count = req_u32(obj, "vertexCount")?;
        let g = self.scene.geometry_mut(geometry_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("setGeometryVertexCount: invalid geometryId {geometry_id}"),
            )
        })?;
        g.vertex_count = vertex_count;
        Ok(CmdOutput::default())
    }

    fn cmd_set_geometry_bounds(&mut self, obj: &Value) -> CmdResult {
        let geometry_id = req_id(obj, "geometryId")?;
        let min_x = req_f32(obj, "minX")?;
        let min_y = req_f32(obj, "minY")?;
        let max_x = req_f32(obj, "maxX")?;
        let max_y = req_f32(obj, "maxY")?;
        let g = self.scene.geometry_mut(geometry_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("setGeometryBounds: invalid geometryId {geometry_id}"),
            )
        })?;
        g.bounds_min = [min_x, min_y];
        g.bounds_max = [max_x, max_y];
        g.bounds_valid = true;
        Ok(CmdOutput::default())
    }

    fn cmd_set_draw_item_color(&mut self, obj: &Value) -> CmdResult {
        let draw_item_id = req_id(obj, "drawItemId")?;
        let r = req_f32(obj, "r")?;
        let g = req_f32(obj, "g")?;
        let b = req_f32(obj, "b")?;
        let a = req_f32(obj, "a")?;
        let item = self.scene.draw_item_mut(draw_item_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("setDrawItemColor: invalid drawItemId {draw_item_id}"),
            )
        })?;
        item.color = [r, g, b, a];
        Ok(CmdOutput::default())
    }

    fn cmd_set_draw_item_style(&mut self, obj: &Value) -> CmdResult {
        let draw_item_id = req_id(obj, "drawItemId")?;
        // Validate every supplied field before touching the item.
        let base = [
            opt_f32(obj, "r")?,
            opt_f32(obj, "g")?,
            opt_f32(obj, "b")?,
            opt_f32(obj, "a")?,
        ];
        let line_width = opt_f32(obj, "lineWidth")?;
        let up = [
            opt_f32(obj, "colorUpR")?,
            opt_f32(obj, "colorUpG")?,
            opt_f32(obj, "colorUpB")?,
            opt_f32(obj, "colorUpA")?,
        ];
        let down = [
            opt_f32(obj, "colorDownR")?,
            opt_f32(obj, "colorDownG")?,
            opt_f32(obj, "colorDownB")?,
            opt_f32(obj, "colorDownA")?,
        ];
        let item = self.scene.draw_item_mut(draw_item_id).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidRef,
                format!("setDrawItemStyle: invalid drawItemId {draw_item_id}"),
            )
        })?;
        for (i, v) in base.iter().enumerate() {
            if let Some(v) = v {
                item.color[i] = *v;
            }
        }
        if let Some(w) = line_width {
            item.line_width = w;
        }
        for (i, v) in up.iter().enumerate() {
            if let Some(v) = v {
                item.color_up[i] = *v;
            }
        }
        for (i, v) in down.iter().enumerate() {
            if let Some(v) = v {
                item.color_down[i] = *v;
            }
        }
        Ok(CmdOutput::default())
    }

    fn cmd_set_pane_clear_color(&mut self, obj: &Value) -> CmdResult {
        let id = req_id(obj, "id")?;
        let r = req_f32(obj, "r")?;
        let g = req_f32(obj, "g")?;
        let b = req_f32(obj, "b")?;
        let a = req_f32(obj, "a")?;
        let pane = self.scene.pane_mut(id).ok_or_else(|| {
            CmdError::new(CmdCode::InvalidRef, format!("setPaneClearColor: invalid id {id}"))
        })?;
        pane.clear_color = [r, g, b, a];
        pane.clear_color_present = true;
        Ok(CmdOutput::default())
    }

    fn cmd_set_pane_region(&mut self, obj: &Value) -> CmdResult {
        let id = req_id(obj, "id")?;
        let clip_x_min = req_f32(obj, "clipXMin")?;
        let clip_x_max = req_f32(obj, "clipXMax")?;
        let clip_y_min = req_f32(obj, "clipYMin")?;
        let clip_y_max = req_f32(obj, "clipYMax")?;
        let pane = self.scene.pane_mut(id).ok_or_else(|| {
            CmdError::new(CmdCode::InvalidRef, format!("setPaneRegion: invalid id {id}"))
        })?;
        pane.region.clip_x_min = clip_x_min;
        pane.region.clip_x_max = clip_x_max;
        pane.region.clip_y_min = clip_y_min;
        pane.region.clip_y_max = clip_y_max;
        Ok(CmdOutput::default())
    }

    // -- deletion --

    fn cmd_delete(&mut self, obj: &Value) -> CmdResult {
        let id = req_id(obj, "id")?;
        let kind = self.registry.kind_of(id).ok_or_else(|| {
            CmdError::new(CmdCode::InvalidRef, format!("delete: id {id} does not exist"))
        })?;

        let removed = match kind {
            ResourceKind::Pane => self.scene.delete_pane(id),
            ResourceKind::Layer => self.scene.delete_layer(id),
            ResourceKind::DrawItem => self.scene.delete_draw_item(id),
            ResourceKind::Buffer => self.scene.delete_buffer(id),
            ResourceKind::Geometry => self.scene.delete_geometry(id),
            ResourceKind::Transform => self.scene.delete_transform(id),
        };
        // Keep the registry consistent with the scene, cascades included.
        for &rid in &removed {
            self.registry.release(rid);
        }
        Ok(CmdOutput {
            created_id: 0,
            released: removed,
        })
    }

    fn reserve_or_allocate(&mut self, obj: &Value, kind: ResourceKind) -> Result<Id, CmdError> {
        let id = opt_id(obj, "id")?;
        if id == 0 {
            return Ok(self.registry.allocate(kind));
        }
        if !self.registry.reserve(id, kind) {
            return Err(CmdError::new(
                CmdCode::DuplicateId,
                format!("id {id} already exists"),
            ));
        }
        Ok(id)
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}

// -- field helpers --

fn member<'a>(obj: &'a Value, key: &str) -> Option<&'a Value> {
    obj.as_object().and_then(|m| m.get(key))
}

fn str_or_empty(obj: &Value, key: &str) -> String {
    member(obj, key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn parse_id_value(v: &Value, key: &str) -> Result<Id, CmdError> {
    let id = match v {
        Value::Number(_) => v.as_u64().unwrap_or(0),
        Value::String(s) => parse_id_str(s).ok_or_else(|| {
            CmdError::new(
                CmdCode::InvalidId,
                format!("field {key}: id string must be decimal digits"),
            )
        })?,
        _ => {
            return Err(CmdError::new(
                CmdCode::MissingField,
                format!("field {key}: expected id"),
            ))
        }
    };
    if id == 0 {
        return Err(CmdError::new(
            CmdCode::InvalidId,
            format!("field {key}: id must be non-zero"),
        ));
    }
    Ok(id)
}

fn req_id(obj: &Value, key: &str) -> Result<Id, CmdError> {
    let v = member(obj, key).ok_or_else(|| {
        CmdError::new(CmdCode::MissingField, format!("missing field: {key}"))
    })?;
    parse_id_value(v, key)
}

/// Absent → 0 (caller allocates); present ids must be valid and non-zero.
fn opt_id(obj: &Value, key: &str) -> Result<Id, CmdError> {
    match member(obj, key) {
        None => Ok(0),
        Some(v) => parse_id_value(v, key),
    }
}

fn req_f32(obj: &Value, key: &str) -> Result<f32, CmdError> {
    member(obj, key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .ok_or_else(|| CmdError::new(CmdCode::MissingField, format!("missing number field: {key}")))
}

fn opt_f32(obj: &Value, key: &str) -> Result<Option<f32>, CmdError> {
    match member(obj, key) {
        None => Ok(None),
        Some(v) => v.as_f64().map(|v| Some(v as f32)).ok_or_else(|| {
            CmdError::new(CmdCode::MissingField, format!("field {key}: expected number"))
        }),
    }
}

fn req_u32(obj: &Value, key: &str) -> Result<u32, CmdError> {
    member(obj, key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            CmdError::new(
                CmdCode::MissingField,
                format!("missing unsigned field: {key}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp_with_scaffold() -> CommandProcessor {
        let mut cp = CommandProcessor::new();
        cp.apply_json_text(r#"{"cmd":"createPane","id":1,"name":"price"}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"createLayer","id":10,"paneId":1}"#).unwrap();
        cp
    }

    #[test]
    fn hello_is_a_no_op() {
        let mut cp = CommandProcessor::new();
        assert!(cp.apply_json_text(r#"{"cmd":"hello"}"#).is_ok());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let mut cp = CommandProcessor::new();
        let err = cp.apply_json_text("{nope").unwrap_err();
        assert_eq!(err.code, CmdCode::ParseError);
    }

    #[test]
    fn unknown_command_is_parse_error() {
        let mut cp = CommandProcessor::new();
        let err = cp.apply_json_text(r#"{"cmd":"frobnicate"}"#).unwrap_err();
        assert_eq!(err.code, CmdCode::ParseError);
    }

    #[test]
    fn frame_state_guards() {
        let mut cp = CommandProcessor::new();
        let err = cp.apply_json_text(r#"{"cmd":"commitFrame"}"#).unwrap_err();
        assert_eq!(err.code, CmdCode::FrameState);

        cp.apply_json_text(r#"{"cmd":"beginFrame"}"#).unwrap();
        let err = cp.apply_json_text(r#"{"cmd":"beginFrame"}"#).unwrap_err();
        assert_eq!(err.code, CmdCode::FrameState);

        cp.apply_json_text(r#"{"cmd":"commitFrame"}"#).unwrap();
        assert_eq!(cp.frame(), 1);
        assert!(!cp.in_frame());
    }

    #[test]
    fn create_pane_allocates_when_no_id_given() {
        let mut cp = CommandProcessor::new();
        let out = cp.apply_json_text(r#"{"cmd":"createPane"}"#).unwrap();
        assert_ne!(out.created_id, 0);
        assert!(cp.scene().has_pane(out.created_id));
    }

    #[test]
    fn duplicate_pane_id_is_rejected() {
        let mut cp = cp_with_scaffold();
        let err = cp.apply_json_text(r#"{"cmd":"createPane","id":1}"#).unwrap_err();
        assert_eq!(err.code, CmdCode::DuplicateId);
    }

    #[test]
    fn string_ids_are_accepted() {
        let mut cp = CommandProcessor::new();
        let out = cp.apply_json_text(r#"{"cmd":"createPane","id":"77"}"#).unwrap();
        assert_eq!(out.created_id, 77);
        let err = cp
            .apply_json_text(r#"{"cmd":"createPane","id":"7x"}"#)
            .unwrap_err();
        assert_eq!(err.code, CmdCode::InvalidId);
    }

    #[test]
    fn create_layer_requires_live_pane() {
        let mut cp = CommandProcessor::new();
        let err = cp
            .apply_json_text(r#"{"cmd":"createLayer","id":10,"paneId":9}"#)
            .unwrap_err();
        assert_eq!(err.code, CmdCode::InvalidRef);
        // No side effect: the layer id is still free.
        assert!(!cp.registry().exists(10));
    }

    #[test]
    fn geometry_requires_live_buffer_and_known_format() {
        let mut cp = CommandProcessor::new();
        let err = cp
            .apply_json_text(
                r#"{"cmd":"createGeometry","id":101,"vertexBufferId":100,"format":"candle6","vertexCount":1}"#,
            )
            .unwrap_err();
        assert_eq!(err.code, CmdCode::InvalidRef);

        cp.apply_json_text(r#"{"cmd":"createBuffer","id":100,"byteLength":0}"#).unwrap();
        let err = cp
            .apply_json_text(
                r#"{"cmd":"createGeometry","id":101,"vertexBufferId":100,"format":"blob9","vertexCount":1}"#,
            )
            .unwrap_err();
        assert_eq!(err.code, CmdCode::MissingField);

        cp.apply_json_text(
            r#"{"cmd":"createGeometry","id":101,"vertexBufferId":100,"format":"candle6","vertexCount":3}"#,
        )
        .unwrap();
        let g = cp.scene().geometry(101).unwrap();
        assert_eq!(g.format, VertexFormat::Candle6);
        assert_eq!(g.vertex_count, 3);
    }

    #[test]
    fn bind_draw_item_checks_pipeline_and_format() {
        let mut cp = cp_with_scaffold();
        cp.apply_json_text(r#"{"cmd":"createBuffer","id":100,"byteLength":0}"#).unwrap();
        cp.apply_json_text(
            r#"{"cmd":"createGeometry","id":101,"vertexBufferId":100,"format":"candle6","vertexCount":1}"#,
        )
        .unwrap();
        cp.apply_json_text(r#"{"cmd":"createDrawItem","id":102,"layerId":10}"#).unwrap();

        let err = cp
            .apply_json_text(
                r#"{"cmd":"bindDrawItem","drawItemId":102,"pipeline":"nope@1","geometryId":101}"#,
            )
            .unwrap_err();
        assert_eq!(err.code, CmdCode::PipelineUnknown);

        let err = cp
            .apply_json_text(
                r#"{"cmd":"bindDrawItem","drawItemId":102,"pipeline":"line2d@1","geometryId":101}"#,
            )
            .unwrap_err();
        assert_eq!(err.code, CmdCode::FormatMismatch);

        cp.apply_json_text(
            r#"{"cmd":"bindDrawItem","drawItemId":102,"pipeline":"instancedCandle@1","geometryId":101}"#,
        )
        .unwrap();
        let item = cp.scene().draw_item(102).unwrap();
        assert_eq!(item.pipeline, "instancedCandle@1");
        assert_eq!(item.geometry_id, 101);
    }

    #[test]
    fn style_and_region_setters() {
        let mut cp = cp_with_scaffold();
        cp.apply_json_text(r#"{"cmd":"createDrawItem","id":102,"layerId":10}"#).unwrap();

        cp.apply_json_text(
            r#"{"cmd":"setDrawItemColor","drawItemId":102,"r":0.1,"g":0.2,"b":0.3,"a":0.4}"#,
        )
        .unwrap();
        cp.apply_json_text(
            r#"{"cmd":"setDrawItemStyle","drawItemId":102,"lineWidth":3.5,"colorUpR":0.9}"#,
        )
        .unwrap();
        let item = cp.scene().draw_item(102).unwrap();
        assert_eq!(item.color, [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(item.line_width, 3.5);
        assert_eq!(item.color_up[0], 0.9);

        cp.apply_json_text(
            r#"{"cmd":"setPaneRegion","id":1,"clipXMin":-1,"clipXMax":1,"clipYMin":0,"clipYMax":1}"#,
        )
        .unwrap();
        let pane = cp.scene().pane(1).unwrap();
        assert_eq!(pane.region.clip_y_min, 0.0);

        cp.apply_json_text(
            r#"{"cmd":"setPaneClearColor","id":1,"r":0,"g":0,"b":0,"a":1}"#,
        )
        .unwrap();
        assert!(cp.scene().pane(1).unwrap().clear_color_present);
    }

    #[test]
    fn transforms_attach_and_update() {
        let mut cp = cp_with_scaffold();
        cp.apply_json_text(r#"{"cmd":"createDrawItem","id":102,"layerId":10}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"createTransform","id":50}"#).unwrap();
        cp.apply_json_text(r#"{"cmd":"attachTransform","drawItemId":102,"transformId":50}"#)
            .unwrap();
        assert_eq!(cp.scene().draw_item(102).unwrap().transform_id, 50);

        cp.apply_json_text(
            r#"{"cmd":"setTransform","id":50,"sx":2.0,"sy":0.5,"tx":-1.0,"ty":0.25}"#,
        )
        .unwrap();
        let t = cp.scene().transform(50).unwrap();
        assert_eq!(t.params.sx, 2.0);
        assert_eq!(t.params.ty, 0.25);
    }

    #[test]
    fn delete_pane_cascades_and_releases_registry() {
        let mut cp = cp_with_scaffold();
        cp.apply_json_text(r#"{"cmd":"createDrawItem","id":102,"layerId":10}"#).unwrap();

        let out = cp.apply_json_text(r#"{"cmd":"delete","id":1}"#).unwrap();
        assert_eq!(out.released, vec![102, 10, 1]);
        assert!(!cp.registry().exists(1));
        assert!(!cp.registry().exists(10));
        assert!(!cp.registry().exists(102));
        // Released ids are reusable.
        cp.apply_json_text(r#"{"cmd":"createPane","id":1}"#).unwrap();
    }

    #[test]
    fn delete_missing_id_is_invalid_ref() {
        let mut cp = CommandProcessor::new();
        let err = cp.apply_json_text(r#"{"cmd":"delete","id":404}"#).unwrap_err();
        assert_eq!(err.code, CmdCode::InvalidRef);
    }

    #[test]
    fn list_resources_reports_scene_and_frame() {
        let mut cp = cp_with_scaffold();
        cp.apply_json_text(r#"{"cmd":"beginFrame"}"#).unwrap();
        let listing: Value = serde_json::from_str(&cp.list_resources_json()).unwrap();
        assert_eq!(listing["panes"], json!([1]));
        assert_eq!(listing["layers"], json!([10]));
        assert_eq!(listing["drawItems"], json!([]));
        assert_eq!(listing["frame"], json!(1));
        assert_eq!(listing["inFrame"], json!(true));
    }
}
