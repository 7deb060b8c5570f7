use bytemuck::{Pod, Zeroable};

use super::ids::Id;

/// Vertex record layout of a geometry's backing buffer.
/// Strides are fixed by the wire format and shared with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexFormat {
    /// `f32 x, y` in clip space.
    #[default]
    Pos2Clip,
    /// `f32 x0, y0, x1, y1` for instanced rects and line-segment pairs.
    Rect4,
    /// `f32 x, open, high, low, close, halfWidth` for instanced candles.
    Candle6,
    /// `f32 x0, y0, x1, y1, u0, v0, u1, v1` for SDF text quads.
    Glyph8,
    /// `f32 x, y, alpha` for edge-fringe AA triangles.
    Pos2Alpha,
}

impl VertexFormat {
    /// Record stride in bytes.
    pub fn stride(self) -> u32 {
        match self {
            Self::Pos2Clip => 8,
            Self::Rect4 => 16,
            Self::Candle6 => 24,
            Self::Glyph8 => 32,
            Self::Pos2Alpha => 12,
        }
    }

    /// Protocol name, as used by `createGeometry`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pos2Clip => "pos2_clip",
            Self::Rect4 => "rect4",
            Self::Candle6 => "candle6",
            Self::Glyph8 => "glyph8",
            Self::Pos2Alpha => "pos2_alpha",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "pos2_clip" => Some(Self::Pos2Clip),
            "rect4" => Some(Self::Rect4),
            "candle6" => Some(Self::Candle6),
            "glyph8" => Some(Self::Glyph8),
            "pos2_alpha" => Some(Self::Pos2Alpha),
            _ => None,
        }
    }
}

/// One market-time bar in the Candle6 wire layout.
/// Must stay 6 floats = 24 bytes; the ingest stream and the instanced candle
/// pipeline both assume this stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Candle6 {
    pub x: f32,
    pub open: f32,
    pub high: f32,
    pub low: f32,
    pub close: f32,
    pub half_width: f32,
}

impl Candle6 {
    pub const FLOATS: usize = 6;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// A single Pos2Clip record (close-price line points and the like).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Pos2 {
    pub x: f32,
    pub y: f32,
}

impl Pos2 {
    pub const STRIDE_BYTES: usize = 8;
}

/// A pane's rectangle in normalised clip coordinates `[-1, +1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneRegion {
    pub clip_x_min: f32,
    pub clip_x_max: f32,
    pub clip_y_min: f32,
    pub clip_y_max: f32,
}

impl Default for PaneRegion {
    fn default() -> Self {
        Self {
            clip_x_min: -1.0,
            clip_x_max: 1.0,
            clip_y_min: -1.0,
            clip_y_max: 1.0,
        }
    }
}

/// Top-level scene node. Panes own layers transitively.
#[derive(Debug, Clone, Default)]
pub struct Pane {
    pub id: Id,
    pub name: String,
    pub region: PaneRegion,
    pub clear_color: [f32; 4],
    pub clear_color_present: bool,
}

/// A draw-ordering group within one pane.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub id: Id,
    pub pane_id: Id,
    pub name: String,
}

/// A scene node binding a geometry to a pipeline and a transform, producing one
/// draw call per render.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub id: Id,
    pub layer_id: Id,
    pub name: String,
    /// Catalog key (`"name@version"`), empty until bound.
    pub pipeline: String,
    pub geometry_id: Id,
    pub transform_id: Id,
    pub color: [f32; 4],
    pub color_up: [f32; 4],
    pub color_down: [f32; 4],
    pub line_width: f32,
}

impl Default for DrawItem {
    fn default() -> Self {
        Self {
            id: 0,
            layer_id: 0,
            name: String::new(),
            pipeline: String::new(),
            geometry_id: 0,
            transform_id: 0,
            color: [1.0, 1.0, 1.0, 1.0],
            color_up: [0.0, 0.8, 0.2, 1.0],
            color_down: [0.9, 0.2, 0.2, 1.0],
            line_width: 1.0,
        }
    }
}

/// A view over a vertex buffer: format, logical record count, and an optional
/// data-space bounding box used for picking and culling.
///
/// `vertex_count` means logical records; for instanced pipelines it is the
/// instance count.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub id: Id,
    pub vertex_buffer_id: Id,
    pub format: VertexFormat,
    pub vertex_count: u32,
    pub bounds_min: [f32; 2],
    pub bounds_max: [f32; 2],
    pub bounds_valid: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            id: 0,
            vertex_buffer_id: 0,
            format: VertexFormat::Pos2Clip,
            vertex_count: 0,
            bounds_min: [-1e30, -1e30],
            bounds_max: [1e30, 1e30],
            bounds_valid: false,
        }
    }
}

/// Scene-side buffer record. Only the byte length lives here; the bytes
/// themselves are held by the ingest processor's parallel store.
#[derive(Debug, Clone, Copy, Default)]
pub struct Buffer {
    pub id: Id,
    pub byte_length: u32,
}

/// Scale + translation components of a 3x3 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    pub sx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl TransformParams {
    /// The full affine matrix (column-major), for renderer uniforms.
    pub fn to_mat3(self) -> glam::Mat3 {
        glam::Mat3::from_cols(
            glam::Vec3::new(self.sx, 0.0, 0.0),
            glam::Vec3::new(0.0, self.sy, 0.0),
            glam::Vec3::new(self.tx, self.ty, 1.0),
        )
    }
}

/// A shared data-to-clip transform. Multiple draw items may reference one;
/// a transform may also be unattached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub id: Id,
    pub params: TransformParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_strides_match_wire_layout() {
        assert_eq!(VertexFormat::Pos2Clip.stride(), 8);
        assert_eq!(VertexFormat::Rect4.stride(), 16);
        assert_eq!(VertexFormat::Candle6.stride(), 24);
        assert_eq!(VertexFormat::Glyph8.stride(), 32);
        assert_eq!(VertexFormat::Pos2Alpha.stride(), 12);
    }

    #[test]
    fn format_name_round_trip() {
        for f in [
            VertexFormat::Pos2Clip,
            VertexFormat::Rect4,
            VertexFormat::Candle6,
            VertexFormat::Glyph8,
            VertexFormat::Pos2Alpha,
        ] {
            assert_eq!(VertexFormat::parse(f.as_str()), Some(f));
        }
        assert_eq!(VertexFormat::parse("candle7"), None);
    }

    #[test]
    fn candle6_is_24_bytes() {
        assert_eq!(std::mem::size_of::<Candle6>(), Candle6::STRIDE_BYTES);
        assert_eq!(
            Candle6::STRIDE_BYTES as u32,
            VertexFormat::Candle6.stride()
        );
    }

    #[test]
    fn transform_params_to_mat3() {
        let p = TransformParams {
            sx: 2.0,
            sy: 0.5,
            tx: -1.0,
            ty: 3.0,
        };
        let m = p.to_mat3();
        let v = m.transform_point2(glam::Vec2::new(10.0, 4.0));
        assert!((v.x - 19.0).abs() < 1e-6);
        assert!((v.y - 5.0).abs() < 1e-6);
    }
}
