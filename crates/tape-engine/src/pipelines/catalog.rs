use std::collections::HashMap;

use crate::scene::VertexFormat;

/// How the renderer interprets a pipeline's vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    Lines,
    Points,
    /// One logical record expands to `vertices_per_instance` vertices.
    InstancedTriangles,
}

/// A named, versioned GPU program spec. The catalog fixes the vertex format a
/// draw item's geometry must carry once bound.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: &'static str,
    pub version: u32,
    pub required_format: VertexFormat,
    pub draw_mode: DrawMode,
    /// Vertices emitted per record for instanced modes; 0 for non-instanced.
    pub vertices_per_instance: u32,
    /// The pipeline carries a per-vertex antialias attribute.
    pub antialiased: bool,
}

impl PipelineSpec {
    pub fn key(&self) -> String {
        pipeline_key(self.name, self.version)
    }
}

/// Catalog key for a pipeline name + version.
pub fn pipeline_key(name: &str, version: u32) -> String {
    format!("{name}@{version}")
}

/// Static registry of draw pipelines. Read-only after construction; one
/// instance may be shared across sessions.
#[derive(Debug)]
pub struct PipelineCatalog {
    specs: HashMap<String, PipelineSpec>,
}

impl PipelineCatalog {
    pub fn new() -> Self {
        let mut specs = HashMap::new();
        let mut reg = |name: &'static str,
                       version: u32,
                       required_format: VertexFormat,
                       draw_mode: DrawMode,
                       vertices_per_instance: u32,
                       antialiased: bool| {
            let spec = PipelineSpec {
                name,
                version,
                required_format,
                draw_mode,
                vertices_per_instance,
                antialiased,
            };
            specs.insert(spec.key(), spec);
        };

        reg("triSolid", 1, VertexFormat::Pos2Clip, DrawMode::Triangles, 0, false);
        reg("line2d", 1, VertexFormat::Pos2Clip, DrawMode::Lines, 0, false);
        reg("points", 1, VertexFormat::Pos2Clip, DrawMode::Points, 0, false);
        reg("lineAA", 1, VertexFormat::Rect4, DrawMode::InstancedTriangles, 6, true);
        reg("instancedRect", 1, VertexFormat::Rect4, DrawMode::InstancedTriangles, 6, false);
        reg("instancedCandle", 1, VertexFormat::Candle6, DrawMode::InstancedTriangles, 12, false);
        reg("textSDF", 1, VertexFormat::Glyph8, DrawMode::InstancedTriangles, 6, false);

        Self { specs }
    }

    pub fn find(&self, key: &str) -> Option<&PipelineSpec> {
        self.specs.get(key)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for PipelineCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pipelines_are_registered() {
        let cat = PipelineCatalog::new();
        assert_eq!(cat.len(), 7);
        for key in [
            "triSolid@1",
            "line2d@1",
            "points@1",
            "lineAA@1",
            "instancedRect@1",
            "instancedCandle@1",
            "textSDF@1",
        ] {
            assert!(cat.find(key).is_some(), "missing {key}");
        }
        assert!(cat.find("triSolid@2").is_none());
    }

    #[test]
    fn instanced_candle_spec() {
        let cat = PipelineCatalog::new();
        let spec = cat.find("instancedCandle@1").unwrap();
        assert_eq!(spec.required_format, VertexFormat::Candle6);
        assert_eq!(spec.draw_mode, DrawMode::InstancedTriangles);
        assert_eq!(spec.vertices_per_instance, 12);
    }

    #[test]
    fn line_aa_carries_antialias_attribute() {
        let cat = PipelineCatalog::new();
        let spec = cat.find("lineAA@1").unwrap();
        assert!(spec.antialiased);
        assert_eq!(spec.required_format, VertexFormat::Rect4);
        assert_eq!(spec.vertices_per_instance, 6);
    }
}
