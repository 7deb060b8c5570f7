use serde_json::json;

use crate::scene::{Id, VertexFormat};

use super::{Recipe, RecipeBuildResult, SeriesInfo, Subscription};

/// Polyline series (close-price overlay and the like) fed by a Pos2 buffer.
///
/// Id layout (4 slots from the base): buffer, geometry, draw item, transform.
#[derive(Debug, Clone)]
pub struct LineRecipeConfig {
    pub pane_id: Id,
    pub layer_id: Id,
    pub name: String,
    pub create_transform: bool,
    pub color: [f32; 4],
    pub line_width: f32,
}

impl Default for LineRecipeConfig {
    fn default() -> Self {
        Self {
            pane_id: 0,
            layer_id: 0,
            name: String::from("Line"),
            create_transform: false,
            color: [0.9, 0.9, 0.3, 1.0],
            line_width: 1.5,
        }
    }
}

pub struct LineRecipe {
    id_base: Id,
    config: LineRecipeConfig,
}

impl LineRecipe {
    pub const ID_SLOTS: u32 = 4;

    pub fn new(id_base: Id, config: LineRecipeConfig) -> Self {
        Self { id_base, config }
    }

    pub fn buffer_id(&self) -> Id {
        self.id_base
    }

    pub fn geometry_id(&self) -> Id {
        self.id_base + 1
    }

    pub fn draw_item_id(&self) -> Id {
        self.id_base + 2
    }

    pub fn transform_id(&self) -> Id {
        self.id_base + 3
    }
}

impl Recipe for LineRecipe {
    fn build(&self) -> RecipeBuildResult {
        let mut result = RecipeBuildResult::default();

        result.create_commands.push(
            json!({"cmd": "createBuffer", "id": self.buffer_id(), "byteLength": 0}).to_string(),
        );
        result.create_commands.push(
            json!({
                "cmd": "createGeometry",
                "id": self.geometry_id(),
                "vertexBufferId": self.buffer_id(),
                "format": "pos2_clip",
                "vertexCount": 0,
            })
            .to_string(),
        );
        result.create_commands.push(
            json!({
                "cmd": "createDrawItem",
                "id": self.draw_item_id(),
                "layerId": self.config.layer_id,
                "name": self.config.name,
            })
            .to_string(),
        );
        result.create_commands.push(
            json!({
                "cmd": "bindDrawItem",
                "drawItemId": self.draw_item_id(),
                "pipeline": "line2d@1",
                "geometryId": self.geometry_id(),
            })
            .to_string(),
        );
        result.create_commands.push(
            json!({
                "cmd": "setDrawItemStyle",
                "drawItemId": self.draw_item_id(),
                "r": self.config.color[0],
                "g": self.config.color[1],
                "b": self.config.color[2],
                "a": self.config.color[3],
                "lineWidth": self.config.line_width,
            })
            .to_string(),
        );
        if self.config.create_transform {
            result.create_commands.push(
                json!({"cmd": "createTransform", "id": self.transform_id()}).to_string(),
            );
            result.create_commands.push(
                json!({
                    "cmd": "attachTransform",
                    "drawItemId": self.draw_item_id(),
                    "transformId": self.transform_id(),
                })
                .to_string(),
            );
        }

        result.subscriptions.push(Subscription {
            buffer_id: self.buffer_id(),
            geometry_id: self.geometry_id(),
            format: VertexFormat::Pos2Clip,
        });

        if self.config.create_transform {
            result
                .dispose_commands
                .push(json!({"cmd": "delete", "id": self.transform_id()}).to_string());
        }
        result
            .dispose_commands
            .push(json!({"cmd": "delete", "id": self.draw_item_id()}).to_string());
        result
            .dispose_commands
            .push(json!({"cmd": "delete", "id": self.geometry_id()}).to_string());
        result
            .dispose_commands
            .push(json!({"cmd": "delete", "id": self.buffer_id()}).to_string());

        result
    }

    fn draw_item_ids(&self) -> Vec<Id> {
        vec![self.draw_item_id()]
    }

    fn series_info_list(&self) -> Vec<SeriesInfo> {
        vec![SeriesInfo {
            name: self.config.name.clone(),
            color_hint: self.config.color,
            default_visible: true,
            draw_item_ids: vec![self.draw_item_id()],
        }]
    }

    fn id_base(&self) -> Id {
        self.id_base
    }

    fn id_slots(&self) -> u32 {
        Self::ID_SLOTS
    }
}
