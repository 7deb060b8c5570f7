use serde_json::json;

use crate::scene::{Id, VertexFormat};

use super::{Recipe, RecipeBuildResult, SeriesInfo, Subscription};

/// OHLC candle series fed by a Candle6 buffer.
///
/// Id layout (4 slots from the base): buffer, geometry, draw item, transform.
#[derive(Debug, Clone)]
pub struct CandleRecipeConfig {
    pub pane_id: Id,
    pub layer_id: Id,
    pub name: String,
    /// Create and attach an own transform; off when the session supplies a
    /// shared one.
    pub create_transform: bool,
    pub color_up: [f32; 4],
    pub color_down: [f32; 4],
}

impl Default for CandleRecipeConfig {
    fn default() -> Self {
        Self {
            pane_id: 0,
            layer_id: 0,
            name: String::from("OHLC"),
            create_transform: false,
            color_up: [0.0, 0.8, 0.2, 1.0],
            color_down: [0.9, 0.2, 0.2, 1.0],
        }
    }
}

pub struct CandleRecipe {
    id_base: Id,
    config: CandleRecipeConfig,
}

impl CandleRecipe {
    pub const ID_SLOTS: u32 = 4;

    pub fn new(id_base: Id, config: CandleRecipeConfig) -> Self {
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

impl Recipe for CandleRecipe {
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
                "format": "candle6",
                "vertexCount": 1,
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
                "pipeline": "instancedCandle@1",
                "geometryId": self.geometry_id(),
            })
            .to_string(),
        );
        result.create_commands.push(
            json!({
                "cmd": "setDrawItemStyle",
                "drawItemId": self.draw_item_id(),
                "colorUpR": self.config.color_up[0],
                "colorUpG": self.config.color_up[1],
                "colorUpB": self.config.color_up[2],
                "colorUpA": self.config.color_up[3],
                "colorDownR": self.config.color_down[0],
                "colorDownG": self.config.color_down[1],
                "colorDownB": self.config.color_down[2],
                "colorDownA": self.config.color_down[3],
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
            format: VertexFormat::Candle6,
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
            name: if self.config.name.is_empty() {
                String::from("OHLC")
            } else {
                self.config.name.clone()
            },
            color_hint: self.config.color_up,
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
