use serde_json::json;

use crate::scene::{Candle6, Id};

use super::{Recipe, RecipeBuildResult, SeriesInfo};

/// Volume bars riding on `instancedCandle@1` for automatic up/down coloring.
///
/// Each bar is encoded as a Candle6 record: x = timestamp, low = 0,
/// high = volume, and open/close encode the direction of the underlying
/// candle. No data subscription: the bars are derived from the candle buffer
/// by a compute callback.
///
/// Id layout (4 slots from the base): buffer, geometry, draw item, transform.
#[derive(Debug, Clone)]
pub struct VolumeRecipeConfig {
    pub pane_id: Id,
    pub layer_id: Id,
    pub name: String,
    pub create_transform: bool,
    pub color_up: [f32; 4],
    pub color_down: [f32; 4],
}

impl Default for VolumeRecipeConfig {
    fn default() -> Self {
        Self {
            pane_id: 0,
            layer_id: 0,
            name: String::from("Volume"),
            create_transform: true,
            color_up: [0.0, 0.5, 0.0, 0.6],
            color_down: [0.5, 0.0, 0.0, 0.6],
        }
    }
}

/// Generated volume bars in Candle6 layout.
#[derive(Debug, Clone, Default)]
pub struct VolumeData {
    pub candle6: Vec<Candle6>,
    pub bar_count: u32,
}

impl VolumeData {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.candle6)
    }
}

pub struct VolumeRecipe {
    id_base: Id,
    config: VolumeRecipeConfig,
}

impl VolumeRecipe {
    pub const ID_SLOTS: u32 = 4;

    pub fn new(id_base: Id, config: VolumeRecipeConfig) -> Self {
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

    /// Derive one volume bar per candle. `volumes` carries one value per
    /// candle; extra entries on either side are ignored.
    pub fn compute_volume_bars(
        candles: &[Candle6],
        volumes: &[f32],
        bar_half_width: f32,
    ) -> VolumeData {
        let count = candles.len().min(volumes.len());
        let mut data = VolumeData {
            candle6: Vec::with_capacity(count),
            bar_count: count as u32,
        };
        for (candle, &volume) in candles.iter().zip(volumes) {
            let is_up = candle.close >= candle.open;
            data.candle6.push(Candle6 {
                x: candle.x,
                open: if is_up { 0.0 } else { volume },
                high: volume,
                low: 0.0,
                close: if is_up { volume } else { 0.0 },
                half_width: bar_half_width,
            });
        }
        data
    }
}

impl Recipe for VolumeRecipe {
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

        // No subscription: the buffer is filled by the compute callback.

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
