// recipe/mod.rs
//
// Recipes are composable bundles of create/dispose commands plus data
// subscriptions. A recipe reserves a fixed, contiguous block of ids from a
// caller-supplied base so its dispose commands always reference the same
// resources its create commands made.

pub mod candle;
pub mod line;
pub mod volume;

use crate::scene::{Id, VertexFormat};

pub use candle::{CandleRecipe, CandleRecipeConfig};
pub use line::{LineRecipe, LineRecipeConfig};
pub use volume::{VolumeData, VolumeRecipe, VolumeRecipeConfig};

/// Declares that the live ingest loop should track a buffer: whenever the
/// buffer is touched, the geometry's vertex count is refreshed.
#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    pub buffer_id: Id,
    pub geometry_id: Id,
    pub format: VertexFormat,
}

/// Presentation metadata for one series a recipe contributes (legend entries,
/// visibility toggles).
#[derive(Debug, Clone)]
pub struct SeriesInfo {
    pub name: String,
    pub color_hint: [f32; 4],
    pub default_visible: bool,
    pub draw_item_ids: Vec<Id>,
}

/// Everything a session needs to mount a recipe.
#[derive(Debug, Clone, Default)]
pub struct RecipeBuildResult {
    /// JSON commands creating the recipe's resources, in apply order.
    pub create_commands: Vec<String>,
    /// JSON commands tearing them down, in apply order (reverse of create).
    pub dispose_commands: Vec<String>,
    pub subscriptions: Vec<Subscription>,
}

/// A mountable chart component.
pub trait Recipe {
    /// Produce the command bundle. Must be deterministic for a given recipe.
    fn build(&self) -> RecipeBuildResult;

    /// Draw items the session attaches the shared transform to.
    fn draw_item_ids(&self) -> Vec<Id>;

    fn series_info_list(&self) -> Vec<SeriesInfo> {
        Vec::new()
    }

    /// First id of the recipe's contiguous id block.
    fn id_base(&self) -> Id;

    /// Number of id slots the recipe reserves from its base.
    fn id_slots(&self) -> u32;
}
