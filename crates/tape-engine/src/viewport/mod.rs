pub mod auto_scale;
pub mod picker;
pub mod viewport;

pub use auto_scale::{AutoScale, AutoScaleConfig};
pub use picker::{DataPicker, HitResult, PickConfig};
pub use viewport::{DataRange, Viewport};
