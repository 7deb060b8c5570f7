pub mod chart_session;
pub mod chart_state;
pub mod layout;

pub use chart_session::{
    ChartSession, ChartSessionConfig, ComputeCallback, FrameResult, RecipeHandle,
    RetentionPolicy, SmartRetentionConfig,
};
pub use chart_state::{
    deserialize_chart_state, serialize_chart_state, ChartState, ViewportState,
};
pub use layout::{compute_pane_layout, LayoutConfig, LayoutManager, LayoutPaneEntry};
