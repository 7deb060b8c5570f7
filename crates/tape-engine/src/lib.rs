pub mod commands;
pub mod data;
pub mod ingest;
pub mod interact;
pub mod pipelines;
pub mod recipe;
pub mod scene;
pub mod session;
pub mod viewport;

// Re-export key types at crate root for convenience
pub use commands::{CmdCode, CmdError, CmdOutput, CmdResult, CommandHistory, CommandProcessor, UndoableAction};
pub use data::{
    aggregate_candles, AggregationBinding, AggregationManager, AggregationManagerConfig,
    BatchQueue, Batch, BufferGeometryBinding, DataSource, FakeDataSource, FakeDataSourceConfig,
    LiveIngestConfig, LiveIngestLoop, OneShotSource, ResolutionController,
    ResolutionPolicyConfig, ResolutionTier,
};
pub use ingest::{encode_record, IngestProcessor, IngestResult};
pub use interact::{
    Drawing, DrawingInteraction, DrawingMode, DrawingStore, DrawingType, MeasureResult,
    MeasureState, SelectionKey, SelectionMode, SelectionState,
};
pub use pipelines::{DrawMode, PipelineCatalog, PipelineSpec};
pub use recipe::{
    CandleRecipe, CandleRecipeConfig, LineRecipe, LineRecipeConfig, Recipe, RecipeBuildResult,
    SeriesInfo, Subscription, VolumeRecipe, VolumeRecipeConfig,
};
pub use scene::{
    Candle6, Id, IdRegistry, Pos2, ResourceKind, SceneGraph, TransformParams, VertexFormat,
    INVALID_ID,
};
pub use session::{
    deserialize_chart_state, serialize_chart_state, ChartSession, ChartSessionConfig,
    ChartState, FrameResult, LayoutConfig, LayoutManager, LayoutPaneEntry, RecipeHandle,
};
pub use viewport::{AutoScale, DataPicker, DataRange, HitResult, Viewport};
