// data/mod.rs
//
// The streaming side of the engine: sources and their queue, the candle
// aggregator, resolution tiering, and the per-frame ingest loop.

pub mod aggregation;
pub mod aggregator;
pub mod fake;
pub mod live_loop;
pub mod queue;
pub mod resolution;
pub mod source;

pub use aggregation::{AggregationBinding, AggregationManager, AggregationManagerConfig};
pub use aggregator::{aggregate_candles, AggregateResult};
pub use fake::{FakeDataSource, FakeDataSourceConfig, FeedStats};
pub use live_loop::{BufferGeometryBinding, LiveIngestConfig, LiveIngestLoop};
pub use queue::BatchQueue;
pub use resolution::{
    ResolutionController, ResolutionPolicyConfig, ResolutionTier, TierThreshold,
};
pub use source::{Batch, DataSource, OneShotSource};
