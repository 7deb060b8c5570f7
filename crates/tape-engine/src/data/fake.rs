use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::ingest::{encode_record, OP_APPEND, OP_UPDATE_RANGE};
use crate::scene::{Candle6, Id, Pos2};

use super::queue::BatchQueue;
use super::source::{Batch, DataSource};

/// Configuration for the synthetic market feed.
#[derive(Debug, Clone)]
pub struct FakeDataSourceConfig {
    /// Target buffer for Candle6 records.
    pub candle_buffer_id: Id,
    /// Optional parallel close-price line buffer (Pos2 records); 0 disables.
    pub line_buffer_id: Id,
    /// Interval between intra-candle ticks.
    pub tick_interval_ms: u64,
    /// Interval between new candles.
    pub candle_interval_ms: u64,
    pub start_price: f32,
    pub volatility: f32,
}

impl Default for FakeDataSourceConfig {
    fn default() -> Self {
        Self {
            candle_buffer_id: 0,
            line_buffer_id: 0,
            tick_interval_ms: 100,
            candle_interval_ms: 2000,
            start_price: 100.0,
            volatility: 0.5,
        }
    }
}

/// Aggregate stats readable from the main thread while the producer runs.
#[derive(Debug, Clone, Copy)]
pub struct FeedStats {
    pub candle_count: u32,
    pub price_min: f32,
    pub price_max: f32,
}

/// Background data source emitting a random-walk candle feed.
///
/// A producer thread appends a fresh candle every candle interval and updates
/// the current candle in place on every tick, pushing wire batches onto a
/// bounded queue. `stop()` signals the thread through an atomic flag and
/// joins it; dropping the source stops it as well.
pub struct FakeDataSource {
    config: FakeDataSourceConfig,
    queue: Arc<BatchQueue<Batch>>,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<FeedStats>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeDataSource {
    pub fn new(config: FakeDataSourceConfig) -> Self {
        Self {
            config,
            queue: Arc::new(BatchQueue::default()),
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(Mutex::new(FeedStats {
                candle_count: 0,
                price_min: f32::INFINITY,
                price_max: f32::NEG_INFINITY,
            })),
            thread: None,
        }
    }

    pub fn stats(&self) -> FeedStats {
        *self.stats.lock().expect("feed stats poisoned")
    }
}

impl DataSource for FakeDataSource {
    fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut producer = Producer {
            config: self.config.clone(),
            queue: Arc::clone(&self.queue),
            running: Arc::clone(&self.running),
            stats: Arc::clone(&self.stats),
            seed: 42,
            price: self.config.start_price,
            open: self.config.start_price,
            high: self.config.start_price,
            low: self.config.start_price,
            close: self.config.start_price,
        };
        self.thread = Some(std::thread::spawn(move || producer.run()));
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn poll(&mut self) -> Option<Batch> {
        self.queue.pop()
    }
}

impl Drop for FakeDataSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer-thread state. Only the queue, the flag and the stats are shared.
struct Producer {
    config: FakeDataSourceConfig,
    queue: Arc<BatchQueue<Batch>>,
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<FeedStats>>,
    seed: u32,
    price: f32,
    open: f32,
    high: f32,
    low: f32,
    close: f32,
}

impl Producer {
    fn run(&mut self) {
        let tick = Duration::from_millis(self.config.tick_interval_ms);
        let candle_every = Duration::from_millis(self.config.candle_interval_ms);
        let mut next_candle = Instant::now() + candle_every;

        // First candle goes out immediately so consumers see data on frame one.
        self.emit_append();

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(tick);
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if Instant::now() >= next_candle {
                self.emit_append();
                next_candle += candle_every;
            } else {
                self.emit_update();
            }
        }
    }

    /// LCG in [0, 1).
    fn rng(&mut self) -> f32 {
        self.seed = self.seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        ((self.seed >> 16) & 0x7FFF) as f32 / 32_767.0
    }

    fn emit_append(&mut self) {
        let change = (self.rng() - 0.5) * self.config.volatility * 2.0;
        self.price += change;
        self.open = self.price;
        self.high = self.price + self.rng() * self.config.volatility * 0.5;
        self.low = self.price - self.rng() * self.config.volatility * 0.5;
        self.close = self.price;

        let index = {
            let mut stats = self.stats.lock().expect("feed stats poisoned");
            let index = stats.candle_count;
            stats.candle_count += 1;
            stats.price_min = stats.price_min.min(self.low);
            stats.price_max = stats.price_max.max(self.high);
            index
        };

        let candle = Candle6 {
            x: index as f32,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            half_width: 0.4,
        };

        let mut batch = Vec::new();
        encode_record(
            &mut batch,
            OP_APPEND,
            self.config.candle_buffer_id as u32,
            0,
            bytemuck::bytes_of(&candle),
        );
        if self.config.line_buffer_id != 0 {
            let point = Pos2 { x: index as f32, y: self.close };
            encode_record(
                &mut batch,
                OP_APPEND,
                self.config.line_buffer_id as u32,
                0,
                bytemuck::bytes_of(&point),
            );
        }
        self.queue.push(batch);
    }

    fn emit_update(&mut self) {
        let tick = (self.rng() - 0.5) * self.config.volatility;
        self.close += tick;
        self.high = self.high.max(self.close);
        self.low = self.low.min(self.close);
        self.price = self.close;

        let index = {
            let mut stats = self.stats.lock().expect("feed stats poisoned");
            let index = stats.candle_count.saturating_sub(1);
            stats.price_min = stats.price_min.min(self.low);
            stats.price_max = stats.price_max.max(self.high);
            index
        };

        let candle = Candle6 {
            x: index as f32,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            half_width: 0.4,
        };

        let mut batch = Vec::new();
        encode_record(
            &mut batch,
            OP_UPDATE_RANGE,
            self.config.candle_buffer_id as u32,
            index * Candle6::STRIDE_BYTES as u32,
            bytemuck::bytes_of(&candle),
        );
        if self.config.line_buffer_id != 0 {
            let point = Pos2 { x: index as f32, y: self.close };
            encode_record(
                &mut batch,
                OP_UPDATE_RANGE,
                self.config.line_buffer_id as u32,
                index * Pos2::STRIDE_BYTES as u32,
                bytemuck::bytes_of(&point),
            );
        }
        self.queue.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestProcessor;

    #[test]
    fn produces_decodable_candle_batches() {
        let mut source = FakeDataSource::new(FakeDataSourceConfig {
            candle_buffer_id: 100,
            line_buffer_id: 200,
            tick_interval_ms: 1,
            candle_interval_ms: 2,
            ..FakeDataSourceConfig::default()
        });
        source.start();
        assert!(source.is_running());

        // Wait until at least one batch is queued.
        let mut batch = None;
        for _ in 0..500 {
            if let Some(b) = source.poll() {
                batch = Some(b);
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        source.stop();

        let batch = batch.expect("producer emitted no batch");
        let mut ingest = IngestProcessor::new();
        let result = ingest.process_batch(&batch);
        assert_eq!(result.dropped_bytes, 0);
        assert!(result.touched_buffer_ids.contains(&100));
        assert_eq!(ingest.size(100) % Candle6::STRIDE_BYTES as u32, 0);
    }

    #[test]
    fn stop_is_idempotent_and_joins() {
        let mut source = FakeDataSource::new(FakeDataSourceConfig {
            candle_buffer_id: 1,
            tick_interval_ms: 1,
            candle_interval_ms: 5,
            ..FakeDataSourceConfig::default()
        });
        source.start();
        source.stop();
        assert!(!source.is_running());
        source.stop(); // second stop is a no-op
        assert!(!source.is_running());
    }

    #[test]
    fn stats_track_emitted_candles() {
        let mut source = FakeDataSource::new(FakeDataSourceConfig {
            candle_buffer_id: 1,
            tick_interval_ms: 1,
            candle_interval_ms: 1,
            ..FakeDataSourceConfig::default()
        });
        source.start();
        for _ in 0..500 {
            if source.stats().candle_count >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        source.stop();
        let stats = source.stats();
        assert!(stats.candle_count >= 2);
        assert!(stats.price_min <= stats.price_max);
    }
}
