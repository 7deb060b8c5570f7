//! Headless demo: a full chart session driven by the fake market feed.
//!
//! Builds a two-pane chart (price + volume) through the JSON command
//! protocol, mounts candle, close-line and volume recipes, then runs a fixed
//! number of frames against the background data source, logging what each
//! frame did. No GPU — the point is to exercise the whole core path end to
//! end.

use std::time::Duration;

use tape_engine::{
    Candle6, ChartSession, ChartSessionConfig, CommandProcessor, DataSource, FakeDataSource,
    FakeDataSourceConfig, IngestProcessor, LayoutManager, LayoutPaneEntry, Viewport,
};
use tape_engine::recipe::{
    CandleRecipe, CandleRecipeConfig, LineRecipe, LineRecipeConfig, VolumeRecipe,
    VolumeRecipeConfig,
};

const PRICE_PANE: u64 = 1;
const VOLUME_PANE: u64 = 2;
const PRICE_LAYER: u64 = 10;
const OVERLAY_LAYER: u64 = 11;
const VOLUME_LAYER: u64 = 20;
const PRICE_TRANSFORM: u64 = 50;
const VOLUME_TRANSFORM: u64 = 51;

const CANDLE_BASE: u64 = 100;
const LINE_BASE: u64 = 200;
const VOLUME_BASE: u64 = 300;

fn main() {
    env_logger::init();

    let mut cp = CommandProcessor::new();
    for cmd in [
        r#"{"cmd":"hello"}"#,
        r#"{"cmd":"createPane","id":1,"name":"price"}"#,
        r#"{"cmd":"createPane","id":2,"name":"volume"}"#,
        r#"{"cmd":"createLayer","id":10,"paneId":1,"name":"series"}"#,
        r#"{"cmd":"createLayer","id":11,"paneId":1,"name":"overlays"}"#,
        r#"{"cmd":"createLayer","id":20,"paneId":2,"name":"bars"}"#,
        r#"{"cmd":"createTransform","id":50}"#,
        r#"{"cmd":"createTransform","id":51}"#,
        r#"{"cmd":"setPaneClearColor","id":1,"r":0.05,"g":0.05,"b":0.08,"a":1.0}"#,
    ] {
        if let Err(err) = cp.apply_json_text(cmd) {
            eprintln!("scaffolding failed: {err}");
            std::process::exit(1);
        }
    }

    // Price pane on top (3/4), volume pane below.
    let mut layout = LayoutManager::new();
    layout.set_panes(vec![
        LayoutPaneEntry { pane_id: PRICE_PANE, fraction: 3.0 },
        LayoutPaneEntry { pane_id: VOLUME_PANE, fraction: 1.0 },
    ]);
    layout.apply_layout(&mut cp);

    let mut session = ChartSession::new(cp, IngestProcessor::new());
    session.set_config(ChartSessionConfig {
        enable_aggregation: true,
        ..ChartSessionConfig::default()
    });

    let mut price_vp = Viewport::new();
    price_vp.set_pixel_viewport(1280.0, 540.0);
    price_vp.set_data_range(0.0, 60.0, 90.0, 110.0);
    let mut volume_vp = Viewport::new();
    volume_vp.set_pixel_viewport(1280.0, 180.0);
    volume_vp.set_data_range(0.0, 60.0, 0.0, 1500.0);

    let price_region = session.scene().pane(PRICE_PANE).unwrap().region;
    let volume_region = session.scene().pane(VOLUME_PANE).unwrap().region;
    price_vp.set_clip_region(price_region);
    volume_vp.set_clip_region(volume_region);

    session.add_pane_viewport(PRICE_PANE, price_vp, PRICE_TRANSFORM);
    session.add_pane_viewport(VOLUME_PANE, volume_vp, VOLUME_TRANSFORM);
    session.set_link_x_axis(true);

    session
        .mount(
            Box::new(CandleRecipe::new(
                CANDLE_BASE,
                CandleRecipeConfig {
                    pane_id: PRICE_PANE,
                    layer_id: PRICE_LAYER,
                    name: String::from("OHLC"),
                    ..CandleRecipeConfig::default()
                },
            )),
            PRICE_TRANSFORM,
        )
        .expect("mount candle recipe");
    session
        .mount(
            Box::new(LineRecipe::new(
                LINE_BASE,
                LineRecipeConfig {
                    pane_id: PRICE_PANE,
                    layer_id: OVERLAY_LAYER,
                    name: String::from("close"),
                    ..LineRecipeConfig::default()
                },
            )),
            PRICE_TRANSFORM,
        )
        .expect("mount line recipe");
    let volume = session
        .mount(
            Box::new(VolumeRecipe::new(
                VOLUME_BASE,
                VolumeRecipeConfig {
                    pane_id: VOLUME_PANE,
                    layer_id: VOLUME_LAYER,
                    create_transform: false,
                    ..VolumeRecipeConfig::default()
                },
            )),
            VOLUME_TRANSFORM,
        )
        .expect("mount volume recipe");

    // Volume bars are derived from the candle buffer each time it changes.
    session.add_compute_dependency(volume, CANDLE_BASE);
    session.set_compute_callback(
        volume,
        Box::new(|ingest, cp| {
            let raw: Vec<Candle6> = ingest
                .data(CANDLE_BASE)
                .chunks_exact(Candle6::STRIDE_BYTES)
                .map(bytemuck::pod_read_unaligned)
                .collect();
            // Synthesise volume from the candle span until a real feed
            // carries it.
            let volumes: Vec<f32> = raw
                .iter()
                .map(|c| 200.0 + (c.high - c.low).abs() * 800.0)
                .collect();
            let bars = VolumeRecipe::compute_volume_bars(&raw, &volumes, 0.3);
            ingest.set_buffer_data(VOLUME_BASE, bars.as_bytes());
            let _ = cp.apply_json_text(&format!(
                r#"{{"cmd":"setGeometryVertexCount","geometryId":{},"vertexCount":{}}}"#,
                VOLUME_BASE + 1,
                bars.bar_count.max(1)
            ));
            vec![VOLUME_BASE]
        }),
    );

    let mut source = FakeDataSource::new(FakeDataSourceConfig {
        candle_buffer_id: CANDLE_BASE,
        line_buffer_id: LINE_BASE,
        tick_interval_ms: 20,
        candle_interval_ms: 120,
        start_price: 100.0,
        volatility: 0.5,
    });
    source.start();

    for frame in 0..60u32 {
        session
            .commands_mut()
            .apply_json_text(r#"{"cmd":"beginFrame"}"#)
            .expect("beginFrame");

        let result = session.update(&mut source);
        session.sync_buffer_lengths();

        session
            .commands_mut()
            .apply_json_text(r#"{"cmd":"commitFrame"}"#)
            .expect("commitFrame");

        if result.data_changed || result.resolution_changed {
            log::info!(
                "frame {frame}: touched {:?} data={} viewport={} resolution={} tier={:?}",
                result.touched_buffer_ids,
                result.data_changed,
                result.viewport_changed,
                result.resolution_changed,
                session.current_tier(),
            );
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    source.stop();

    println!("{}", session.commands().list_resources_json());
    println!(
        "candles ingested: {} ({} bytes), geometry vertex count {}",
        session.ingest().size(CANDLE_BASE) / Candle6::STRIDE_BYTES as u32,
        session.ingest().size(CANDLE_BASE),
        session
            .scene()
            .geometry(CANDLE_BASE + 1)
            .map_or(0, |g| g.vertex_count),
    );

    session.unmount_all();
    println!("after unmount: {}", session.commands().list_resources_json());
}
