//! end-to-end flows: raw fixes through map matching, segmentation, and
//! per-segment compression.

use std::io::Write;
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use uom::si::f64::Length;
use uom::si::length::meter;

use semtraj_core::algorithm::compression::SquishCompressor;
use semtraj_core::algorithm::map_matching::{MatcherConfig, OnlineMapMatcher};
use semtraj_core::algorithm::segmentation::{StepConfig, StepSegmenter};
use semtraj_core::io::CsvFixSource;
use semtraj_core::metrics::{calculate_sed_stats, compression_ratio};
use semtraj_core::model::fix::Fix;
use semtraj_core::model::network::{EdgeSpec, Graph, Vertex};
use semtraj_core::pipeline::{Pipeline, PipelineEvent};

fn init_test_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

fn fix_at(lat: f64, lon: f64, minute: i64) -> Fix {
    let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + TimeDelta::minutes(minute);
    Fix::new(lat, lon, t, "veh-1")
}

/// a straight south-to-north road along lon 0 from lat 0 to 0.01, split
/// into four named edges of ~278 m each
fn linear_road() -> Arc<Graph> {
    let vertices = vec![
        Vertex::new(0, 0.0, 0.0),
        Vertex::new(1, 0.0, 0.0025),
        Vertex::new(2, 0.0, 0.005),
        Vertex::new(3, 0.0, 0.0075),
        Vertex::new(4, 0.0, 0.01),
    ];
    let edges = vec![
        EdgeSpec::new(0, 1).with_road_id("road_A"),
        EdgeSpec::new(1, 2).with_road_id("road_B"),
        EdgeSpec::new(2, 3).with_road_id("road_C"),
        EdgeSpec::new(3, 4).with_road_id("road_D"),
    ];
    Arc::new(Graph::new(vertices, edges).unwrap())
}

fn step_config() -> StepConfig {
    StepConfig::new(Length::new::<meter>(50.0), TimeDelta::seconds(120))
}

/// dwell near the south end, drive north at ~167 m/min, dwell near the
/// north end. all fixes sit ~1 m east of the road.
fn three_phase_drive() -> Vec<Fix> {
    let mut fixes = Vec::new();
    for minute in 0..6 {
        fixes.push(fix_at(0.0004, 0.00001, minute));
    }
    for (step, minute) in (6..11).enumerate() {
        let lat = 0.002 + 0.0015 * step as f64;
        fixes.push(fix_at(lat, 0.00001, minute as i64));
    }
    for minute in 11..17 {
        fixes.push(fix_at(0.0096, 0.00001, minute));
    }
    fixes
}

#[test]
fn test_matched_pipeline_emits_stop_semantic_move_stop() {
    init_test_logger();

    let matcher_config = MatcherConfig {
        window_size: 3,
        ..Default::default()
    };
    let matcher = OnlineMapMatcher::new(linear_road(), matcher_config).unwrap();
    let segmenter = StepSegmenter::new(step_config()).unwrap();
    let mut pipeline = Pipeline::with_map_matching(matcher, segmenter);

    let mut events = Vec::new();
    for fix in three_phase_drive() {
        events.extend(pipeline.process_fix(fix).unwrap());
    }
    events.extend(pipeline.flush().unwrap());

    assert_eq!(events.len(), 3, "expected stop, move, stop: {:?}", events);
    let (first, travel, second) = match (&events[0], &events[1], &events[2]) {
        (
            PipelineEvent::Stop(first),
            PipelineEvent::SemanticMove(travel),
            PipelineEvent::Stop(second),
        ) => (first, travel, second),
        other => panic!("unexpected event sequence: {:?}", other),
    };

    // stops snap onto the road line and keep their dwell latitudes
    assert!((first.centroid.lat - 0.0004).abs() < 1e-4);
    assert!(first.centroid.lon.abs() < 1e-6);
    assert!((second.centroid.lat - 0.0096).abs() < 1e-4);
    assert!(first.end_time <= second.start_time);

    // the semantic move keeps only road-transition anchors: consecutive
    // road ids are pairwise distinct except possibly the appended
    // destination
    assert!(!travel.is_empty());
    assert!(travel.iter().all(|f| f.road_id.is_some()));
    for pair in travel.windows(2).take(travel.len().saturating_sub(2)) {
        assert_ne!(pair[0].road_id, pair[1].road_id);
    }
    // every travel fix was snapped onto the lon=0 road line
    assert!(travel.iter().all(|f| f.lon.abs() < 1e-9));
}

#[test]
fn test_matcher_latency_one_in_one_out() {
    init_test_logger();

    let config = MatcherConfig {
        window_size: 5,
        ..Default::default()
    };
    let mut matcher = OnlineMapMatcher::new(linear_road(), config).unwrap();

    let fixes = three_phase_drive();
    let mut emitted = 0;
    for (i, fix) in fixes.iter().enumerate() {
        let out = matcher.process_fix(fix.clone());
        if i < 4 {
            assert!(out.is_none(), "no output expected while window fills");
        } else {
            assert!(out.is_some(), "one output expected per fix once full");
            emitted += 1;
        }
    }
    assert_eq!(emitted, fixes.len() - 4);

    let flushed = matcher.flush();
    assert_eq!(flushed.len(), 4);
    assert_eq!(emitted + flushed.len(), fixes.len());
}

#[test]
fn test_unmatched_pipeline_from_csv() {
    init_test_logger();

    let mut csv = String::from("lat,lon,timestamp\n");
    for fix in three_phase_drive() {
        csv.push_str(&format!(
            "{},{},{}\n",
            fix.lat,
            fix.lon,
            fix.timestamp.to_rfc3339()
        ));
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(csv.as_bytes()).unwrap();
    file.flush().unwrap();

    let segmenter = StepSegmenter::new(step_config()).unwrap();
    let squish = SquishCompressor::new(3).unwrap();
    let mut pipeline = Pipeline::new(segmenter, squish);

    let mut events = Vec::new();
    for fix in CsvFixSource::from_path(file.path()).unwrap() {
        events.extend(pipeline.process_fix(fix.unwrap()).unwrap());
    }
    events.extend(pipeline.flush().unwrap());

    assert_eq!(events.len(), 3);
    match (&events[0], &events[1], &events[2]) {
        (PipelineEvent::Stop(first), PipelineEvent::Move(travel), PipelineEvent::Stop(second)) => {
            assert!((first.centroid.lat - 0.0004).abs() < 1e-4);
            assert!((second.centroid.lat - 0.0096).abs() < 1e-4);
            assert!(travel.len() <= 3);
            assert!(!travel.is_empty());
        }
        other => panic!("unexpected event sequence: {:?}", other),
    }
}

#[test]
fn test_squish_quality_against_sed_oracle() {
    init_test_logger();

    // a gently curving path: compression under a generous budget should
    // keep the worst-case SED error well below the path's total extent
    let original: Vec<Fix> = (0..60)
        .map(|i| {
            let t = i as f64 / 59.0;
            fix_at(0.01 * t, 0.002 * (t * 6.0).sin(), i)
        })
        .collect();

    let squish = SquishCompressor::new(20).unwrap();
    let compressed = squish.compress(&original);

    assert!(compressed.len() <= 20);
    assert_eq!(compressed.first(), original.first());
    assert_eq!(compressed.last(), original.last());

    let ratio = compression_ratio(&original, &compressed);
    assert!(ratio >= 3.0);

    let stats = calculate_sed_stats(&original, &compressed);
    assert!(stats.max < 200.0, "max SED error too high: {:?}", stats.max);
    assert!(stats.average <= stats.max);
    assert!(stats.rmse <= stats.max);
}
