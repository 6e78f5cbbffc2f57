//! Integration tests for the benchmark harness.
//!
//! Tests cover:
//! - The single-detector scenario with a scripted FAST detector
//! - State transitions and frame annotation
//! - Fatal errors: missing frames, unsupported detectors
//! - A full run with every built-in detector

mod common;

use common::*;
use kpbench::FrameSource;
use std::sync::Arc;

/// FAST sees 5 keypoints in frame 0 (3 inside the ROI) and 4 in frame 1
/// (none inside)
fn scripted_fast() -> Arc<ScriptedDetector> {
    Arc::new(ScriptedDetector::new(vec![
        (
            0,
            vec![
                kp(540.0, 200.0).with_response(1.0),
                kp(10.0, 10.0),
                kp(600.0, 250.0).with_response(5.0),
                kp(900.0, 400.0),
                kp(700.0, 320.0).with_response(3.0),
            ],
        ),
        (
            1,
            vec![
                kp(0.0, 0.0),
                kp(100.0, 100.0),
                kp(534.0, 200.0),
                kp(600.0, 331.0),
            ],
        ),
    ]))
}

#[test]
fn test_fast_scenario_exports_expected_row() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);
    let config = test_config(dir.path(), 2, &["FAST"]);
    let output = config.output_path.clone();

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let harness = Harness::with_registry(config, registry)?;
    let (matrix, path) = harness.run_and_export()?;

    assert_eq!(path, output);
    assert_eq!(matrix.count(DetectorKind::Fast, 0), Some(3));
    assert_eq!(matrix.count(DetectorKind::Fast, 1), Some(0));

    let table = read_table(&path);
    assert_eq!(table[0], vec!["Detector type", "frame0", "frame1"]);
    assert_eq!(table[1], vec!["FAST", "3", "0"]);
    assert_eq!(table.len(), 2);
    Ok(())
}

#[test]
fn test_state_machine_walks_detectors_then_frames() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);
    let config = test_config(dir.path(), 2, &["FAST", "ORB"]);

    let registry = DetectorRegistry::new()
        .register(DetectorKind::Fast, scripted_fast())
        .register(DetectorKind::Orb, scripted_fast());
    let mut harness = Harness::with_registry(config, registry)?;

    assert_eq!(harness.state(), HarnessState::ForEachDetector { next: 0 });
    let expected = [
        HarnessState::ForEachFrame { detector: 0, frame: 0 },
        HarnessState::ForEachFrame { detector: 0, frame: 1 },
        HarnessState::ForEachDetector { next: 1 },
        HarnessState::ForEachFrame { detector: 1, frame: 0 },
        HarnessState::ForEachFrame { detector: 1, frame: 1 },
        HarnessState::ForEachDetector { next: 2 },
        HarnessState::Done,
        HarnessState::Done,
    ];
    for state in expected {
        assert_eq!(harness.step()?, state);
        assert!(harness.buffer().len() <= harness.buffer().capacity());
    }

    let matrix = harness.matrix();
    assert!(matrix.is_complete());
    assert_eq!(matrix.populated(), 4);
    assert_eq!(matrix.row(1), Some(vec![3, 0]));
    Ok(())
}

#[test]
fn test_buffered_frames_carry_filtered_keypoints() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 3);
    let mut config = test_config(dir.path(), 3, &["FAST"]);
    config.buffer_capacity = 2;

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let mut harness = Harness::with_registry(config, registry)?;

    // Start the detector, then process frame 0
    harness.step()?;
    harness.step()?;
    let newest = harness.buffer().back().unwrap();
    assert_eq!(newest.index, 0);
    assert_eq!(
        newest.keypoints.iter().map(|k| k.position()).collect::<Vec<_>>(),
        vec![(540.0, 200.0), (600.0, 250.0), (700.0, 320.0)]
    );

    harness.step()?;
    harness.step()?;
    let indices: Vec<usize> = harness.buffer().iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(harness.buffer().back().unwrap().file_index, 2);
    Ok(())
}

#[test]
fn test_keypoint_limit_applies_after_counting() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 1);
    let mut config = test_config(dir.path(), 1, &["FAST"]);
    config.max_keypoints = Some(2);

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let mut harness = Harness::with_registry(config, registry)?;
    harness.step()?;
    harness.step()?;

    // Count keeps all three, the annotation only the two strongest
    assert_eq!(harness.matrix().count(DetectorKind::Fast, 0), Some(3));
    let kept: Vec<f32> = harness
        .buffer()
        .back()
        .unwrap()
        .keypoints
        .iter()
        .map(|k| k.response)
        .collect();
    assert_eq!(kept, vec![5.0, 3.0]);
    Ok(())
}

#[test]
fn test_whole_image_counted_without_roi() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);
    let mut config = test_config(dir.path(), 2, &["FAST"]);
    config.focus_on_roi = false;

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let matrix = Harness::with_registry(config, registry)?.run()?;
    assert_eq!(matrix.row(0), Some(vec![5, 4]));
    Ok(())
}

#[test]
fn test_missing_frame_aborts_without_output() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);
    // Three frames requested, two on disk
    let config = test_config(dir.path(), 3, &["FAST"]);
    let output = config.output_path.clone();

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let result = Harness::with_registry(config, registry)?.run_and_export();

    match result {
        Err(BenchError::FrameLoad { path, .. }) => {
            assert!(path.ends_with("frame_0002.png"), "{}", path.display());
        }
        other => panic!("expected FrameLoad, got {:?}", other.map(|(_, p)| p)),
    }
    assert!(!output.exists());
    Ok(())
}

#[test]
fn test_corrupt_frame_is_a_load_error() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 1);
    std::fs::write(dir.path().join("frame_0001.png"), b"not a png")?;
    let config = test_config(dir.path(), 2, &["FAST"]);

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    let result = Harness::with_registry(config, registry)?.run();
    assert!(matches!(result, Err(BenchError::FrameLoad { .. })));
    Ok(())
}

#[test]
fn test_unknown_detector_rejected_before_running() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);

    match Harness::new(test_config(dir.path(), 2, &["FAST", "XYZ"])) {
        Err(BenchError::UnsupportedDetector(name)) => assert_eq!(name, "XYZ"),
        Err(other) => panic!("expected UnsupportedDetector, got {}", other),
        Ok(_) => panic!("harness accepted an unknown detector"),
    }
    Ok(())
}

#[test]
fn test_unregistered_detector_rejected_before_running() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 2);
    let config = test_config(dir.path(), 2, &["FAST", "BRISK"]);

    let registry = DetectorRegistry::new().register(DetectorKind::Fast, scripted_fast());
    match Harness::with_registry(config, registry) {
        Err(BenchError::UnsupportedDetector(name)) => assert_eq!(name, "BRISK"),
        Err(other) => panic!("expected UnsupportedDetector, got {}", other),
        Ok(_) => panic!("harness accepted an unregistered detector"),
    }
    Ok(())
}

#[test]
fn test_full_run_with_builtin_detectors() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_squares_sequence(dir.path(), 2, 160, 120);
    let names: Vec<&str> = DetectorKind::ALL.iter().map(|k| k.name()).collect();
    let mut config = test_config(dir.path(), 2, &names);
    config.roi = RegionOfInterest::new(0, 0, 160, 120);

    let (matrix, path) = Harness::new(config)?.run_and_export()?;
    assert!(matrix.is_complete());
    assert_eq!(matrix.populated(), DetectorKind::ALL.len() * 2);

    // Identical frames give identical counts
    for row in 0..DetectorKind::ALL.len() {
        let counts = matrix.row(row).unwrap();
        assert_eq!(counts[0], counts[1], "{}", DetectorKind::ALL[row]);
    }

    let table = read_table(&path);
    assert_eq!(table.len(), DetectorKind::ALL.len() + 1);
    let names_in_table: Vec<&str> = table[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(names_in_table, names);
    Ok(())
}

#[test]
fn test_frame_source_paths_and_restart() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    write_uniform_sequence(dir.path(), 3);
    let source = FrameSource::new(dir.path(), "frame_", ".png", 4, 1..=2);

    assert_eq!(source.len(), 2);
    assert_eq!(source.path_for(7), dir.path().join("frame_0007.png"));

    for _ in 0..2 {
        let frames: Vec<Frame> = source.frames().collect::<Result<_, _>>()?;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].index, 0);
        assert_eq!(frames[0].file_index, 1);
        assert_eq!(frames[1].file_index, 2);
        // Frames are filled with their file index
        assert_eq!(frames[1].image.get_pixel(0, 0)[0], 2);
        assert!(frames[1].keypoints.is_empty());
    }
    Ok(())
}
