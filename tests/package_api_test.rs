//! Integration tests for the packaging public API.

use std::fs;

use tempfile::TempDir;

use reprise::engine::Engine;
use reprise::input::TraceInput;
use reprise::package::{ExportOptions, PackageKind};
use reprise::step::Step;

fn engine_in(temp: &TempDir) -> Engine<TraceInput> {
    Engine::open(temp.path(), TraceInput::new()).unwrap()
}

#[test]
fn export_import_round_trip_carries_images() {
    let source = TempDir::new().unwrap();
    let assets = source.path().join("assets");
    fs::create_dir_all(&assets).unwrap();
    let button = assets.join("ok-button.png");
    fs::write(&button, b"png-bytes").unwrap();

    // 1. Record a component that clicks by reference image
    let mut exporter = engine_in(&source);
    exporter
        .save_component(
            "press-ok",
            vec![
                Step::ClickByImage(button.clone()),
                Step::EnterText("done".into()),
            ],
        )
        .unwrap();

    // 2. Export it
    let archive = source.path().join("press-ok.zip");
    exporter
        .export_package(
            PackageKind::Component,
            "press-ok",
            &ExportOptions::default(),
            &archive,
        )
        .unwrap();

    // 3. Import into a fresh data dir
    let target = TempDir::new().unwrap();
    let mut importer = engine_in(&target);
    let report = importer
        .import_package(&archive, PackageKind::Component, None)
        .unwrap();

    assert_eq!(report.name, "press-ok");
    assert_eq!(report.images_imported, 1);

    // 4. The image landed in the target image store and the step now
    //    points at it
    let local = target.path().join("images").join("ok-button.png");
    assert_eq!(fs::read(&local).unwrap(), b"png-bytes");
    let steps = importer.components().get("press-ok").unwrap();
    assert_eq!(steps[0], Step::ClickByImage(local));
    assert_eq!(steps[1], Step::EnterText("done".into()));
}

#[test]
fn archive_bytes_round_trip_in_memory() {
    let source = TempDir::new().unwrap();
    let mut exporter = engine_in(&source);
    exporter
        .save_assembly(
            "weekly",
            vec![
                Step::LoopStartByData("3".into()),
                Step::InvokeComponent("fill".into()),
                Step::LoopEnd,
            ],
        )
        .unwrap();

    let opts = ExportOptions {
        author: "ada".into(),
        description: "weekly report run".into(),
        price: 40,
    };
    let bytes = exporter
        .export_package_bytes(PackageKind::Assembly, "weekly", &opts)
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut importer = engine_in(&target);
    let report = importer
        .import_package_bytes(&bytes, PackageKind::Assembly, None)
        .unwrap();

    assert_eq!(report.name, "weekly");
    assert_eq!(report.kind, PackageKind::Assembly);
    assert_eq!(report.meta.author, "ada");
    assert_eq!(report.meta.price, 40);
    assert_eq!(report.steps.len(), 3);
    assert!(importer.assemblies().contains("weekly"));
}

#[test]
fn name_collisions_get_numeric_suffixes() {
    let source = TempDir::new().unwrap();
    let mut exporter = engine_in(&source);
    exporter
        .save_component("fill", vec![Step::Copy])
        .unwrap();
    let bytes = exporter
        .export_package_bytes(PackageKind::Component, "fill", &ExportOptions::default())
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut importer = engine_in(&target);
    importer
        .save_component("fill", vec![Step::Paste])
        .unwrap();

    let first = importer
        .import_package_bytes(&bytes, PackageKind::Component, None)
        .unwrap();
    let second = importer
        .import_package_bytes(&bytes, PackageKind::Component, None)
        .unwrap();

    assert_eq!(first.name, "fill_1");
    assert_eq!(second.name, "fill_2");
    // The original entry is untouched
    assert_eq!(
        importer.components().get("fill"),
        Some(&[Step::Paste][..])
    );
}

#[test]
fn rename_overrides_the_packaged_name() {
    let source = TempDir::new().unwrap();
    let mut exporter = engine_in(&source);
    exporter.save_component("fill", vec![Step::Copy]).unwrap();
    let bytes = exporter
        .export_package_bytes(PackageKind::Component, "fill", &ExportOptions::default())
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut importer = engine_in(&target);
    let report = importer
        .import_package_bytes(&bytes, PackageKind::Component, Some("fresh-fill"))
        .unwrap();

    assert_eq!(report.name, "fresh-fill");
    assert!(importer.components().contains("fresh-fill"));
    assert!(!importer.components().contains("fill"));
}

#[test]
fn the_callers_kind_wins_over_the_packaged_one() {
    let source = TempDir::new().unwrap();
    let mut exporter = engine_in(&source);
    exporter.save_component("fill", vec![Step::Copy]).unwrap();
    let bytes = exporter
        .export_package_bytes(PackageKind::Component, "fill", &ExportOptions::default())
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut importer = engine_in(&target);
    let report = importer
        .import_package_bytes(&bytes, PackageKind::Assembly, None)
        .unwrap();

    assert_eq!(report.kind, PackageKind::Assembly);
    assert!(importer.assemblies().contains("fill"));
    assert!(!importer.components().contains("fill"));
}

#[test]
fn corrupt_archive_is_rejected_and_the_store_untouched() {
    let temp = TempDir::new().unwrap();
    let bogus = temp.path().join("bogus.zip");
    fs::write(&bogus, b"this is not a zip").unwrap();

    let mut importer = engine_in(&temp);
    let result = importer.import_package(&bogus, PackageKind::Component, None);

    assert!(result.is_err());
    assert!(importer.components().is_empty());
}

#[test]
fn export_fails_cleanly_when_a_referenced_image_is_gone() {
    let temp = TempDir::new().unwrap();
    let mut exporter = engine_in(&temp);
    exporter
        .save_component(
            "press-ok",
            vec![Step::ClickByImage(temp.path().join("vanished.png"))],
        )
        .unwrap();

    let archive = temp.path().join("press-ok.zip");
    let result = exporter.export_package(
        PackageKind::Component,
        "press-ok",
        &ExportOptions::default(),
        &archive,
    );

    assert!(result.is_err());
    assert!(!archive.exists());
}
