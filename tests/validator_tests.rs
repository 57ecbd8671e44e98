mod common;

use std::collections::BTreeSet;
use std::fs;

use common::{split_dirs, write_gray, write_labelme, write_rgb};
use detset::structure::check_data_structure;
use detset::{validate_csv, validate_splits, DatasetError, ValidatorConfig};
use indicatif::ProgressBar;

#[test]
fn test_structure_check_reports_each_bad_item() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = split_dirs(dir.path(), "train");

    write_rgb(&images.join("good.jpg"), 100, 80);
    write_labelme(
        &labels.join("good.json"),
        &[("dead", [[10.0, 10.0], [50.0, 60.0]]), ("alive", [[0.0, 0.0], [99.0, 79.0]])],
    );
    write_rgb(&images.join("no_label.png"), 100, 80);
    write_gray(&images.join("gray.png"), 100, 80);
    write_labelme(&labels.join("gray.json"), &[("dead", [[1.0, 1.0], [2.0, 2.0]])]);
    write_rgb(&images.join("outside.png"), 100, 80);
    write_labelme(&labels.join("outside.json"), &[("dead", [[10.0, 10.0], [100.0, 20.0]])]);
    write_rgb(&images.join("schema.png"), 100, 80);
    fs::write(labels.join("schema.json"), r#"{"version": "5.2.1", "imagePath": "schema.png"}"#).unwrap();

    let report = check_data_structure(&images, &labels, &ProgressBar::hidden()).unwrap();

    assert_eq!(report.total_images, 5);
    assert_eq!(report.valid_images, vec![images.join("good.jpg")]);
    assert_eq!(report.valid_annotations, vec![labels.join("good.json")]);
    assert_eq!(
        report.class_names,
        BTreeSet::from(["alive".to_string(), "dead".to_string()])
    );
    let kinds: Vec<&str> = report.errors.iter().map(DatasetError::kind).collect();
    assert_eq!(kinds, vec!["decode", "missing-path", "bounds", "schema"]);
    assert!(report.is_acceptable());

    let text = report.to_string();
    assert!(text.contains("Total images found: 5"));
    assert!(text.contains(r#"Classes found: ["alive", "dead"]"#));
    assert!(text.contains("Errors found:"));
}

#[test]
fn test_split_with_only_invalid_items_is_not_acceptable() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = split_dirs(dir.path(), "val");
    write_rgb(&images.join("a.png"), 10, 10);
    write_labelme(&labels.join("a.json"), &[("dead", [[5.0, 5.0], [2.0, 8.0]])]);

    let report = check_data_structure(&images, &labels, &ProgressBar::hidden()).unwrap();
    assert!(!report.is_acceptable());
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_annotation_without_shapes_has_no_classes() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = split_dirs(dir.path(), "val");
    write_rgb(&images.join("a.png"), 10, 10);
    write_labelme(&labels.join("a.json"), &[]);

    let report = check_data_structure(&images, &labels, &ProgressBar::hidden()).unwrap();
    assert_eq!(report.valid_annotations.len(), 1);
    assert!(!report.is_acceptable());
}

#[test]
fn test_missing_directories_fail_the_split() {
    let dir = tempfile::tempdir().unwrap();
    let (images, _) = split_dirs(dir.path(), "train");
    write_rgb(&images.join("a.png"), 10, 10);
    fs::create_dir_all(dir.path().join("images/empty")).unwrap();
    fs::create_dir_all(dir.path().join("labels/empty")).unwrap();

    let splits: Vec<String> = ["train", "test", "empty"].iter().map(|s| s.to_string()).collect();
    fs::remove_dir_all(dir.path().join("labels/train")).unwrap();
    let checks = validate_splits(dir.path(), &splits);

    assert_eq!(checks.len(), 3);
    for check in &checks {
        assert!(!check.is_acceptable());
        assert!(matches!(check.outcome, Err(DatasetError::MissingPath { .. })));
    }
}

#[test]
fn test_csv_validator_counts_rows_by_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("a.png");
    write_rgb(&image, 10, 10);
    let img = image.display().to_string();
    let csv_path = dir.path().join("annotations_train.csv");
    let rows = [
        format!("{},1,2,30,40,dead", img),
        format!("{}, 0 ,0,5,5,alive", img),
        format!("{},1,2,30,40", img),
        format!("{}/missing.png,1,2,30,40,dead", dir.path().display()),
        format!("{},1,2,3.5,40,dead", img),
        format!("{},30,2,1,40,dead", img),
        format!("{},1,2,30,40,zombie", img),
        format!("{},1,2,30,40,dead,extra", img),
    ];
    fs::write(&csv_path, rows.join("\n") + "\n").unwrap();

    let report = validate_csv(&csv_path, &ValidatorConfig::default().valid_classes).unwrap();

    assert_eq!(report.total_rows, 8);
    assert_eq!(report.valid_rows, 2);
    assert_eq!(report.invalid_rows(), 6);
    let kinds: Vec<&str> = report.errors.iter().map(DatasetError::kind).collect();
    assert_eq!(kinds, vec!["schema", "missing-path", "parse", "bounds", "class", "schema"]);
    assert!(report.errors[0].to_string().starts_with("Row 3:"));
    assert!(report.errors[1].to_string().starts_with("Row 4:"));
}

#[test]
fn test_csv_validator_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = validate_csv(
        &dir.path().join("annotations_val.csv"),
        &ValidatorConfig::default().valid_classes,
    )
    .unwrap_err();
    assert!(matches!(err, DatasetError::MissingPath { .. }));
}
