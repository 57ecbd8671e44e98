#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Create `data/images/<split>` and `data/labels/<split>` under `root`.
pub fn split_dirs(root: &Path, split: &str) -> (PathBuf, PathBuf) {
    let images = root.join("images").join(split);
    let labels = root.join("labels").join(split);
    fs::create_dir_all(&images).unwrap();
    fs::create_dir_all(&labels).unwrap();
    (images, labels)
}

pub fn write_rgb(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}

pub fn write_gray(path: &Path, width: u32, height: u32) {
    image::GrayImage::new(width, height).save(path).unwrap();
}

pub fn write_labelme(path: &Path, shapes: &[(&str, [[f64; 2]; 2])]) {
    let shapes: Vec<_> = shapes
        .iter()
        .map(|(label, points)| {
            serde_json::json!({
                "label": label,
                "points": points,
                "group_id": null,
                "shape_type": "rectangle",
                "flags": {}
            })
        })
        .collect();
    let annotation = serde_json::json!({
        "version": "5.2.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": path.file_name().unwrap().to_string_lossy(),
        "imageData": null
    });
    fs::write(path, serde_json::to_string_pretty(&annotation).unwrap()).unwrap();
}
