//! Image/annotation structure validation
//!
//! Checks that every image of a split decodes as a three-channel image and
//! has a sibling LabelMe annotation whose boxes lie inside the image.

use indicatif::ProgressBar;
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, Result};
use crate::types::{validator_extensions, LabelmeAnnotation, Shape, ANNOTATION_EXTENSION};
use crate::utils::{
    create_progress_bar, decode_image, list_images, read_annotation, sibling_label_path, ImageInfo,
};

/// Outcome of validating one images/labels directory pair.
#[derive(Debug, Default)]
pub struct StructureReport {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub total_images: usize,
    pub valid_images: Vec<PathBuf>,
    pub valid_annotations: Vec<PathBuf>,
    pub class_names: BTreeSet<String>,
    pub errors: Vec<DatasetError>,
}

impl StructureReport {
    /// A split is acceptable when it has at least one valid image, one
    /// valid annotation and one class label.
    pub fn is_acceptable(&self) -> bool {
        !self.valid_images.is_empty()
            && !self.valid_annotations.is_empty()
            && !self.class_names.is_empty()
    }
}

impl fmt::Display for StructureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation Summary:")?;
        writeln!(f, "Total images found: {}", self.total_images)?;
        writeln!(f, "Valid images: {}", self.valid_images.len())?;
        writeln!(f, "Valid annotations: {}", self.valid_annotations.len())?;
        let classes: Vec<&str> = self.class_names.iter().map(String::as_str).collect();
        writeln!(f, "Classes found: {:?}", classes)?;
        if !self.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors found:")?;
            for error in &self.errors {
                writeln!(f, "- {}", error)?;
            }
        }
        Ok(())
    }
}

/// Decode an image and require three colour channels.
pub fn validate_image(path: &Path) -> Result<ImageInfo> {
    let info = decode_image(path)?;
    if info.channels != 3 {
        return Err(DatasetError::decode(
            path,
            format!("image must have 3 channels, found {}", info.channels),
        ));
    }
    Ok(info)
}

/// Check one shape against the image bounds.
///
/// Both points must lie in `[0, width) x [0, height)` and the first point
/// must be strictly above and left of the second.
pub fn check_shape(shape: &Shape, width: u32, height: u32, location: &str) -> Result<()> {
    let [(x1, y1), (x2, y2)] = shape.points;
    let (w, h) = (f64::from(width), f64::from(height));
    let inside = |v: f64, limit: f64| (0.0..limit).contains(&v);

    if !(inside(x1, w) && inside(x2, w) && inside(y1, h) && inside(y2, h)) {
        return Err(DatasetError::bounds(
            location,
            format!(
                "bounding box of '{}' outside image bounds {}x{}",
                shape.label, width, height
            ),
        ));
    }
    if x1 >= x2 || y1 >= y2 {
        return Err(DatasetError::bounds(
            location,
            format!("invalid bounding box coordinates for '{}'", shape.label),
        ));
    }
    Ok(())
}

/// Locate, parse and bounds-check the annotation belonging to an image.
pub fn validate_annotation(annotation_path: &Path, image: &ImageInfo) -> Result<LabelmeAnnotation> {
    if !annotation_path.exists() {
        return Err(DatasetError::missing("Annotation file", annotation_path));
    }
    let annotation = read_annotation(annotation_path)?;
    let location = annotation_path.display().to_string();
    for shape in &annotation.shapes {
        check_shape(shape, image.width, image.height, &location)?;
    }
    Ok(annotation)
}

/// Path of the annotation file paired with `image_path`.
pub fn annotation_path_for(image_path: &Path, labels_dir: &Path) -> PathBuf {
    sibling_label_path(image_path, labels_dir, ANNOTATION_EXTENSION)
}

/// Validate one images/labels directory pair.
///
/// Missing directories or an empty image directory fail the whole split.
/// Every other problem is recorded in the report and the item skipped.
pub fn check_data_structure(
    images_dir: &Path,
    labels_dir: &Path,
    pb: &ProgressBar,
) -> Result<StructureReport> {
    if !images_dir.is_dir() {
        return Err(DatasetError::missing("Images directory", images_dir));
    }
    if !labels_dir.is_dir() {
        return Err(DatasetError::missing("Labels directory", labels_dir));
    }

    let image_files = list_images(images_dir, validator_extensions());
    if image_files.is_empty() {
        return Err(DatasetError::missing("Image files", images_dir));
    }
    info!("Found {} image files", image_files.len());
    pb.set_length(image_files.len() as u64);

    let mut report = StructureReport {
        images_dir: images_dir.to_path_buf(),
        labels_dir: labels_dir.to_path_buf(),
        total_images: image_files.len(),
        ..Default::default()
    };

    for image_path in image_files {
        let annotation_path = annotation_path_for(&image_path, labels_dir);
        let outcome = validate_image(&image_path)
            .and_then(|image| validate_annotation(&annotation_path, &image));
        match outcome {
            Ok(annotation) => {
                report
                    .class_names
                    .extend(annotation.shapes.into_iter().map(|shape| shape.label));
                report.valid_images.push(image_path);
                report.valid_annotations.push(annotation_path);
            }
            Err(e) => {
                warn!("{}", e);
                report.errors.push(e);
            }
        }
        pb.inc(1);
    }

    Ok(report)
}

/// Result of checking a single split.
#[derive(Debug)]
pub struct SplitCheck {
    pub split: String,
    pub outcome: Result<StructureReport>,
}

impl SplitCheck {
    pub fn is_acceptable(&self) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(StructureReport::is_acceptable)
    }
}

/// Run the structure check on `images/<split>` and `labels/<split>` for
/// every split under `data_root`.
pub fn validate_splits(data_root: &Path, splits: &[String]) -> Vec<SplitCheck> {
    splits
        .iter()
        .map(|split| {
            let images_dir = data_root.join("images").join(split);
            let labels_dir = data_root.join("labels").join(split);
            info!("Checking images: {}", images_dir.display());
            info!("Checking labels: {}", labels_dir.display());

            let pb = create_progress_bar(0, split);
            let outcome = check_data_structure(&images_dir, &labels_dir, &pb);
            pb.finish_and_clear();

            SplitCheck {
                split: split.clone(),
                outcome,
            }
        })
        .collect()
}
