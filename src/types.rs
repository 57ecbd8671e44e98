use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::{DatasetError, Result};

// Image formats accepted by the structure validator
pub const VALIDATOR_IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png"];

// Image formats picked up by the YOLO converter
pub const CONVERTER_IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

pub const ANNOTATION_EXTENSION: &str = "json";
pub const YOLO_LABEL_EXTENSION: &str = "txt";

static VALIDATOR_EXTENSIONS_SET: OnceLock<HashSet<String>> = OnceLock::new();
static CONVERTER_EXTENSIONS_SET: OnceLock<HashSet<String>> = OnceLock::new();

/// Lower-cased extension set used by the structure validator
pub fn validator_extensions() -> &'static HashSet<String> {
    VALIDATOR_EXTENSIONS_SET
        .get_or_init(|| VALIDATOR_IMG_FORMATS.iter().map(|ext| ext.to_lowercase()).collect())
}

/// Lower-cased extension set used by the converter
pub fn converter_extensions() -> &'static HashSet<String> {
    CONVERTER_EXTENSIONS_SET
        .get_or_init(|| CONVERTER_IMG_FORMATS.iter().map(|ext| ext.to_lowercase()).collect())
}

// Shape as written by the annotation tool, before required fields are checked
#[derive(Debug, Deserialize)]
struct RawShape {
    label: Option<String>,
    points: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct RawAnnotation {
    shapes: Option<Vec<RawShape>>,
}

/// A labelled axis-aligned box given by two corner points.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub label: String,
    pub points: [(f64, f64); 2],
}

/// The shape list of one LabelMe annotation file.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelmeAnnotation {
    pub shapes: Vec<Shape>,
}

impl LabelmeAnnotation {
    /// Parse annotation JSON, failing with a schema error on the first
    /// missing `shapes`, `points` or `label` field or a non two-point shape.
    pub fn from_json_str(content: &str, location: &str) -> Result<Self> {
        let raw: RawAnnotation = serde_json::from_str(content)
            .map_err(|e| DatasetError::schema(location, format!("invalid JSON: {}", e)))?;
        let raw_shapes = raw
            .shapes
            .ok_or_else(|| DatasetError::schema(location, "annotation missing 'shapes' field"))?;

        let mut shapes = Vec::with_capacity(raw_shapes.len());
        for (index, raw) in raw_shapes.into_iter().enumerate() {
            let points = raw.points.ok_or_else(|| {
                DatasetError::schema(location, format!("shape {} missing 'points' field", index))
            })?;
            let label = raw.label.ok_or_else(|| {
                DatasetError::schema(location, format!("shape {} missing 'label' field", index))
            })?;
            let points = match points.as_slice() {
                [p1, p2] if p1.len() == 2 && p2.len() == 2 => [(p1[0], p1[1]), (p2[0], p2[1])],
                _ => {
                    return Err(DatasetError::schema(
                        location,
                        format!("shape {} must have exactly two [x, y] points", index),
                    ))
                }
            };
            shapes.push(Shape { label, points });
        }

        Ok(Self { shapes })
    }
}

/// One `class cx cy w h` line of a YOLO label file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloRecord {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// Inclusive pixel box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

/// One row of a RetinaNet-style annotation CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub image_path: PathBuf,
    pub bbox: PixelBox,
    pub class_name: String,
}

impl FlatRow {
    pub fn to_record(&self) -> [String; 6] {
        [
            self.image_path.to_string_lossy().into_owned(),
            self.bbox.x1.to_string(),
            self.bbox.y1.to_string(),
            self.bbox.x2.to_string(),
            self.bbox.y2.to_string(),
            self.class_name.clone(),
        ]
    }
}

/// Class ids and their names, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    classes: BTreeMap<u32, String>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two-class map used when no class names are supplied.
    pub fn default_classes() -> Self {
        [(0, "dead"), (1, "alive")].into_iter().collect()
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.classes.insert(id, name.into());
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.classes.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.classes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.classes.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.classes.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for ClassMap {
    fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(|(id, name)| (id, name.into())).collect(),
        }
    }
}

/// Parse a class id written in canonical decimal form. A sign or leading
/// zeros (`+1`, `01`) would alias another id, so they are rejected.
pub fn parse_class_id(value: &str) -> Option<u32> {
    let canonical = value.bytes().all(|b| b.is_ascii_digit())
        && !(value.len() > 1 && value.starts_with('0'));
    if !canonical {
        return None;
    }
    value.parse().ok()
}

// Per-split statistics of the YOLO to CSV conversion
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitStats {
    pub images_processed: usize,
    pub skipped_no_label: usize,
    pub skipped_decode_failed: usize,
    pub annotations: usize,
    pub malformed_lines: usize,
    pub unknown_class_lines: usize,
    pub invalid_value_lines: usize,
    pub degenerate_boxes: usize,
    pub unreadable_label_files: usize,
}

impl SplitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images_skipped(&self) -> usize {
        self.skipped_no_label + self.skipped_decode_failed
    }

    pub fn lines_skipped(&self) -> usize {
        self.malformed_lines
            + self.unknown_class_lines
            + self.invalid_value_lines
            + self.degenerate_boxes
    }

    /// Count a rejected label line under its error category.
    pub fn record_line_error(&mut self, error: &DatasetError) {
        match error {
            DatasetError::Schema { .. } => self.malformed_lines += 1,
            DatasetError::Class { .. } => self.unknown_class_lines += 1,
            DatasetError::Parse { .. } => self.invalid_value_lines += 1,
            DatasetError::Bounds { .. } => self.degenerate_boxes += 1,
            _ => self.unreadable_label_files += 1,
        }
    }

    pub fn print_summary(&self, split: &str) {
        log::info!("=== {} split ===", split);
        log::info!("Processed: {} images", self.images_processed);
        log::info!(
            "Skipped: {} images (no label file: {}, decode failed: {})",
            self.images_skipped(),
            self.skipped_no_label,
            self.skipped_decode_failed
        );
        log::info!("Annotations: {}", self.annotations);

        if self.lines_skipped() > 0 {
            log::warn!(
                "Skipped label lines: {} (malformed: {}, unknown class: {}, invalid values: {}, degenerate box: {})",
                self.lines_skipped(),
                self.malformed_lines,
                self.unknown_class_lines,
                self.invalid_value_lines,
                self.degenerate_boxes
            );
        }
        if self.unreadable_label_files > 0 {
            log::warn!("Unreadable label files: {}", self.unreadable_label_files);
        }
    }
}

impl fmt::Display for PixelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}
