use std::path::Path;

use crate::error::{DatasetError, Result};
use crate::types::{parse_class_id, ClassMap, FlatRow, PixelBox, YoloRecord};
use crate::utils::ImageInfo;

const YOLO_FIELD_COUNT: usize = 5;

/// Parse one `class cx cy w h` line.
///
/// The field count is checked first, then the class id against `class_map`,
/// then the four fractions.
pub fn parse_yolo_line(line: &str, class_map: &ClassMap, location: &str) -> Result<YoloRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != YOLO_FIELD_COUNT {
        return Err(DatasetError::schema(
            location,
            format!(
                "invalid annotation format, expected {} fields but found {}",
                YOLO_FIELD_COUNT,
                parts.len()
            ),
        ));
    }

    let class_id = match parse_class_id(parts[0]) {
        Some(id) if class_map.contains(id) => id,
        _ => return Err(DatasetError::class(location, parts[0])),
    };

    let fraction = |value: &str| -> Result<f64> {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DatasetError::parse(location, value))
    };

    Ok(YoloRecord {
        class_id,
        x_center: fraction(parts[1])?,
        y_center: fraction(parts[2])?,
        width: fraction(parts[3])?,
        height: fraction(parts[4])?,
    })
}

/// Convert a normalized record to an inclusive pixel box clamped to the
/// image, or `None` when nothing of the box is left.
///
/// The box spans `[cx - w/2, cx + w/2)` in pixels; x1 is the first pixel it
/// covers and x2 the last.
pub fn yolo_to_pixel_box(record: &YoloRecord, width: u32, height: u32) -> Option<PixelBox> {
    if width == 0 || height == 0 {
        return None;
    }
    let (img_w, img_h) = (f64::from(width), f64::from(height));
    let cx = record.x_center * img_w;
    let cy = record.y_center * img_h;
    let half_w = record.width * img_w / 2.0;
    let half_h = record.height * img_h / 2.0;

    let (left, right) = (cx - half_w, cx + half_w);
    let (top, bottom) = (cy - half_h, cy + half_h);
    if ![left, right, top, bottom].iter().all(|edge| edge.is_finite()) {
        return None;
    }

    // Clamp before the cast so extreme fractions cannot saturate or overflow.
    let max_x = img_w - 1.0;
    let max_y = img_h - 1.0;
    let x1 = left.floor().clamp(0.0, max_x) as i64;
    let y1 = top.floor().clamp(0.0, max_y) as i64;
    let x2 = (right.ceil() - 1.0).clamp(0.0, max_x) as i64;
    let y2 = (bottom.ceil() - 1.0).clamp(0.0, max_y) as i64;

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(PixelBox { x1, y1, x2, y2 })
}

/// Convert one label line into a CSV row for `image_path`.
pub fn convert_line(
    line: &str,
    image_path: &Path,
    image: &ImageInfo,
    class_map: &ClassMap,
    location: &str,
) -> Result<FlatRow> {
    let record = parse_yolo_line(line, class_map, location)?;
    let bbox = yolo_to_pixel_box(&record, image.width, image.height)
        .ok_or_else(|| DatasetError::bounds(location, "invalid bounding box after clamping"))?;
    let class_name = class_map
        .get(record.class_id)
        .ok_or_else(|| DatasetError::class(location, record.class_id.to_string()))?;

    Ok(FlatRow {
        image_path: image_path.to_path_buf(),
        bbox,
        class_name: class_name.to_string(),
    })
}
