use indicatif::ProgressBar;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConvertConfig;
use crate::conversion::convert_line;
use crate::error::{DatasetError, Result};
use crate::io::{resolve_class_map, write_annotations_csv, write_classes_csv};
use crate::types::{converter_extensions, ClassMap, FlatRow, SplitStats, YOLO_LABEL_EXTENSION};
use crate::utils::{
    absolute_path, create_progress_bar, decode_image, line_location, list_images,
    sibling_label_path,
};

/// Rows and statistics produced for one split.
#[derive(Debug, Default)]
pub struct SplitOutput {
    pub rows: Vec<FlatRow>,
    pub stats: SplitStats,
}

/// Outcome of a complete conversion run.
#[derive(Debug)]
pub struct ConversionSummary {
    pub class_map: ClassMap,
    pub classes_csv: PathBuf,
    /// Split name, output file and statistics for every split written
    pub splits: Vec<(String, PathBuf, SplitStats)>,
}

impl ConversionSummary {
    pub fn total_annotations(&self) -> usize {
        self.splits.iter().map(|(_, _, stats)| stats.annotations).sum()
    }

    pub fn print_summary(&self) {
        info!("{}", "=".repeat(50));
        info!("CONVERSION SUMMARY");
        info!("{}", "=".repeat(50));
        info!("Total annotations: {}", self.total_annotations());
        info!("Classes: {}", self.class_map.len());
        info!("Output files:");
        info!("  - {}", self.classes_csv.display());
        for (_, path, stats) in &self.splits {
            info!("  - {} ({} annotations)", path.display(), stats.annotations);
        }
    }
}

/// Convert every labelled image of one split into CSV rows.
///
/// Images without a label file or that fail to decode are skipped and
/// counted. Bad label lines are warned about, counted and skipped.
pub fn convert_split(
    images_dir: &Path,
    labels_dir: &Path,
    class_map: &ClassMap,
    pb: &ProgressBar,
) -> SplitOutput {
    let mut output = SplitOutput::default();
    let image_files = list_images(images_dir, converter_extensions());
    pb.set_length(image_files.len() as u64);

    for image_path in image_files {
        convert_image(&image_path, labels_dir, class_map, &mut output);
        pb.inc(1);
    }

    output
}

fn convert_image(image_path: &Path, labels_dir: &Path, class_map: &ClassMap, output: &mut SplitOutput) {
    let label_path = sibling_label_path(image_path, labels_dir, YOLO_LABEL_EXTENSION);
    if !label_path.is_file() {
        output.stats.skipped_no_label += 1;
        return;
    }

    let image = match decode_image(image_path) {
        Ok(image) => image,
        Err(e) => {
            warn!("{}", e);
            output.stats.skipped_decode_failed += 1;
            return;
        }
    };
    output.stats.images_processed += 1;

    let content = match fs::read_to_string(&label_path) {
        Ok(content) => content,
        Err(e) => {
            error!("Error processing {}: {}", label_path.display(), e);
            output.stats.unreadable_label_files += 1;
            return;
        }
    };

    let row_path = absolute_path(image_path);
    for (line_idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let location = line_location(&label_path, line_idx + 1);
        match convert_line(line, &row_path, &image, class_map, &location) {
            Ok(row) => {
                output.stats.annotations += 1;
                output.rows.push(row);
            }
            Err(e) => {
                warn!("{}", e);
                output.stats.record_line_error(&e);
            }
        }
    }
}

/// Run the full conversion described by `config`.
///
/// Only a missing data root or a failed write aborts the run. Splits whose
/// image or label directory is missing are skipped without output.
pub fn convert_dataset(config: &ConvertConfig) -> Result<ConversionSummary> {
    if !config.data_root.is_dir() {
        return Err(DatasetError::missing("Data root directory", &config.data_root));
    }

    let class_map = resolve_class_map(config);
    let classes_csv = config.classes_csv();
    write_classes_csv(&class_map, &classes_csv)?;

    let mut splits = Vec::with_capacity(config.splits.len());
    for split in &config.splits {
        let images_dir = config.images_dir(split);
        let labels_dir = config.labels_dir(split);
        if !images_dir.is_dir() {
            warn!("Images directory not found: {}", images_dir.display());
            continue;
        }
        if !labels_dir.is_dir() {
            warn!("Labels directory not found: {}", labels_dir.display());
            continue;
        }

        info!("Processing {} split...", split);
        let pb = create_progress_bar(0, split);
        let output = convert_split(&images_dir, &labels_dir, &class_map, &pb);
        pb.finish_with_message(format!("{} processing complete", split));

        let output_csv = config.annotations_csv(split);
        write_annotations_csv(&output.rows, &output_csv)?;
        output.stats.print_summary(split);
        info!("Output: {}", output_csv.display());

        splits.push((split.clone(), output_csv, output.stats));
    }

    Ok(ConversionSummary {
        class_map,
        classes_csv,
        splits,
    })
}
