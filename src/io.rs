use csv::{Terminator, Writer, WriterBuilder};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::config::ConvertConfig;
use crate::error::{DatasetError, Result};
use crate::types::{parse_class_id, ClassMap, FlatRow, YOLO_LABEL_EXTENSION};
use crate::utils::{line_location, list_files_with_extension};

/// Load class names from a file with one name per line; the zero-based
/// line index is the class id. Blank lines keep their index but add no class.
pub fn load_class_names(path: &Path) -> Result<ClassMap> {
    let content = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    Ok(content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let name = line.trim();
            (!name.is_empty()).then(|| (idx as u32, name.to_string()))
        })
        .collect())
}

/// Collect every class id referenced by the YOLO label files in `labels_dirs`.
///
/// Lines with fewer than five fields are ignored. Missing directories are
/// skipped, unreadable files and ids not written as plain decimals are
/// warned about.
pub fn discover_class_ids(labels_dirs: &[PathBuf]) -> BTreeSet<u32> {
    let mut class_ids = BTreeSet::new();

    for labels_dir in labels_dirs.iter().filter(|dir| dir.is_dir()) {
        for label_file in list_files_with_extension(labels_dir, YOLO_LABEL_EXTENSION) {
            let content = match fs::read_to_string(&label_file) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Could not read {}: {}", label_file.display(), e);
                    continue;
                }
            };
            for (line_idx, line) in content.lines().enumerate() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 5 {
                    continue;
                }
                match parse_class_id(parts[0]) {
                    Some(id) => {
                        class_ids.insert(id);
                    }
                    None => warn!(
                        "Ignoring invalid class id '{}' in {}",
                        parts[0],
                        line_location(&label_file, line_idx + 1)
                    ),
                }
            }
        }
    }

    class_ids
}

/// Name every discovered id from `defaults`, falling back to `class_<id>`.
pub fn class_map_from_ids(ids: &BTreeSet<u32>, defaults: &ClassMap) -> ClassMap {
    ids.iter()
        .map(|&id| {
            let name = defaults
                .get(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("class_{}", id));
            (id, name)
        })
        .collect()
}

/// Build the class map for a conversion run.
///
/// An explicit class-name file wins. Otherwise the label files of all
/// requested splits are scanned and only the ids found there are kept.
pub fn resolve_class_map(config: &ConvertConfig) -> ClassMap {
    if let Some(path) = &config.class_names {
        if path.is_file() {
            match load_class_names(path) {
                Ok(class_map) => {
                    info!("Loaded {} class names from {}", class_map.len(), path.display());
                    return class_map;
                }
                Err(e) => warn!("{}; discovering classes from labels instead", e),
            }
        } else {
            warn!(
                "Class names file not found: {}; discovering classes from labels instead",
                path.display()
            );
        }
    }

    let labels_dirs: Vec<PathBuf> = config
        .splits
        .iter()
        .map(|split| config.labels_dir(split))
        .collect();
    let discovered = discover_class_ids(&labels_dirs);
    info!("Discovered {} class ids in label files", discovered.len());
    class_map_from_ids(&discovered, &config.default_classes)
}

fn csv_writer(path: &Path) -> Result<Writer<File>> {
    WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| DatasetError::csv(path, e))
}

/// Write `classes.csv` as `name,id` rows sorted by id.
pub fn write_classes_csv(class_map: &ClassMap, path: &Path) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for (id, name) in class_map.iter() {
        writer
            .write_record([name, id.to_string().as_str()])
            .map_err(|e| DatasetError::csv(path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(path, e))?;

    info!(
        "Created classes.csv with {} classes: {}",
        class_map.len(),
        path.display()
    );
    for (id, name) in class_map.iter() {
        info!("  {}: {}", id, name);
    }
    Ok(())
}

/// Write annotation rows in the order given.
pub fn write_annotations_csv(rows: &[FlatRow], path: &Path) -> Result<()> {
    let mut writer = csv_writer(path)?;
    for row in rows {
        writer
            .write_record(row.to_record())
            .map_err(|e| DatasetError::csv(path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(path, e))
}
