use glob::{glob, Pattern};
use image::{GenericImageView, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DatasetError, Result};
use crate::types::LabelmeAnnotation;

/// Dimensions and channel count of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

/// List files directly under `dir` whose extension (case-insensitive) is in
/// `extensions`, sorted by path.
pub fn list_images(dir: &Path, extensions: &HashSet<String>) -> Vec<PathBuf> {
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Invalid glob pattern for {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    images.sort();
    images
}

/// List files directly under `dir` with the given extension, sorted by path.
pub fn list_files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let extensions = HashSet::from([extension.to_lowercase()]);
    list_images(dir, &extensions)
}

fn has_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase()))
}

/// Decode an image fully and report its size and channel count. The format
/// is sniffed from the file contents.
pub fn decode_image(path: &Path) -> Result<ImageInfo> {
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| DatasetError::decode(path, e.to_string()))?
        .decode()
        .map_err(|e| DatasetError::decode(path, e.to_string()))?;
    let (width, height) = img.dimensions();
    Ok(ImageInfo {
        width,
        height,
        channels: img.color().channel_count(),
    })
}

/// Read and parse a LabelMe annotation file.
pub fn read_annotation(path: &Path) -> Result<LabelmeAnnotation> {
    let content = fs::read_to_string(path).map_err(|e| {
        DatasetError::schema(path.display().to_string(), format!("could not read file: {}", e))
    })?;
    LabelmeAnnotation::from_json_str(&content, &path.display().to_string())
}

/// `labels_dir/<image stem>.<extension>`; only the last extension of the
/// image name is replaced.
pub fn sibling_label_path(image_path: &Path, labels_dir: &Path, extension: &str) -> PathBuf {
    let mut name = image_path.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    labels_dir.join(name)
}

/// Absolute form of `path` without resolving symlinks.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `file:line` location string used in error messages
pub fn line_location(path: &Path, line_num: usize) -> String {
    format!("{}:{}", path.display(), line_num)
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_lists_images_case_insensitively_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "c.jpeg", "notes.txt", "d.gif"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let exts: HashSet<String> = ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect();
        let names: Vec<_> = list_images(dir.path(), &exts)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG", "c.jpeg"]);
    }

    #[test]
    fn test_decode_reports_dimensions_and_channels() {
        let dir = tempfile::tempdir().unwrap();
        let rgb = dir.path().join("rgb.png");
        image::RgbImage::new(12, 7).save(&rgb).unwrap();
        let gray = dir.path().join("gray.png");
        image::GrayImage::new(5, 5).save(&gray).unwrap();
        let broken = dir.path().join("broken.jpg");
        fs::write(&broken, b"definitely not a jpeg").unwrap();

        assert_eq!(
            decode_image(&rgb).unwrap(),
            ImageInfo {
                width: 12,
                height: 7,
                channels: 3
            }
        );
        assert_eq!(decode_image(&gray).unwrap().channels, 1);
        assert!(matches!(
            decode_image(&broken),
            Err(DatasetError::Decode { .. })
        ));
    }

    #[test]
    fn test_sibling_label_keeps_inner_dots() {
        let path = sibling_label_path(Path::new("images/frame.v2.png"), Path::new("labels"), "txt");
        assert_eq!(path, PathBuf::from("labels/frame.v2.txt"));
    }

    #[test]
    fn test_line_location_formats_path_and_line() {
        assert_eq!(line_location(Path::new("labels/x.txt"), 4), "labels/x.txt:4");
    }
}
