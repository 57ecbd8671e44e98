use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::types::ClassMap;

pub const DATA_ROOT: &str = "./data";
pub const DEFAULT_SPLITS: &[&str] = &["train", "val", "test"];
pub const DEFAULT_VALID_CLASSES: &[&str] = &["dead", "alive"];

/// Command-line arguments for converting YOLO labels to RetinaNet CSV.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Root directory containing the images and labels folders
    #[arg(long = "data-root", default_value = DATA_ROOT)]
    pub data_root: PathBuf,

    /// File containing class names, one per line (line index is the class id)
    #[arg(long = "class-names")]
    pub class_names: Option<PathBuf>,

    /// Data splits to process
    #[arg(long = "splits", num_args = 1.., default_values_t = default_splits())]
    pub splits: Vec<String>,
}

impl Args {
    pub fn to_convert_config(&self) -> ConvertConfig {
        ConvertConfig {
            data_root: self.data_root.clone(),
            class_names: self.class_names.clone(),
            splits: self.splits.clone(),
            default_classes: ClassMap::default_classes(),
        }
    }
}

/// Settings for one run of the YOLO to CSV converter.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub data_root: PathBuf,
    pub class_names: Option<PathBuf>,
    pub splits: Vec<String>,
    /// Names for discovered class ids when no class file is supplied
    pub default_classes: ClassMap,
}

impl ConvertConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            class_names: None,
            splits: default_splits(),
            default_classes: ClassMap::default_classes(),
        }
    }

    pub fn images_dir(&self, split: &str) -> PathBuf {
        self.data_root.join("images").join(split)
    }

    pub fn labels_dir(&self, split: &str) -> PathBuf {
        self.data_root.join("labels").join(split)
    }

    pub fn annotations_csv(&self, split: &str) -> PathBuf {
        self.data_root.join(format!("annotations_{}.csv", split))
    }

    pub fn classes_csv(&self) -> PathBuf {
        self.data_root.join("classes.csv")
    }
}

/// Fixed settings shared by the two validators.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub data_root: PathBuf,
    pub splits: Vec<String>,
    pub valid_classes: BTreeSet<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DATA_ROOT),
            splits: default_splits(),
            valid_classes: DEFAULT_VALID_CLASSES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ValidatorConfig {
    pub fn annotation_csvs(&self) -> Vec<PathBuf> {
        self.splits
            .iter()
            .map(|split| self.data_root.join(format!("annotations_{}.csv", split)))
            .collect()
    }
}

fn default_splits() -> Vec<String> {
    DEFAULT_SPLITS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_defaults() {
        let args = Args::try_parse_from(["yolo2csv"]).unwrap();
        assert_eq!(args.data_root, PathBuf::from("./data"));
        assert_eq!(args.class_names, None);
        assert_eq!(args.splits, vec!["train", "val", "test"]);
    }

    #[test]
    fn test_parses_explicit_flags() {
        let args = Args::try_parse_from([
            "yolo2csv",
            "--data-root",
            "/tmp/ds",
            "--class-names",
            "names.txt",
            "--splits",
            "train",
            "val",
        ])
        .unwrap();
        let config = args.to_convert_config();
        assert_eq!(config.data_root, PathBuf::from("/tmp/ds"));
        assert_eq!(config.class_names, Some(PathBuf::from("names.txt")));
        assert_eq!(config.splits, vec!["train", "val"]);
        assert_eq!(config.annotations_csv("val"), PathBuf::from("/tmp/ds/annotations_val.csv"));
    }

    #[test]
    fn test_validator_defaults() {
        let config = ValidatorConfig::default();
        assert!(config.valid_classes.contains("dead"));
        assert!(config.valid_classes.contains("alive"));
        assert_eq!(config.annotation_csvs().len(), 3);
    }
}
