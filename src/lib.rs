//! Detection dataset preparation tools
//!
//! This library validates image/annotation datasets and converts YOLO labels
//! to the RetinaNet CSV format used for object detection training.

pub mod config;
pub mod conversion;
pub mod csv_validator;
pub mod error;
pub mod io;
pub mod structure;
pub mod types;
pub mod utils;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use config::{Args, ConvertConfig, ValidatorConfig};
pub use csv_validator::{validate_csv, CsvReport};
pub use error::{DatasetError, Result};
pub use structure::{check_data_structure, validate_splits, StructureReport};
pub use types::{ClassMap, FlatRow, LabelmeAnnotation, PixelBox, Shape, SplitStats, YoloRecord};
pub use yolo_dataset::{convert_dataset, ConversionSummary};
