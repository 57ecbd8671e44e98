use log::error;

use detset::{validate_csv, DatasetError, ValidatorConfig};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ValidatorConfig::default();

    for csv_path in config.annotation_csvs() {
        match validate_csv(&csv_path, &config.valid_classes) {
            Ok(report) => println!("\n{}", report),
            Err(DatasetError::MissingPath { path, .. }) => {
                println!("File not found: {}", path.display())
            }
            Err(e) => error!("Failed to validate {}: {}", csv_path.display(), e),
        }
    }
}
