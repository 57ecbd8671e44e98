use clap::Parser;
use log::{error, info};

use detset::{convert_dataset, Args};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.data_root.exists() {
        error!(
            "Data root directory not found: {}",
            args.data_root.display()
        );
        return;
    }

    info!("Converting YOLO annotations to RetinaNet CSV format...");
    info!("Data root: {}", args.data_root.display());
    info!("Splits: {:?}", args.splits);

    match convert_dataset(&args.to_convert_config()) {
        Ok(summary) => summary.print_summary(),
        Err(e) => error!("Failed to convert dataset: {}", e),
    }
}
