use log::info;

use detset::{validate_splits, ValidatorConfig};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ValidatorConfig::default();

    info!("Validating dataset under {}", config.data_root.display());
    let checks = validate_splits(&config.data_root, &config.splits);

    let mut all_valid = true;
    for check in &checks {
        println!("\n{}", "=".repeat(50));
        println!("Checking split: {}", check.split);
        println!("{}", "=".repeat(50));
        match &check.outcome {
            Ok(report) => println!("\n{}", report),
            Err(e) => println!("\nError: {}", e),
        }

        if check.is_acceptable() {
            println!("\nData in split '{}' meets requirements!", check.split);
        } else {
            all_valid = false;
            println!("\nData in split '{}' does not meet requirements!", check.split);
        }
    }

    if all_valid {
        println!("\nAll splits meet the requirements for keras-retinanet training!");
    } else {
        println!("\nSome splits have issues that need to be fixed before training.");
    }
}
