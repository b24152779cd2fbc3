use std::{env, path::PathBuf, process};

use expressive_training::{Result, configs, training};

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let (Some(config_path), Some(bundle_path)) = (args.next(), args.next()) else {
        eprintln!("usage: expressive_training <run-config.json> <dataset.bundle> [base-dir]");
        process::exit(2);
    };
    let base_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(training::default_base_dir);

    if let Err(e) = run(&PathBuf::from(config_path), &PathBuf::from(bundle_path), &base_dir) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(config_path: &PathBuf, bundle_path: &PathBuf, base_dir: &PathBuf) -> Result<()> {
    let config = configs::load_config(config_path)?;
    let outcome = expressive_training::run(bundle_path, &config, base_dir)?;

    println!(
        "run '{}' finished in {}",
        outcome.name,
        outcome.run_dir.display()
    );
    println!(
        "epochs: {}, best valid loss: {:.6}, test loss: {:.6}",
        outcome.summary.epochs_run, outcome.summary.best_valid_loss, outcome.test_loss
    );

    Ok(())
}
