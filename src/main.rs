use std::path::PathBuf;

use anyhow::Context;
use image_composer::{ComposerApp, ComposerConfig};

const USAGE: &str = "usage: image-composer [-o OUTPUT] IMAGE...";

struct Args {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut inputs = Vec::new();
    let mut output = None;
    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-o" || arg == "--output" {
            let path = args.next().context("missing value for --output")?;
            output = Some(PathBuf::from(path));
        } else if arg == "-h" || arg == "--help" {
            println!("{USAGE}");
            std::process::exit(0);
        } else {
            inputs.push(PathBuf::from(arg));
        }
    }
    if inputs.is_empty() {
        anyhow::bail!(USAGE);
    }
    Ok(Args { inputs, output })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args()?;
    let mut app = ComposerApp::new(ComposerConfig::load());

    let summary = app.import_images(&args.inputs);
    for failure in &summary.failures {
        eprintln!("{failure}");
    }

    let job = app.begin_export(args.output)?;
    let written = tokio::task::spawn_blocking(move || job.run())
        .await
        .context("export task did not finish")?;
    let report = app.finish_export(written)?;

    println!(
        "{} ({}x{}), {} source(s) deleted, {} shape(s) cleared, {} deletion(s) failed",
        report.path.display(),
        report.width,
        report.height,
        report.deleted_sources,
        report.cleared_shapes,
        report.failed_deletions
    );
    Ok(())
}
