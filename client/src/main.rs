use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use classmap::AppOptions;
use classmap::config::MapConfig;
use classmap::map::loader;
use classmap::map::renderer::Theme;

/// Browse classrooms on a map
#[derive(Parser, Debug)]
#[command(name = "classmap", version)]
struct Args {
    /// Classroom dataset (JSON). Uses the bundled sample when omitted.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Map tunables (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// light or dark; follows the window theme when omitted
    #[arg(long)]
    theme: Option<Theme>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("classmap=info"))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MapConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::default(),
    };

    let dataset = match &args.data {
        Some(path) => loader::load_dataset(path)
            .with_context(|| format!("loading classrooms {}", path.display()))?,
        None => {
            log::info!("No dataset given, using bundled sample");
            loader::demo_dataset()
        }
    };

    classmap::run(AppOptions {
        config,
        dataset,
        theme: args.theme,
    })
}
