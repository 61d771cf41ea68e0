mod assemble;
mod collect;
mod config;
mod dashboard;
mod error;
mod patches;
mod pipeline;
mod render;
mod sass;
mod tasks;
mod templates;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dashboard_config::StaticMetaData;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use crate::config::Config;
use crate::dashboard::{load_theme, write_dashboard};
use crate::pipeline::Pipeline;
use crate::tasks::TaskGraph;

#[derive(Parser)]
#[command(about = "Build and stage the meta-MAAS dashboard assets")]
struct Cli {
    /// 配置文件地址
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// 项目根目录
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run build tasks and everything they depend on
    Run {
        #[arg(default_value = "default")]
        tasks: Vec<String>,
        /// Where `snap-install` stages the bundle
        #[arg(long, env = "SNAPCRAFT_PART_INSTALL")]
        install_dir: Option<PathBuf>,
    },
    /// List tasks in execution order
    Tasks,
    /// Write a viewable dashboard page
    Dashboard {
        #[arg(short, long)]
        out: PathBuf,
        /// Built-in theme name or path to a theme file
        #[arg(long, default_value = "status")]
        theme: String,
        /// JSON file with the regions to display
        #[arg(long)]
        regions: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let (config, path) = Config::load(cli.config.as_deref(), &cli.root)?;
    match &path {
        Some(p) => info!("Using config {}", p.display()),
        None => info!("Using built-in config"),
    }

    match cli.command {
        Command::Run { tasks, install_dir } => {
            let graph = TaskGraph::new(config.tasks.clone())?;
            let targets: Vec<&str> = tasks.iter().map(String::as_str).collect();
            let mut pipeline = Pipeline::new(&config, &cli.root, install_dir);
            graph.run(&targets, &mut pipeline)?;
        }
        Command::Tasks => {
            let graph = TaskGraph::new(config.tasks.clone())?;
            let names: Vec<&str> = graph.tasks().iter().map(|t| t.name.as_str()).collect();
            for task in graph.plan(&names)? {
                if task.deps.is_empty() {
                    println!("{}", task.name);
                } else {
                    println!("{} <- {}", task.name, task.deps.join(", "));
                }
            }
        }
        Command::Dashboard { out, theme, regions, force } => {
            let theme = load_theme(&theme, Path::new("."))?;
            let regions = match regions {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("cannot read regions from {}", path.display()))?;
                    serde_json::from_str(&content)
                        .with_context(|| format!("invalid regions JSON in {}", path.display()))?
                }
                None => serde_json::json!({}),
            };
            let meta = StaticMetaData::new(regions);
            let bundle = cli.root.join(&config.bundle.source);
            write_dashboard(&out, &bundle, &meta, &theme, force)?;
        }
    }

    Ok(())
}
