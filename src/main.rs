mod cli;

use std::path::{Path, PathBuf};

use benchfig::chart::{BarChart, LabelSpec};
use benchfig::labels::LabelOptions;
use benchfig::parsers::parse_duration;
use benchfig::prelude::*;
use benchfig::saver::FigureSaver;
use benchfig::stats::read_stats;
use benchfig::table::Table;
use clap::Parser;
use dotenvy::dotenv;
use walkdir::WalkDir;

use crate::cli::{ChartArgs, Commands};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = cli::Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();
    debug!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    let saver = FigureSaver::new(cli.figure_config()?);

    match cli.command {
        Commands::Bar { input, chart } => {
            let table = Table::from_csv(&input)?;
            let name = chart.name.clone().unwrap_or_else(|| file_stem(&input));
            render(&saver, table, &name, &chart)?;
        }
        Commands::Stats {
            path,
            keys,
            json,
            chart,
        } => {
            if path.is_dir() {
                if keys.is_empty() {
                    anyhow::bail!("--keys is required when reading a directory of stats files");
                }
                let files = collect_stats_files(&path);
                info!("Found {} stats files under {}", files.len(), path.display());
                let table = Table::from_stats_files(&files, &keys)?;
                let name = chart.name.clone().unwrap_or_else(|| file_stem(&path));
                render(&saver, table, &name, &chart)?;
            } else {
                let stats = read_stats(&path)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    for (key, value) in &stats {
                        println!("{} {}", key, value);
                    }
                }
            }
        }
        Commands::Duration { text } => {
            println!("{}", parse_duration(&text.join(" "))?);
        }
    }

    Ok(())
}

fn render(saver: &FigureSaver, table: Table, name: &str, args: &ChartArgs) -> Result<()> {
    let mut table = table.scale(args.scale);
    if let Some(baseline) = &args.normalize {
        table = table.normalize_to(baseline)?;
    }
    if args.geomean {
        table = table.with_geomean()?;
    }

    let mut chart = BarChart::new(table);
    chart.title = args.title.clone();
    chart.xlabel = args.xlabel.clone();
    chart.ylabel = args.ylabel.clone();
    chart.legend = args.legend;
    if !args.label_mask.is_empty() {
        chart.labels = Some(LabelSpec {
            mask: args.label_mask.clone(),
            options: LabelOptions {
                mode: args.label_mode,
                precision: args.precision,
                suffix: args.label_suffix.clone(),
                ..LabelOptions::default()
            },
        });
    }

    if args.html {
        saver.save_table(&chart.table, name)?;
    }
    match saver.save_fig(name, &chart, !args.no_crop)? {
        Some(saved) => debug!("Saved {:?}", saved),
        None => warn!("Figure {} was not written", name),
    }
    Ok(())
}

fn collect_stats_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.into_path())
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "figure".to_string())
}
