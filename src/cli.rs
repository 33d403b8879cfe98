use std::path::PathBuf;

use benchfig::chart::LegendPlacement;
use benchfig::config::FigureConfig;
use benchfig::labels::LabelMode;
use benchfig::prelude::*;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "benchfig")]
#[command(about = "Benchmark result figure generator", long_about = None)]
pub struct Cli {
    /// YAML figure configuration
    #[arg(short, long, global = true, env = "BENCHFIG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root output directory
    #[arg(long, global = true, env = "BENCHFIG_SAVE_LOC")]
    pub save_loc: Option<PathBuf>,

    /// Output subdirectory under the save location
    #[arg(long, global = true, env = "BENCHFIG_SAVE_PREFIX")]
    pub save_prefix: Option<String>,

    /// Do not write any output files
    #[arg(long, global = true, env = "BENCHFIG_DISABLE_FIG_SAVE")]
    pub disable_fig_save: bool,

    /// Font size in points
    #[arg(long, global = true)]
    pub fontsize: Option<f64>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Plot a CSV table (first column = groups, other columns = series)
    #[command(arg_required_else_help = true)]
    Bar {
        input: PathBuf,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Print a stats file, or plot selected keys of every stats file in a directory
    #[command(arg_required_else_help = true)]
    Stats {
        path: PathBuf,
        /// Keys to plot when `path` is a directory
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Print a single file as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Convert a duration such as "1s 500ms" to nanoseconds
    #[command(arg_required_else_help = true)]
    Duration {
        #[arg(num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    /// Output file name without extension
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub xlabel: Option<String>,
    #[arg(long)]
    pub ylabel: Option<String>,
    /// Multiply every value by this factor
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
    /// Divide every group by its value in this series
    #[arg(long)]
    pub normalize: Option<String>,
    /// Append a geometric mean group
    #[arg(long)]
    pub geomean: bool,
    /// Comma separated booleans, one per block of bars
    #[arg(long, value_delimiter = ',')]
    pub label_mask: Vec<bool>,
    /// over | in-bar
    #[arg(long, default_value = "over")]
    pub label_mode: LabelMode,
    #[arg(long, default_value_t = 1)]
    pub precision: usize,
    #[arg(long, default_value = "x")]
    pub label_suffix: String,
    #[arg(long, default_value = "upper right")]
    pub legend: LegendPlacement,
    /// Skip the crop command
    #[arg(long)]
    pub no_crop: bool,
    /// Also save the table as HTML
    #[arg(long)]
    pub html: bool,
}

impl Cli {
    /// Config file values, overridden by flags and environment variables.
    pub fn figure_config(&self) -> Result<FigureConfig> {
        let mut config = match &self.config {
            Some(path) => FigureConfig::from_file(path)?,
            None => FigureConfig::default(),
        };
        if let Some(save_loc) = &self.save_loc {
            config.save_loc = save_loc.clone();
        }
        if let Some(save_prefix) = &self.save_prefix {
            config.save_prefix = save_prefix.clone();
        }
        if let Some(fontsize) = self.fontsize {
            config.fontsize = fontsize;
        }
        if self.disable_fig_save {
            config.disable_fig_save = true;
        }
        Ok(config)
    }
}
