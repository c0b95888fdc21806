use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// StrataDB storage core CLI
#[derive(Parser, Debug)]
#[command(name = "stratadb", version, about = "StrataDB segment/page inspection CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Segments, page counts and sizes of a data directory
    Status {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Append one row to a table heap
    ///
    /// Values are typed: `i:42` (int) or `t:hello` (text). Repeat --value per column.
    Append {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long = "value", required = true)]
        values: Vec<String>,
    },
    /// Print every row of a table heap. --json prints a JSON array.
    Scan {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        table: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check segment sizes and page headers
    Doctor {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
