//! Development tasks for podlike-compose: `cargo xtask test` and `cargo xtask ci`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for podlike-compose")]
struct Cli {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Run the library and integration tests
    Test {
        /// Only run tests whose name contains this filter
        filter: Option<String>,
    },
    /// Check formatting, lint with warnings denied, then test
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.task {
        Task::Test { filter } => run_tests(&sh, filter.as_deref()),
        Task::Ci => {
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            cmd!(sh, "cargo clippy -p podlike-compose --all-targets -- -D warnings").run()?;
            run_tests(&sh, None)
        }
    }
}

fn run_tests(sh: &Shell, filter: Option<&str>) -> Result<()> {
    let filter: Vec<&str> = filter.into_iter().collect();
    cmd!(sh, "cargo test -p podlike-compose {filter...}")
        .run()
        .context("podlike-compose tests failed")
}

fn workspace_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask must live inside the workspace")
}
