// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Build automation and lighting workspace tasks for Lumen
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use helpers::{print_custom_help, print_error};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask", version, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Task>,
}

#[derive(Subcommand)]
enum Task {
    /// Build all crates in the workspace.
    Build,
    /// Run all tests in the workspace.
    Test,
    /// Run `cargo check` on all crates.
    Check,
    /// Format all code in the workspace.
    Format,
    /// Run clippy on all crates with warnings as errors.
    Clippy,
    /// Run the criterion benchmarks.
    Bench,
    /// Run every CI task.
    All,
    /// Manage the lighting build configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the diagnostic dump directory.
    Dumps {
        #[command(subcommand)]
        action: DumpsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with every default value.
    Init {
        #[arg(long, default_value = commands::lightmass::DEFAULT_CONFIG_PATH)]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration.
    Show {
        #[arg(long, default_value = commands::lightmass::DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum DumpsAction {
    /// List the files left by the last dumped build.
    List {
        #[arg(long, default_value = commands::lightmass::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
    /// Remove every file from the dump directory.
    Clear {
        #[arg(long, default_value = commands::lightmass::DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let Some(task) = cli.command else {
        print_custom_help();
        return;
    };

    if let Err(e) = run(task) {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(task: Task) -> Result<()> {
    match task {
        Task::Build => commands::ci::build(),
        Task::Test => commands::ci::test(),
        Task::Check => commands::ci::check(),
        Task::Format => commands::ci::format(),
        Task::Clippy => commands::ci::clippy(),
        Task::Bench => commands::ci::bench(),
        Task::All => commands::ci::all(),
        Task::Config { action } => match action {
            ConfigAction::Init { path, force } => commands::lightmass::config_init(&path, force),
            ConfigAction::Show { path } => commands::lightmass::config_show(&path),
        },
        Task::Dumps { action } => match action {
            DumpsAction::List { config } => commands::lightmass::dumps_list(&config),
            DumpsAction::Clear { config } => commands::lightmass::dumps_clear(&config),
        },
    }
}
