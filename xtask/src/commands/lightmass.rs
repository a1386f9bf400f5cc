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

use crate::helpers::*;
use anyhow::{Context, Result};
use lumen_io::{BinaryDumpDirectory, LightmassConfig};
use std::path::Path;
use walkdir::WalkDir;

pub const DEFAULT_CONFIG_PATH: &str = "lightmass.ron";

pub fn config_init(path: &Path, force: bool) -> Result<()> {
    print_task_start("Writing Lighting Configuration", GEAR, CYAN);
    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists, pass --force to overwrite it",
            path.display()
        );
    }

    LightmassConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    print_success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

pub fn config_show(path: &Path) -> Result<()> {
    print_task_start("Lighting Configuration", GEAR, CYAN);
    let config = if path.exists() {
        LightmassConfig::load(path)
            .with_context(|| format!("Failed to load '{}'", path.display()))?
    } else {
        print_info(&format!("'{}' not found, showing defaults", path.display()));
        LightmassConfig::default()
    };
    println!("{}", config.to_ron_string()?);
    Ok(())
}

fn dump_directory(config_path: &Path) -> Result<BinaryDumpDirectory> {
    let config = if config_path.exists() {
        LightmassConfig::load(config_path)
            .with_context(|| format!("Failed to load '{}'", config_path.display()))?
    } else {
        LightmassConfig::default()
    };
    Ok(BinaryDumpDirectory::new(config.dump.directory))
}

pub fn dumps_list(config_path: &Path) -> Result<()> {
    print_task_start("Dumped Build Results", MAGNIFIER, BLUE);
    let dumps = dump_directory(config_path)?;
    if !dumps.path().exists() {
        print_info(&format!("{} does not exist", dumps.path().display()));
        return Ok(());
    }

    let mut total_bytes = 0u64;
    let mut count = 0usize;
    for entry in WalkDir::new(dumps.path()).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata()?.len();
        total_bytes += size;
        count += 1;
        println!("  {:>10} B  {}", size, entry.path().display());
    }
    print_success(&format!(
        "{} files, {} bytes in {}",
        count,
        total_bytes,
        dumps.path().display()
    ));
    Ok(())
}

pub fn dumps_clear(config_path: &Path) -> Result<()> {
    print_task_start("Clearing Dumped Build Results", BRUSH, MAGENTA);
    let dumps = dump_directory(config_path)?;
    let removed = dumps.prepare_fresh()?;
    print_success(&format!(
        "Removed {} files from {}",
        removed,
        dumps.path().display()
    ));
    Ok(())
}
