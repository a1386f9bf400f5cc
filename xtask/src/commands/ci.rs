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
use anyhow::Result;
use std::time::Instant;

/// One cargo invocation of the CI pipeline.
struct CiTask {
    name: &'static str,
    symbol: &'static str,
    color: &'static str,
    info: &'static str,
    args: &'static [&'static str],
}

const BUILD_TASK: CiTask = CiTask {
    name: "Build",
    symbol: HAMMER,
    color: BLUE,
    info: "Compiling all workspace crates in debug mode",
    args: &["build", "--workspace", "--exclude", "xtask"],
};

const TEST_TASK: CiTask = CiTask {
    name: "Tests",
    symbol: TEST_TUBE,
    color: GREEN,
    info: "Running unit tests, the lighting build integration tests and doc tests",
    args: &["test", "--workspace"],
};

const CHECK_TASK: CiTask = CiTask {
    name: "Check",
    symbol: MAGNIFIER,
    color: CYAN,
    info: "Checking code for errors without building executables",
    args: &["check", "--workspace", "--all-targets"],
};

const FORMAT_TASK: CiTask = CiTask {
    name: "Format",
    symbol: BRUSH,
    color: MAGENTA,
    info: "Formatting code using rustfmt with default settings",
    // `fmt` takes `--all`, not `--workspace`
    args: &["fmt", "--all"],
};

const CLIPPY_TASK: CiTask = CiTask {
    name: "Clippy",
    symbol: CLIPPY,
    color: YELLOW,
    info: "Running Clippy linter with warnings as errors",
    args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
};

const BENCH_TASK: CiTask = CiTask {
    name: "Bench",
    symbol: STOPWATCH,
    color: BLUE,
    info: "Running the criterion benchmarks of lumen-data",
    args: &["bench", "-p", "lumen-data"],
};

fn run(task: &CiTask) -> Result<()> {
    print_task_start(task.name, task.symbol, task.color);
    print_info(task.info);
    execute_command("cargo", task.args, task.name)
}

pub fn build() -> Result<()> {
    run(&BUILD_TASK)
}

pub fn test() -> Result<()> {
    run(&TEST_TASK)
}

pub fn check() -> Result<()> {
    run(&CHECK_TASK)
}

pub fn format() -> Result<()> {
    run(&FORMAT_TASK)
}

pub fn clippy() -> Result<()> {
    run(&CLIPPY_TASK)
}

pub fn bench() -> Result<()> {
    run(&BENCH_TASK)
}

pub fn all() -> Result<()> {
    println!("{}", BANNER);
    println!("{}{}Starting full build pipeline...{}", BOLD, CYAN, RESET);
    println!(
        "{}{} Pipeline:{} build → test → check → format → clippy",
        BOLD, BULB, RESET
    );

    let start_time = Instant::now();
    let tasks = [&BUILD_TASK, &TEST_TASK, &CHECK_TASK, &FORMAT_TASK, &CLIPPY_TASK];
    let total_tasks = tasks.len();
    let mut failed = Vec::new();

    for (i, task) in tasks.iter().enumerate() {
        println!(
            "\n{}{}[{}/{}] {} Phase{}",
            BOLD,
            task.color,
            i + 1,
            total_tasks,
            task.name,
            RESET
        );
        if run(task).is_err() {
            failed.push(task.name);
        }
    }

    let total_duration = start_time.elapsed();
    println!(
        "\n{}{}╔═══════════════════════════════════════╗{}",
        BOLD, CYAN, RESET
    );
    println!(
        "{}{}║            PIPELINE SUMMARY           ║{}",
        BOLD, CYAN, RESET
    );
    println!(
        "{}{}╚═══════════════════════════════════════╝{}",
        BOLD, CYAN, RESET
    );

    if failed.is_empty() {
        println!(
            "{}{} {} All {} tasks completed successfully! {}{}",
            BOLD, GREEN, CHECK, total_tasks, ROCKET, RESET
        );
    } else {
        println!(
            "{}{} ⚠ {}/{} tasks completed, failed: {}{}",
            BOLD,
            YELLOW,
            total_tasks - failed.len(),
            total_tasks,
            failed.join(", "),
            RESET
        );
    }

    println!(
        "{}{}Total time: {:.2}s{}",
        BOLD,
        BLUE,
        total_duration.as_secs_f64(),
        RESET
    );

    if !failed.is_empty() {
        anyhow::bail!(
            "Pipeline failed with {}/{} successful tasks.",
            total_tasks - failed.len(),
            total_tasks
        );
    }

    Ok(())
}
