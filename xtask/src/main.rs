//! Build automation tasks for the knob-strip project.
//!
//! Run with: `cargo xtask <command>`

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::{Command, ExitCode};

const FIRMWARE: &str = "knob-strip";
const SWEEP_FIRMWARE: &str = "strip-sweep";
const FIRMWARE_BINS: [&str; 2] = [FIRMWARE, SWEEP_FIRMWARE];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for the knob-strip project", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: host tests, then library, firmware and docs for every board
    CheckAll,
    /// Run the host tests (unit, integration and doc tests)
    Test,
    /// Build the library for a board
    Build {
        #[arg(long, default_value = "pico1")]
        board: Board,
    },
    /// Build a firmware binary for a board
    Firmware {
        #[arg(long, default_value = "pico1")]
        board: Board,
        #[arg(long)]
        release: bool,
        /// `knob-strip` (the demo) or `strip-sweep` (the strip self-test)
        #[arg(long, default_value = FIRMWARE)]
        bin: String,
    },
    /// Build a UF2 firmware file for flashing to a Pico
    Uf2 {
        #[arg(long, default_value = "pico1")]
        board: Board,
        #[arg(long, default_value = FIRMWARE)]
        bin: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Board {
    Pico1,
    Pico2,
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Board::Pico1 => write!(f, "pico1"),
            Board::Pico2 => write!(f, "pico2"),
        }
    }
}

impl Board {
    const ALL: [Board; 2] = [Board::Pico1, Board::Pico2];

    fn target(self) -> &'static str {
        match self {
            Board::Pico1 => "thumbv6m-none-eabi",
            Board::Pico2 => "thumbv8m.main-none-eabihf",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::Test => exit_code(run_host_tests()),
        Commands::Build { board } => exit_code(build_lib(board)),
        Commands::Firmware {
            board,
            release,
            bin,
        } => exit_code(build_firmware(board, release, &bin)),
        Commands::Uf2 { board, bin } => build_uf2(board, &bin),
    }
}

fn check_all() -> ExitCode {
    println!("{}", "==> Running host tests...".cyan());
    if !run_host_tests() {
        return ExitCode::FAILURE;
    }

    for board in Board::ALL {
        println!("\n{}", format!("==> Building library ({board})...").cyan());
        if !build_lib(board) {
            return ExitCode::FAILURE;
        }

        for bin in FIRMWARE_BINS {
            println!("\n{}", format!("==> Building {bin} ({board})...").cyan());
            if !build_firmware(board, false, bin) {
                return ExitCode::FAILURE;
            }
        }
    }

    println!("\n{}", "==> Building documentation...".cyan());
    let board = Board::Pico1;
    if !run_command(Command::new("cargo").current_dir(workspace_root()).args([
        "doc",
        "--target",
        board.target(),
        "--no-deps",
        "--features",
        &board.to_string(),
    ])) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> All checks passed!".green().bold());
    ExitCode::SUCCESS
}

fn run_host_tests() -> bool {
    let host_target = host_target();
    match host_target.as_deref() {
        Some(target) => {
            println!(
                "  {}",
                format!("Using host target: {target}").bright_black()
            );
        }
        None => {
            println!(
                "{}",
                "  Unable to detect host target; relying on cargo default.".bright_black()
            );
        }
    }

    let mut test_cmd = Command::new("cargo");
    test_cmd
        .current_dir(workspace_root())
        .args(["test", "--package", FIRMWARE]);

    if let Some(target) = host_target {
        test_cmd.arg("--target").arg(target);
    }

    run_command(&mut test_cmd)
}

fn build_lib(board: Board) -> bool {
    println!(
        "  {}",
        format!("Target: {}, features: {board}", board.target()).bright_black()
    );
    run_command(Command::new("cargo").current_dir(workspace_root()).args([
        "build",
        "--lib",
        "--target",
        board.target(),
        "--features",
        &board.to_string(),
    ]))
}

fn build_firmware(board: Board, release: bool, bin: &str) -> bool {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(workspace_root()).args([
        "build",
        "--bin",
        bin,
        "--target",
        board.target(),
        "--features",
        &board.to_string(),
    ]);
    if release {
        cmd.arg("--release");
    }
    run_command(&mut cmd)
}

fn build_uf2(board: Board, bin: &str) -> ExitCode {
    let target = board.target();

    println!("{}", format!("Building UF2 firmware {bin} ({board})").cyan());
    println!("  Target: {}", target.bright_black());

    // Build in release mode for UF2
    if !build_firmware(board, true, bin) {
        return ExitCode::FAILURE;
    }

    // Convert to UF2 using elf2uf2-rs
    let elf_path = format!("target/{target}/release/{bin}");
    let uf2_path = format!("{bin}-{board}.uf2");

    println!("\n{}", "Converting to UF2 format...".cyan());

    if run_command(
        Command::new("elf2uf2-rs")
            .current_dir(workspace_root())
            .args([&elf_path, &uf2_path]),
    ) {
        println!("{}", format!("UF2 created: {uf2_path}").green().bold());
        println!("{}", "Ready to drag-and-drop to your Pico!".bright_black());
        ExitCode::SUCCESS
    } else {
        println!(
            "{}",
            "Note: Install elf2uf2-rs with: cargo install elf2uf2-rs".yellow()
        );
        ExitCode::FAILURE
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn workspace_root() -> std::path::PathBuf {
    // `cargo xtask` runs from the workspace root.
    std::env::current_dir().expect("Failed to get current directory")
}

fn host_target() -> Option<String> {
    let output = Command::new("rustc").arg("-vV").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("host: "))
        .map(|host| host.trim().to_owned())
}

fn run_command(cmd: &mut Command) -> bool {
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("{}", format!("Failed to execute command: {e}").red());
            false
        }
    }
}
