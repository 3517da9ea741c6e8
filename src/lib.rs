//! Pipeline glue for the QuollVM toolchain: compile source text into a
//! gamefile, decode it, and boot a virtual machine over it.
//!
//! The interactive front ends (the build driver and the game loop) sit on
//! top of these entry points.

use anyhow::{anyhow, Context};
use quoll_build::{BuildResult, Severity};
use quoll_run::storage::MemoryStore;
use quoll_run::{FileStore, GameData, Vm};
use std::time::{SystemTime, UNIX_EPOCH};

pub use quoll_build;
pub use quoll_common;
pub use quoll_run;

/// Logging setup for interactive hosts; safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
}

/// Render a build's diagnostics the way the command-line driver prints
/// them, one per line.
pub fn format_diagnostics(result: &BuildResult) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    let errors = result
        .diagnostics
        .iter()
        .filter(|d| d.severity != Severity::Warning)
        .count();
    let warnings = result.diagnostics.len() - errors;
    if errors > 0 || warnings > 0 {
        out.push('[');
        if errors > 0 {
            out.push_str(&format!("{} error{}", errors, if errors > 1 { "s" } else { "" }));
        }
        if errors > 0 && warnings > 0 {
            out.push_str(" and ");
        }
        if warnings > 0 {
            out.push_str(&format!(
                "{} warning{}",
                warnings,
                if warnings > 1 { "s" } else { "" }
            ));
        }
        out.push_str(" occurred.]\n");
    }
    out
}

/// Compile sources with a reproducible build timestamp.
pub fn build_game_at(
    sources: &[(&str, &str)],
    build_number: u32,
) -> anyhow::Result<Vec<u8>> {
    let result = quoll_build::compile(sources, build_number);
    log::debug!(
        "build finished with {} diagnostics",
        result.diagnostics.len()
    );
    match result.gamefile {
        Some(bytes) => Ok(bytes),
        None => Err(anyhow!(
            "build failed:\n{}",
            format_diagnostics(&result)
        )),
    }
}

/// Compile sources, stamping the gamefile with the current time.
pub fn build_game(sources: &[(&str, &str)]) -> anyhow::Result<Vec<u8>> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    build_game_at(sources, now)
}

/// Decode a gamefile into runtime data.
pub fn load_game(bytes: &[u8]) -> anyhow::Result<GameData> {
    quoll_run::load_gamefile(bytes).context("could not load gamefile")
}

/// Compile, load, and boot a VM backed by the given save-file store.
pub fn boot_with_store(
    sources: &[(&str, &str)],
    store: Box<dyn FileStore>,
) -> anyhow::Result<Vm> {
    let bytes = build_game_at(sources, 0)?;
    let game = load_game(&bytes)?;
    Ok(Vm::new(game, store))
}

/// Compile, load, and boot a VM with in-memory save files.
pub fn boot(sources: &[(&str, &str)]) -> anyhow::Result<Vm> {
    boot_with_store(sources, Box::new(MemoryStore::new()))
}
