use std::path::PathBuf;

use miette::miette;
use tracing::warn;
use tre_vfs::TreeOverlay;

pub mod export;
pub mod extract;
pub mod list;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the files visible in an archive stack
    List(list::ListArgs),
    /// Extract a single file from an archive stack
    Extract(extract::ExtractArgs),
    /// Export every visible file into a directory
    Export(export::ExportArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::List(list) => list.handle(),
            Commands::Extract(extract) => extract.handle(),
            Commands::Export(export) => export.handle(),
        }
    }
}

/// Merge the archives into an overlay, first path = highest priority.
/// Individual archives that fail to parse are logged and skipped.
pub(crate) fn build_overlay(archives: &[PathBuf]) -> miette::Result<TreeOverlay> {
    let overlay = TreeOverlay::new();
    let failures = overlay.merge_all(archives);

    for failure in &failures {
        warn!("skipped {}: {}", failure.archive.display(), failure.error);
    }

    if !archives.is_empty() && failures.len() == archives.len() {
        return Err(miette!("none of the supplied archives could be read"));
    }

    Ok(overlay)
}
