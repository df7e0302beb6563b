use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{fs::File, io::Write, path::PathBuf};
use tracing::info;

use super::build_overlay;

#[derive(Args)]
pub struct ExtractArgs {
    /// TRE archives in priority order, highest first
    #[arg(short, long = "archive", value_name = "FILE", required = true)]
    archives: Vec<PathBuf>,

    /// Path of the file inside the archives, e.g. datatables/badge/badge_map.iff
    #[arg(short, long)]
    name: String,

    /// Where to write the extracted file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Check the data against the archive's MD5 checksum before writing
    #[arg(long, default_value_t = false)]
    verify: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let overlay = build_overlay(&self.archives)?;

        let entry = overlay
            .get(&self.name)
            .ok_or_else(|| miette!("no entry named {}", self.name))?;

        if self.verify && !entry.verify_md5()? {
            return Err(miette!(
                "{} does not match its checksum in {}",
                self.name,
                entry.archive_path().display()
            ));
        }

        let bytes = entry.read_bytes()?;

        let mut out = if !self.overwrite {
            File::create_new(&self.output)
                .into_diagnostic()
                .context(format!("creating {}", &self.output.display()))?
        } else {
            File::create(&self.output)
                .into_diagnostic()
                .context(format!("creating {}", &self.output.display()))?
        };
        out.write_all(&bytes).into_diagnostic()?;

        info!(
            "wrote {} ({} bytes from {})",
            self.output.display(),
            bytes.len(),
            entry.archive_path().display()
        );

        Ok(())
    }
}
