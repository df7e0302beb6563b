use clap::Args;
use itertools::Itertools;
use miette::Result;
use std::path::PathBuf;

use super::build_overlay;

#[derive(Args)]
pub struct ListArgs {
    /// TRE archives in priority order, highest first
    #[arg(short, long = "archive", value_name = "FILE", required = true)]
    archives: Vec<PathBuf>,

    /// Only list paths starting with this prefix
    #[arg(short, long, default_value = "")]
    prefix: String,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let overlay = build_overlay(&self.archives)?;

        for name in overlay.list_by_prefix(&self.prefix).sorted() {
            println!("{name}");
        }

        Ok(())
    }
}
