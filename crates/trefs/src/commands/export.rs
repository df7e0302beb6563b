use clap::Args;
use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use super::build_overlay;

#[derive(Args)]
pub struct ExportArgs {
    /// TRE archives in priority order, highest first
    #[arg(short, long = "archive", value_name = "FILE", required = true)]
    archives: Vec<PathBuf>,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Only export paths containing this substring
    #[arg(long, default_value = "")]
    filter: String,

    /// Overwrite files that already exist in the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExportArgs {
    pub fn handle(&self) -> Result<()> {
        let overlay = build_overlay(&self.archives)?;

        let names = visible_names(overlay.names(), &self.filter);
        let total = names.len();

        for (index, name) in names.iter().enumerate() {
            if !is_safe_name(name) {
                warn!("[{}/{}] refusing unsafe path {}", index + 1, total, name);
                continue;
            }

            let target = self.directory.join(name);
            if !self.overwrite && target.exists() {
                info!("[{}/{}] skipping {}", index + 1, total, target.display());
                continue;
            }

            info!("[{}/{}] writing {}", index + 1, total, target.display());

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .context(format!("creating {}", parent.display()))?;
            }

            let bytes = overlay.read(name)?;
            std::fs::write(&target, bytes)
                .into_diagnostic()
                .context(format!("writing {}", target.display()))?;
        }

        Ok(())
    }
}

/// The sorted set of names the export will walk, with the substring filter
/// already applied so progress counters only count exportable entries.
fn visible_names(names: Vec<String>, filter: &str) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| filter.is_empty() || name.contains(filter))
        .sorted()
        .collect()
}

/// Whether an entry name is safe to join under the target directory.
/// Archive names are attacker-controlled and may carry absolute paths or
/// `..` components that would escape it.
fn is_safe_name(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod test {
    use super::{is_safe_name, visible_names};

    #[test]
    fn filter_is_applied_before_counting() {
        let names = vec![
            "b/two.iff".to_owned(),
            "a/one.iff".to_owned(),
            "a/three.iff".to_owned(),
        ];

        assert_eq!(
            visible_names(names.clone(), "a/"),
            vec!["a/one.iff", "a/three.iff"]
        );
        assert_eq!(visible_names(names.clone(), "two"), vec!["b/two.iff"]);
        assert_eq!(visible_names(names, "").len(), 3);
    }

    #[test]
    fn escaping_names_are_rejected() {
        assert!(is_safe_name("datatables/badge/badge_map.iff"));
        assert!(is_safe_name("hello.txt"));

        assert!(!is_safe_name("/etc/shadow"));
        assert!(!is_safe_name("../runtime"));
        assert!(!is_safe_name("a/../../b.iff"));
        assert!(!is_safe_name("./a.iff"));
    }
}
