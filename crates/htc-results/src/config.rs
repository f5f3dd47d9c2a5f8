//! Resolved settings for a results workspace.

use camino::{Utf8Path, Utf8PathBuf};

/// Submission store location relative to the dataset root.
pub const DEFAULT_STORE_DIR: &str = ".git/htc/submissions";

/// How job output archives are unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Archiver {
    /// System `tar`, which also handles compressed archives
    #[default]
    Tar,
    /// In-process extraction of plain tar archives
    Builtin,
}

/// Configuration for [`crate::Workspace::from_config`].
#[derive(Debug, Clone)]
pub struct ResultsConfig {
    /// Dataset the results are merged into.
    pub dataset: Utf8PathBuf,
    /// Submission store; relative paths are resolved against the dataset.
    pub store: Option<Utf8PathBuf>,
    pub archiver: Archiver,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dataset: Utf8PathBuf::from("."),
            store: None,
            archiver: Archiver::default(),
        }
    }
}

impl ResultsConfig {
    pub fn new(dataset: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    /// Store root for a dataset located at `dataset`.
    pub fn store_root(&self, dataset: &Utf8Path) -> Utf8PathBuf {
        match &self.store {
            Some(store) => dataset.join(store),
            None => dataset.join(DEFAULT_STORE_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_root() {
        let config = ResultsConfig::default();
        assert_eq!(
            config.store_root(Utf8Path::new("/ds")),
            Utf8PathBuf::from("/ds/.git/htc/submissions")
        );
        assert_eq!(config.archiver, Archiver::Tar);
    }

    #[test]
    fn test_store_override() {
        let mut config = ResultsConfig::new("/ds");
        config.store = Some("results".into());
        assert_eq!(config.store_root(Utf8Path::new("/ds")), Utf8PathBuf::from("/ds/results"));

        config.store = Some("/scratch/htc".into());
        assert_eq!(
            config.store_root(Utf8Path::new("/ds")),
            Utf8PathBuf::from("/scratch/htc")
        );
    }
}
