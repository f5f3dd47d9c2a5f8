//! A dataset, its submission store and the collaborators used on it.

use crate::config::{Archiver, ResultsConfig};
use crate::operation::{Filter, Operation, UsageError};
use crate::provenance::{GitProvenance, Provenance};
use crate::traversal::Traversal;
use camino::{Utf8Path, Utf8PathBuf};
use htc_core::Store;
use htc_exec::{CommandError, Extractor, Runner, TarBuiltin, TarCommand};
use thiserror::Error;
use tracing::Span;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("dataset not found at {path}: {source}")]
    Dataset {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Everything a traversal needs to act on one dataset.
pub struct Workspace {
    dataset: Utf8PathBuf,
    store: Store,
    provenance: Box<dyn Provenance>,
    extractor: Box<dyn Extractor>,
    span: Span,
}

impl Workspace {
    pub fn new(
        dataset: impl Into<Utf8PathBuf>,
        store: Store,
        provenance: Box<dyn Provenance>,
        extractor: Box<dyn Extractor>,
    ) -> Self {
        let dataset = dataset.into();
        let span = tracing::info_span!("htc_results", dataset = %dataset);
        Self {
            dataset,
            store,
            provenance,
            extractor,
            span,
        }
    }

    /// Build a workspace backed by git provenance and the configured archiver.
    pub fn from_config(config: &ResultsConfig) -> Result<Self, WorkspaceError> {
        let dataset = config
            .dataset
            .canonicalize_utf8()
            .map_err(|source| WorkspaceError::Dataset {
                path: config.dataset.clone(),
                source,
            })?;
        let store = Store::new(config.store_root(&dataset));
        let runner = Runner::new()?;

        let extractor: Box<dyn Extractor> = match config.archiver {
            Archiver::Tar => Box::new(TarCommand::new(runner.clone())),
            Archiver::Builtin => Box::new(TarBuiltin),
        };
        let provenance =
            Box::new(GitProvenance::new(dataset.clone(), runner).with_store(store.root()));

        tracing::debug!(store = %store.root(), "using submission store");
        Ok(Self::new(dataset, store, provenance, extractor))
    }

    /// Log under `span` instead of the default workspace span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn dataset(&self) -> &Utf8Path {
        &self.dataset
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn provenance(&self) -> &dyn Provenance {
        self.provenance.as_ref()
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Start `operation` over the filtered part of the store.
    ///
    /// Nothing is read or changed until the returned traversal is iterated.
    pub fn run(
        &self,
        operation: Operation,
        filter: Filter,
        all: bool,
    ) -> Result<Traversal<'_>, UsageError> {
        operation.check(filter, all)?;
        Ok(Traversal::new(self, operation.workers(), filter))
    }

    pub fn list(&self, filter: Filter) -> Traversal<'_> {
        Traversal::new(self, Operation::List.workers(), filter)
    }

    pub fn merge(&self, filter: Filter) -> Traversal<'_> {
        Traversal::new(self, Operation::Merge.workers(), filter)
    }

    pub fn remove(&self, filter: Filter, all: bool) -> Result<Traversal<'_>, UsageError> {
        self.run(Operation::Remove, filter, all)
    }
}
