//! File tree reducer
//!
//! Idle | Loading | Loaded | Error, always tagged with the repository id the
//! state is for. A new fetch clears any previous tree before anything else so
//! stale data is never shown while the fetch is in flight. Switching the
//! selected repository forces Idle for the new context; a response tagged
//! with a different repository id is stale and discarded.

use crate::session::protocol::{FileNode, RepositoryRecord};
use crate::session::store::Advisory;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FileTreePhase {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<FileNode>),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct FileTreeSlice {
    phase: FileTreePhase,
    /// Which repository the current phase belongs to.
    repository_id: Option<String>,
}

impl FileTreeSlice {
    pub fn phase(&self) -> &FileTreePhase {
        &self.phase
    }

    pub fn repository_id(&self) -> Option<&str> {
        self.repository_id.as_deref()
    }

    /// Dispatcher-issued FETCH_FILES. Clears any previous tree immediately.
    pub fn begin_fetch(&mut self, repository_id: &str) {
        self.repository_id = Some(repository_id.to_string());
        self.phase = FileTreePhase::Loading;
    }

    /// The selection moved: the new repository does not inherit the previous
    /// one's loaded state.
    pub fn switch_repo(&mut self, repository_id: Option<&str>) {
        self.repository_id = repository_id.map(str::to_string);
        self.phase = FileTreePhase::Idle;
    }

    /// An untagged payload is addressed to the current context (the backend
    /// omits the repository after deleting the last one).
    pub fn on_data(
        &mut self,
        tree: Vec<FileNode>,
        repository: Option<&RepositoryRecord>,
    ) -> Option<Advisory> {
        if let Some(repo) = repository {
            if self.repository_id.as_deref() != Some(repo.id.as_str()) {
                tracing::debug!(
                    "discarding stale file tree for {} (current context {:?})",
                    repo.id,
                    self.repository_id
                );
                return None;
            }
        }
        self.phase = FileTreePhase::Loaded(tree);
        Some(Advisory::normal("File tree loaded"))
    }

    pub fn on_error(&mut self, message: &str) -> Option<Advisory> {
        self.phase = FileTreePhase::Error(message.to_string());
        Some(Advisory::error(format!("File Tree Error: {message}")))
    }

    pub fn reset(&mut self) {
        self.phase = FileTreePhase::Idle;
        self.repository_id = None;
    }
}
