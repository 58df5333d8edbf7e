//! Repository registry reducer
//!
//! Holds the server-confirmed id -> record registry and the current selection.
//! REPOSITORIES_LIST is a full sync that replaces the registry outright;
//! REPOSITORY_ACTION_SUCCESS confirms a requested mutation but is not itself
//! authoritative for record contents. Failed mutations never touch the
//! registry: they were only ever requested, not applied.

use crate::session::protocol::{RepoAction, RepositoryRecord};
use crate::session::store::Advisory;

#[derive(Debug, Clone, Default)]
pub struct ReposSlice {
    /// Insertion order preserved for display only; ids are unique.
    records: Vec<RepositoryRecord>,
    selected: Option<String>,
    /// At most one mutating repository command may be outstanding, because
    /// the protocol carries no correlation ids to tell two apart.
    in_flight: Option<RepoAction>,
}

impl ReposSlice {
    pub fn records(&self) -> &[RepositoryRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&RepositoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn mutation_in_flight(&self) -> Option<RepoAction> {
        self.in_flight
    }

    /// Dispatcher-issued mutating command (add/update/delete).
    pub fn begin_mutation(&mut self, action: RepoAction) {
        self.in_flight = Some(action);
    }

    /// Optimistic selection, applied before the server confirms.
    pub fn select_local(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    /// Full sync: replace the registry with the received set. Selection is
    /// kept if its record survived, otherwise it falls back to the first
    /// entry in the received order (also the default when nothing was
    /// selected yet).
    pub fn on_list(&mut self, repositories: Vec<RepositoryRecord>) -> Option<Advisory> {
        self.records = repositories;
        let still_present = self
            .selected
            .as_deref()
            .map(|id| self.get(id).is_some())
            .unwrap_or(false);
        if !still_present {
            self.selected = self.records.first().map(|r| r.id.clone());
        }
        None
    }

    pub fn on_action_success(
        &mut self,
        action: RepoAction,
        repository_id: Option<&str>,
    ) -> Option<Advisory> {
        if self.in_flight == Some(action) {
            self.in_flight = None;
        }
        match action {
            RepoAction::Select => {
                if let Some(id) = repository_id {
                    self.selected = Some(id.to_string());
                }
                None
            }
            RepoAction::Add => Some(Advisory::normal("Repository added")),
            RepoAction::Update => Some(Advisory::normal("Repository updated")),
            RepoAction::Delete => Some(Advisory::normal("Repository removed")),
        }
    }

    /// Error responses carry no action echo, so any outstanding mutation is
    /// considered answered.
    pub fn on_action_error(&mut self, message: &str) -> Option<Advisory> {
        self.in_flight = None;
        Some(Advisory::error(format!("Repository Error: {message}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> RepositoryRecord {
        RepositoryRecord {
            id: id.to_string(),
            name: format!("repo {id}"),
            url: format!("https://github.com/user/{id}"),
            host: "github.com".into(),
            owner: "user".into(),
            repo: id.to_string(),
            branch: "main".into(),
            created_at: 0,
        }
    }

    #[test]
    fn list_replaces_registry_without_residue() {
        let mut slice = ReposSlice::default();
        slice.on_list(vec![record("a"), record("b")]);
        slice.on_list(vec![record("c")]);
        assert_eq!(slice.records().len(), 1);
        assert!(slice.get("a").is_none());
        assert_eq!(slice.selected_id(), Some("c"));
    }

    #[test]
    fn first_list_default_selects_first_entry() {
        let mut slice = ReposSlice::default();
        slice.on_list(vec![record("a"), record("b")]);
        assert_eq!(slice.selected_id(), Some("a"));
    }

    #[test]
    fn surviving_selection_is_kept_across_lists() {
        let mut slice = ReposSlice::default();
        slice.on_list(vec![record("a"), record("b")]);
        slice.select_local("b");
        slice.on_list(vec![record("b"), record("a")]);
        assert_eq!(slice.selected_id(), Some("b"));
    }

    #[test]
    fn action_error_leaves_registry_untouched() {
        let mut slice = ReposSlice::default();
        slice.on_list(vec![record("a")]);
        slice.begin_mutation(RepoAction::Delete);
        let advisory = slice.on_action_error("nope").unwrap();
        assert_eq!(slice.records().len(), 1);
        assert!(slice.mutation_in_flight().is_none());
        assert_eq!(advisory.text, "Repository Error: nope");
    }
}
