//! Authoritative session state
//!
//! Single-writer store: the engine task owns the only mutable reference, and
//! observers receive clones through a watch channel. Each slice is reduced
//! independently; the one cross-slice effect (a selection change invalidates
//! the file tree) is resolved here by passing the new selection in
//! explicitly, never by one reducer reading another's slice.

use crate::session::chat::ChatSlice;
use crate::session::config::ConfigSlice;
use crate::session::file_tree::FileTreeSlice;
use crate::session::protocol::{Event, RepoAction};
use crate::session::repos::ReposSlice;

/// Advisory status severity, derived from which event produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Normal,
    Error,
}

/// A status produced by a reducer or the dispatcher, before it is stamped
/// with a generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub severity: Severity,
    pub text: String,
}

impl Advisory {
    pub fn normal(text: impl Into<String>) -> Self {
        Advisory {
            severity: Severity::Normal,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Advisory {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// The transient system status line. Last write wins; the generation counter
/// makes staleness observable to callers that care.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub generation: u64,
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    pub config: ConfigSlice,
    pub repos: ReposSlice,
    pub file_tree: FileTreeSlice,
    pub chat: ChatSlice,
    status: Option<StatusLine>,
    status_generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Replace the status line. Never queued: last write wins.
    pub fn set_status(&mut self, advisory: Advisory) {
        self.status_generation += 1;
        self.status = Some(StatusLine {
            generation: self.status_generation,
            severity: advisory.severity,
            text: advisory.text,
        });
    }

    /// Route one inbound event to the owning reducer and surface any status
    /// text it produced.
    pub fn apply_event(&mut self, event: Event) {
        let advisory = match event {
            Event::ConfigSuccess => self.config.on_success(),
            Event::ConfigError { message } => self.config.on_error(&message),
            Event::FileTreeData { tree, repository } => {
                self.file_tree.on_data(tree, repository.as_ref())
            }
            Event::FileTreeError { message } => self.file_tree.on_error(&message),
            Event::NewChatMessage(message) => self.chat.on_message(message),
            Event::AgentTyping { is_typing } => {
                self.chat.on_typing(is_typing);
                None
            }
            Event::RepositoriesList { repositories } => {
                let before = self.repos.selected_id().map(str::to_owned);
                let advisory = self.repos.on_list(repositories);
                self.sync_tree_context(before.as_deref());
                advisory
            }
            Event::RepositoryActionSuccess {
                action,
                repository_id,
                repository: _,
            } => {
                let before = self.repos.selected_id().map(str::to_owned);
                let advisory = self
                    .repos
                    .on_action_success(action, repository_id.as_deref());
                if action == RepoAction::Select {
                    self.sync_tree_context(before.as_deref());
                }
                advisory
            }
            Event::RepositoryActionError { message } => self.repos.on_action_error(&message),
            Event::Unknown { kind } => {
                tracing::warn!("ignoring unknown event type: {}", kind);
                None
            }
        };
        if let Some(advisory) = advisory {
            self.set_status(advisory);
        }
    }

    /// Session reset: configuration, chat and file tree are invalidated; the
    /// repository registry stays for resync from the next REPOSITORIES_LIST.
    pub fn reset(&mut self) {
        self.config.reset();
        self.chat.reset();
        self.file_tree.reset();
        self.set_status(Advisory::normal("Session reset"));
    }

    /// Force the file-tree context to follow a selection change. The new
    /// selection is read once here and passed in explicitly.
    fn sync_tree_context(&mut self, before: Option<&str>) {
        let after = self.repos.selected_id().map(str::to_owned);
        if after.as_deref() != before {
            self.file_tree.switch_repo(after.as_deref());
        }
    }
}
