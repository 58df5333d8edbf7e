//! Command dispatcher
//!
//! The public request surface for the presentation layer. Each operation
//! validates its required fields, applies the optimistic local transition to
//! the store, sets the advisory status, and returns the [`Command`] to put on
//! the wire. Validation failures leave the store untouched apart from the
//! status line.
//!
//! The protocol has no per-command correlation ids, so two in-flight
//! mutations of the same kind could not be told apart. The dispatcher rules
//! the situation out instead: only one mutating repository command (add,
//! update, delete) may be outstanding at a time.

use thiserror::Error;

use crate::session::protocol::{Command, ConfigData, RepoAction, RepositoryDraft};
use crate::session::store::{Advisory, SessionStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("agent credential must not be empty")]
    MissingCredential,

    #[error("repository {field} is required")]
    MissingField { field: &'static str },

    #[error("a credential token is required when adding a repository")]
    MissingToken,

    #[error("unknown repository id: {id}")]
    UnknownRepository { id: String },

    #[error("another repository {action} is still in flight")]
    MutationInFlight { action: RepoAction },

    #[error("message text must not be empty")]
    EmptyMessage,
}

/// Submit the whole configuration. Requires a non-empty credential; the
/// previous configuration is replaced wholesale once the server accepts.
pub fn configure(store: &mut SessionStore, data: ConfigData) -> Result<Command, DispatchError> {
    if data.agent_credential.trim().is_empty() {
        return Err(DispatchError::MissingCredential);
    }
    store.config.begin_submit();
    store.set_status(Advisory::normal("Submitting configuration..."));
    Ok(Command::SubmitConfig(data))
}

/// Fetch the file tree for a registered repository. Any previously loaded
/// tree is cleared before the request goes out.
pub fn fetch_file_tree(
    store: &mut SessionStore,
    repository_id: &str,
) -> Result<Command, DispatchError> {
    ensure_known(store, repository_id)?;
    store.file_tree.begin_fetch(repository_id);
    store.set_status(Advisory::normal("Loading file tree..."));
    Ok(Command::FetchFiles {
        repository_id: repository_id.to_string(),
    })
}

/// Request a new repository. The token is required here; the registry is not
/// touched until the server's next REPOSITORIES_LIST.
pub fn add_repository(
    store: &mut SessionStore,
    repository: RepositoryDraft,
) -> Result<Command, DispatchError> {
    validate_draft(&repository)?;
    if repository.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(DispatchError::MissingToken);
    }
    ensure_no_mutation(store)?;
    store.repos.begin_mutation(RepoAction::Add);
    store.set_status(Advisory::normal("Adding repository..."));
    Ok(Command::AddRepository { repository })
}

/// Request an update. The token may be omitted to mean "retain existing";
/// honoring that is the server's job.
pub fn update_repository(
    store: &mut SessionStore,
    repository_id: &str,
    repository: RepositoryDraft,
) -> Result<Command, DispatchError> {
    ensure_known(store, repository_id)?;
    validate_draft(&repository)?;
    ensure_no_mutation(store)?;
    store.repos.begin_mutation(RepoAction::Update);
    store.set_status(Advisory::normal("Updating repository..."));
    Ok(Command::UpdateRepository {
        repository_id: repository_id.to_string(),
        repository,
    })
}

pub fn delete_repository(
    store: &mut SessionStore,
    repository_id: &str,
) -> Result<Command, DispatchError> {
    ensure_known(store, repository_id)?;
    ensure_no_mutation(store)?;
    store.repos.begin_mutation(RepoAction::Delete);
    store.set_status(Advisory::normal("Deleting repository..."));
    Ok(Command::DeleteRepository {
        repository_id: repository_id.to_string(),
    })
}

/// Select a repository. Applied optimistically so the interface stays
/// responsive; the file-tree context follows immediately rather than waiting
/// for the server echo.
pub fn select_repository(
    store: &mut SessionStore,
    repository_id: &str,
) -> Result<Command, DispatchError> {
    ensure_known(store, repository_id)?;
    store.repos.select_local(repository_id);
    store.file_tree.switch_repo(Some(repository_id));
    store.set_status(Advisory::normal("Repository selected"));
    Ok(Command::SelectRepository {
        repository_id: repository_id.to_string(),
    })
}

/// Send a chat message, appending it to the transcript before any server
/// acknowledgement.
pub fn send_chat_message(store: &mut SessionStore, text: &str) -> Result<Command, DispatchError> {
    if text.trim().is_empty() {
        return Err(DispatchError::EmptyMessage);
    }
    store.chat.push_local(text);
    store.set_status(Advisory::normal("Message sent"));
    Ok(Command::SendChatMessage {
        text: text.to_string(),
    })
}

fn validate_draft(draft: &RepositoryDraft) -> Result<(), DispatchError> {
    for (field, value) in [
        ("name", &draft.name),
        ("owner", &draft.owner),
        ("repo", &draft.repo),
    ] {
        if value.trim().is_empty() {
            return Err(DispatchError::MissingField { field });
        }
    }
    Ok(())
}

fn ensure_known(store: &SessionStore, repository_id: &str) -> Result<(), DispatchError> {
    if store.repos.get(repository_id).is_none() {
        return Err(DispatchError::UnknownRepository {
            id: repository_id.to_string(),
        });
    }
    Ok(())
}

fn ensure_no_mutation(store: &SessionStore) -> Result<(), DispatchError> {
    if let Some(action) = store.repos.mutation_in_flight() {
        return Err(DispatchError::MutationInFlight { action });
    }
    Ok(())
}
