//! Wire protocol message types and codec
//!
//! Defines the JSON message format exchanged with the backend. Every frame is
//! an object with a `type` discriminant and a `payload` object. Field
//! spellings follow the backend exactly (`agentCredential`, `repository_id`,
//! `isTyping`), so the serde renames here are load-bearing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-to-server message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    #[serde(rename = "SUBMIT_CONFIG")]
    SubmitConfig(ConfigData),
    #[serde(rename = "FETCH_FILES")]
    FetchFiles { repository_id: String },
    #[serde(rename = "SEND_CHAT_MESSAGE")]
    SendChatMessage { text: String },
    #[serde(rename = "ADD_REPOSITORY")]
    AddRepository { repository: RepositoryDraft },
    #[serde(rename = "UPDATE_REPOSITORY")]
    UpdateRepository {
        repository_id: String,
        repository: RepositoryDraft,
    },
    #[serde(rename = "DELETE_REPOSITORY")]
    DeleteRepository { repository_id: String },
    #[serde(rename = "SELECT_REPOSITORY")]
    SelectRepository { repository_id: String },
}

/// Server-to-client message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    #[serde(rename = "CONFIG_SUCCESS")]
    ConfigSuccess,
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError { message: String },
    #[serde(rename = "FILE_TREE_DATA")]
    FileTreeData {
        tree: Vec<FileNode>,
        #[serde(default)]
        repository: Option<RepositoryRecord>,
    },
    #[serde(rename = "FILE_TREE_ERROR")]
    FileTreeError { message: String },
    #[serde(rename = "NEW_CHAT_MESSAGE")]
    NewChatMessage(ChatMessage),
    #[serde(rename = "AGENT_TYPING")]
    AgentTyping {
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    #[serde(rename = "REPOSITORIES_LIST")]
    RepositoriesList {
        repositories: Vec<RepositoryRecord>,
    },
    #[serde(rename = "REPOSITORY_ACTION_SUCCESS")]
    RepositoryActionSuccess {
        action: RepoAction,
        #[serde(default)]
        repository_id: Option<String>,
        #[serde(default)]
        repository: Option<RepositoryRecord>,
    },
    #[serde(rename = "REPOSITORY_ACTION_ERROR")]
    RepositoryActionError { message: String },
    /// Unrecognized discriminant. Routed for logging, never constructed by
    /// the derived deserializer (see [`decode`]).
    #[serde(skip)]
    Unknown { kind: String },
}

/// Discriminants the typed deserializer understands. A frame whose tag is not
/// listed here decodes to [`Event::Unknown`] instead of an error, so
/// forward-compatible additions do not kill the session.
const KNOWN_EVENT_TAGS: &[&str] = &[
    "CONFIG_SUCCESS",
    "CONFIG_ERROR",
    "FILE_TREE_DATA",
    "FILE_TREE_ERROR",
    "NEW_CHAT_MESSAGE",
    "AGENT_TYPING",
    "REPOSITORIES_LIST",
    "REPOSITORY_ACTION_SUCCESS",
    "REPOSITORY_ACTION_ERROR",
];

/// Configuration submitted to the backend; replaced wholesale on re-submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(rename = "agentCredential")]
    pub agent_credential: String,
    #[serde(default)]
    pub repositories: Vec<RepositoryDraft>,
}

/// Client-side repository description. The `token` is write-only: the server
/// never echoes it back, and updates may omit it to mean "retain existing".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDraft {
    pub name: String,
    pub url: String,
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Server-confirmed repository record. Token-free, with a server-assigned id
/// unique across the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(default)]
    pub created_at: i64,
}

/// One node of a repository file tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileNodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNodeKind {
    File,
    Directory,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    /// Server-pushed notices (e.g. agent failures) arrive in the transcript
    /// under this sender.
    System,
}

/// Repository action kind echoed in REPOSITORY_ACTION_SUCCESS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoAction {
    Add,
    Update,
    Delete,
    Select,
}

impl std::fmt::Display for RepoAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoAction::Add => write!(f, "add"),
            RepoAction::Update => write!(f, "update"),
            RepoAction::Delete => write!(f, "delete"),
            RepoAction::Select => write!(f, "select"),
        }
    }
}

/// Decode failure for an inbound frame. Both variants are protocol errors:
/// the router logs and drops the frame, the session continues.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("bad payload for {kind}: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Serialize an outgoing command to wire form. Total over every [`Command`]
/// variant: nothing in these types can fail to serialize, so the error arm
/// exists only to satisfy serde's signature.
pub fn encode(command: &Command) -> serde_json::Result<String> {
    serde_json::to_string(command)
}

/// Parse an inbound wire payload into a typed [`Event`].
///
/// Unknown discriminants map to [`Event::Unknown`]; a recognized discriminant
/// with a payload that does not match its schema is a [`DecodeError`].
pub fn decode(raw: &str) -> std::result::Result<Event, DecodeError> {
    let envelope: Envelope = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;
    match serde_json::from_str::<Event>(raw) {
        Ok(event) => Ok(event),
        Err(_) if !KNOWN_EVENT_TAGS.contains(&envelope.kind.as_str()) => Ok(Event::Unknown {
            kind: envelope.kind,
        }),
        Err(source) => Err(DecodeError::Payload {
            kind: envelope.kind,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_submit_config_uses_backend_field_names() {
        let cmd = Command::SubmitConfig(ConfigData {
            agent_credential: "abc".into(),
            repositories: vec![],
        });
        let json: serde_json::Value = serde_json::from_str(&encode(&cmd).unwrap()).unwrap();
        assert_eq!(json["type"], "SUBMIT_CONFIG");
        assert_eq!(json["payload"]["agentCredential"], "abc");
        assert_eq!(json["payload"]["repositories"], serde_json::json!([]));
    }

    #[test]
    fn encode_update_repository_omits_missing_token() {
        let cmd = Command::UpdateRepository {
            repository_id: "r1".into(),
            repository: RepositoryDraft {
                name: "app".into(),
                url: "https://github.com/user/app".into(),
                host: "github.com".into(),
                owner: "user".into(),
                repo: "app".into(),
                branch: "main".into(),
                token: None,
            },
        };
        let json: serde_json::Value = serde_json::from_str(&encode(&cmd).unwrap()).unwrap();
        assert_eq!(json["payload"]["repository_id"], "r1");
        assert!(json["payload"]["repository"].get("token").is_none());
    }

    #[test]
    fn decode_config_success_without_payload() {
        let event = decode(r#"{"type":"CONFIG_SUCCESS"}"#).unwrap();
        assert_eq!(event, Event::ConfigSuccess);
    }

    #[test]
    fn decode_new_chat_message() {
        let raw = r#"{"type":"NEW_CHAT_MESSAGE","payload":{"id":"m1","sender":"agent","text":"hi","timestamp":1700000000000}}"#;
        match decode(raw).unwrap() {
            Event::NewChatMessage(msg) => {
                assert_eq!(msg.sender, Sender::Agent);
                assert_eq!(msg.text, "hi");
            }
            other => panic!("expected NewChatMessage, got {:?}", other),
        }
    }

    #[test]
    fn decode_agent_typing_camel_case() {
        let event = decode(r#"{"type":"AGENT_TYPING","payload":{"isTyping":true}}"#).unwrap();
        assert_eq!(event, Event::AgentTyping { is_typing: true });
    }

    #[test]
    fn decode_file_tree_with_null_children() {
        let raw = r#"{"type":"FILE_TREE_DATA","payload":{"tree":[{"id":"n1","name":"README.md","path":"README.md","type":"file","children":null}],"repository":null}}"#;
        match decode(raw).unwrap() {
            Event::FileTreeData { tree, repository } => {
                assert_eq!(tree.len(), 1);
                assert_eq!(tree[0].id, "n1");
                assert_eq!(tree[0].kind, FileNodeKind::File);
                assert!(repository.is_none());
            }
            other => panic!("expected FileTreeData, got {:?}", other),
        }
    }

    #[test]
    fn decode_file_node_without_id_defaults_it() {
        let raw = r#"{"type":"FILE_TREE_DATA","payload":{"tree":[{"name":"a.rs","path":"a.rs","type":"file"}],"repository":null}}"#;
        match decode(raw).unwrap() {
            Event::FileTreeData { tree, .. } => assert_eq!(tree[0].id, ""),
            other => panic!("expected FileTreeData, got {:?}", other),
        }
    }

    #[test]
    fn decode_unknown_tag_is_not_an_error() {
        let event = decode(r#"{"type":"SERVER_HEARTBEAT","payload":{"seq":7}}"#).unwrap();
        assert_eq!(
            event,
            Event::Unknown {
                kind: "SERVER_HEARTBEAT".into()
            }
        );
    }

    #[test]
    fn decode_malformed_frame_is_an_error() {
        assert!(matches!(
            decode("not json"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn decode_known_tag_with_bad_payload_is_an_error() {
        let err = decode(r#"{"type":"CONFIG_ERROR","payload":{"msg":"oops"}}"#).unwrap_err();
        match err {
            DecodeError::Payload { kind, .. } => assert_eq!(kind, "CONFIG_ERROR"),
            other => panic!("expected Payload error, got {:?}", other),
        }
    }

    #[test]
    fn every_known_tag_parses_to_its_typed_variant() {
        // One minimal frame per known discriminant. A tag listed as known
        // must parse through the typed deserializer, never fall through to
        // the unknown-event path.
        let frames: &[(&str, &str)] = &[
            ("CONFIG_SUCCESS", r#"{"type":"CONFIG_SUCCESS"}"#),
            (
                "CONFIG_ERROR",
                r#"{"type":"CONFIG_ERROR","payload":{"message":"m"}}"#,
            ),
            (
                "FILE_TREE_DATA",
                r#"{"type":"FILE_TREE_DATA","payload":{"tree":[],"repository":null}}"#,
            ),
            (
                "FILE_TREE_ERROR",
                r#"{"type":"FILE_TREE_ERROR","payload":{"message":"m"}}"#,
            ),
            (
                "NEW_CHAT_MESSAGE",
                r#"{"type":"NEW_CHAT_MESSAGE","payload":{"id":"m1","sender":"user","text":"t","timestamp":1}}"#,
            ),
            (
                "AGENT_TYPING",
                r#"{"type":"AGENT_TYPING","payload":{"isTyping":false}}"#,
            ),
            (
                "REPOSITORIES_LIST",
                r#"{"type":"REPOSITORIES_LIST","payload":{"repositories":[]}}"#,
            ),
            (
                "REPOSITORY_ACTION_SUCCESS",
                r#"{"type":"REPOSITORY_ACTION_SUCCESS","payload":{"action":"select","repository_id":"r1"}}"#,
            ),
            (
                "REPOSITORY_ACTION_ERROR",
                r#"{"type":"REPOSITORY_ACTION_ERROR","payload":{"message":"m"}}"#,
            ),
        ];
        assert_eq!(
            frames.len(),
            KNOWN_EVENT_TAGS.len(),
            "known-tag list and frame fixtures are out of step"
        );
        for (tag, raw) in frames {
            assert!(
                KNOWN_EVENT_TAGS.contains(tag),
                "{tag} is missing from the known-tag list"
            );
            if let Event::Unknown { kind } = decode(raw).unwrap() {
                panic!("{kind} fell through to the unknown-event path");
            }
        }
    }

    #[test]
    fn repo_action_roundtrip() {
        let raw = r#"{"type":"REPOSITORY_ACTION_SUCCESS","payload":{"action":"delete","repository_id":"r2"}}"#;
        match decode(raw).unwrap() {
            Event::RepositoryActionSuccess {
                action,
                repository_id,
                repository,
            } => {
                assert_eq!(action, RepoAction::Delete);
                assert_eq!(repository_id.as_deref(), Some("r2"));
                assert!(repository.is_none());
            }
            other => panic!("expected RepositoryActionSuccess, got {:?}", other),
        }
    }
}
