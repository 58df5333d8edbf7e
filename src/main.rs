//! Workbench shell
//!
//! A minimal headless front end for the session engine: connects to the
//! backend, forwards stdin lines to the dispatcher, and prints transcript and
//! status updates as snapshots arrive. Real presentation layers render
//! [`workbench_client::SessionStore`] snapshots instead.
//!
//! # Usage
//!
//! ```bash
//! workbench-shell --url ws://127.0.0.1:8000/ws --credential $AGENT_KEY
//! ```

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use workbench_client::session::file_tree::FileTreePhase;
use workbench_client::{
    ConfigData, ConnectionManager, FileNode, Request, Sender, SessionEngine, SessionStore,
};

/// Workbench backend shell
#[derive(Parser, Debug)]
#[command(name = "workbench-shell")]
#[command(about = "Headless shell for the workbench coding-agent backend")]
struct Args {
    /// Backend WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws", env = "WORKBENCH_URL")]
    url: String,

    /// Agent credential, submitted as the configuration on startup
    #[arg(long, env = "WORKBENCH_CREDENTIAL")]
    credential: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("workbench_client=info".parse()?)
                .add_directive("workbench_shell=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let (conn, inbound) = ConnectionManager::connect(args.url);
    let (engine, handle) = SessionEngine::new(conn, inbound);
    tokio::spawn(engine.run());

    if let Some(credential) = args.credential {
        handle
            .dispatch(Request::Configure(ConfigData {
                agent_credential: credential,
                repositories: vec![],
            }))
            .await?;
    }

    // Echo transcript entries and status lines as they land in the store.
    let mut snapshots = handle.snapshots();
    tokio::spawn(async move {
        let mut seen_messages = 0usize;
        let mut seen_status = 0u64;
        while snapshots.changed().await.is_ok() {
            let snap = snapshots.borrow_and_update().clone();
            let messages = snap.chat.messages();
            if seen_messages > messages.len() {
                // Transcript was reset.
                seen_messages = 0;
            }
            for msg in &messages[seen_messages..] {
                println!("{}: {}", sender_label(msg.sender), msg.text);
            }
            seen_messages = messages.len();
            if let Some(status) = snap.status() {
                if status.generation > seen_status {
                    seen_status = status.generation;
                    eprintln!("* {}", status.text);
                }
            }
        }
    });

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(':') {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("repos"), _) => {
                    for r in handle.snapshot().repos.records() {
                        println!("{}  {} ({}/{}@{})", r.id, r.name, r.owner, r.repo, r.branch);
                    }
                }
                (Some("select"), Some(id)) => {
                    handle
                        .dispatch(Request::SelectRepository {
                            repository_id: id.to_string(),
                        })
                        .await?;
                }
                (Some("files"), id) => {
                    let id = id
                        .map(str::to_string)
                        .or_else(|| handle.snapshot().repos.selected_id().map(str::to_string));
                    match id {
                        Some(repository_id) => {
                            handle
                                .dispatch(Request::FetchFileTree { repository_id })
                                .await?;
                        }
                        None => eprintln!("no repository selected"),
                    }
                }
                (Some("tree"), _) => print_tree(&handle.snapshot()),
                (Some("reset"), _) => handle.dispatch(Request::Reset).await?,
                (Some("quit"), _) => break,
                _ => print_help(),
            }
        } else {
            handle
                .dispatch(Request::SendChatMessage { text: line })
                .await?;
        }
    }

    Ok(())
}

fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Agent => "agent",
        Sender::System => "system",
    }
}

fn print_help() {
    eprintln!("commands: :repos  :select <id>  :files [<id>]  :tree  :reset  :quit");
    eprintln!("anything else is sent to the agent as a chat message");
}

fn print_tree(snapshot: &SessionStore) {
    match snapshot.file_tree.phase() {
        FileTreePhase::Idle => eprintln!("no file tree loaded"),
        FileTreePhase::Loading => eprintln!("file tree loading..."),
        FileTreePhase::Error(message) => eprintln!("file tree error: {message}"),
        FileTreePhase::Loaded(tree) => {
            for node in tree {
                print_node(node, 0);
            }
        }
    }
}

fn print_node(node: &FileNode, depth: usize) {
    println!("{}{}", "  ".repeat(depth), node.name);
    if let Some(children) = &node.children {
        for child in children {
            print_node(child, depth + 1);
        }
    }
}
