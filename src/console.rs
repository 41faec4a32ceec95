//! Line-oriented front end for a mesh peer.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::mesh::{NodeCommand, ReplicaView};
use crate::models::{Block, BlockKind, DecisionMetadata, DecisionStatus};

pub const HELP: &str = "\
commands:
  /stream <title> [| <persistence uri>]   create and select a stream
  /select <stream id>                     switch stream
  /note <text>                            add a note
  /task <text>                            add a task
  /done <block id>                        toggle a task
  /decide <decision> | <problem> | <option; option> | <rationale>
  /list                                   show the active stream
  /peers                                  show known peers
  /help                                   this text
  <text>                                  chat in the active stream";

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Edit(EditCommand),
    List,
    Peers,
    Help,
}

/// The subset of console input that becomes a [`NodeCommand`].
#[derive(Debug, PartialEq, Eq)]
pub enum EditCommand {
    CreateStream { title: String, persistence_uri: Option<String> },
    SelectStream(String),
    AddBlock { kind: BlockKind, content: String },
    ToggleTask(String),
    SendChat(String),
}

impl From<EditCommand> for NodeCommand {
    fn from(command: EditCommand) -> Self {
        match command {
            EditCommand::CreateStream { title, persistence_uri } => NodeCommand::CreateStream { title, persistence_uri },
            EditCommand::SelectStream(id) => NodeCommand::SelectStream(id),
            EditCommand::AddBlock { kind, content } => NodeCommand::AddBlock { kind, content },
            EditCommand::ToggleTask(id) => NodeCommand::ToggleTask(id),
            EditCommand::SendChat(text) => NodeCommand::SendChat(text),
        }
    }
}

fn split_fields(rest: &str) -> Vec<String> {
    rest.split('|').map(|f| f.trim().to_string()).collect()
}

const DECIDE_USAGE: &str = "usage: /decide <decision> | <problem> | <option; option> | <rationale>";

/// Parses `<decision> | <problem> | <option; option> | <rationale>` into a
/// block kind and its content. Decision, problem and rationale are required.
pub(crate) fn parse_decision_fields(rest: &str) -> Result<(BlockKind, String), String> {
    let fields = split_fields(rest);
    let [decision, problem, options, rationale] = fields.as_slice() else {
        return Err(DECIDE_USAGE.into());
    };
    if [decision, problem, rationale].iter().any(|f| f.is_empty()) {
        return Err(DECIDE_USAGE.into());
    }
    let options = options
        .split(';')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    let kind = BlockKind::Decision(DecisionMetadata {
        problem: problem.clone(),
        options,
        rationale: rationale.clone(),
        status: DecisionStatus::Decided,
    });
    Ok((kind, decision.clone()))
}

fn parse_decision(rest: &str) -> Result<EditCommand, String> {
    let (kind, content) = parse_decision_fields(rest)?;
    Ok(EditCommand::AddBlock { kind, content })
}

/// Parses one input line. Blank lines parse to `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(ConsoleCommand::Edit(EditCommand::SendChat(line.to_string()))));
    }

    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let needs_arg = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("{} needs {}", name, what))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match name {
        "/stream" => {
            let mut fields = split_fields(&needs_arg("a title")?).into_iter();
            let title = fields.next().unwrap_or_default();
            let persistence_uri = fields.next().filter(|uri| !uri.is_empty());
            ConsoleCommand::Edit(EditCommand::CreateStream { title, persistence_uri })
        }
        "/select" => ConsoleCommand::Edit(EditCommand::SelectStream(needs_arg("a stream id")?)),
        "/note" => ConsoleCommand::Edit(EditCommand::AddBlock {
            kind: BlockKind::Note,
            content: needs_arg("some text")?,
        }),
        "/task" => ConsoleCommand::Edit(EditCommand::AddBlock {
            kind: BlockKind::task(),
            content: needs_arg("some text")?,
        }),
        "/done" => ConsoleCommand::Edit(EditCommand::ToggleTask(needs_arg("a block id")?)),
        "/decide" => ConsoleCommand::Edit(parse_decision(&needs_arg("a decision")?)?),
        "/list" => ConsoleCommand::List,
        "/peers" => ConsoleCommand::Peers,
        "/help" => ConsoleCommand::Help,
        other => return Err(format!("unknown command {}", other)),
    };
    Ok(Some(command))
}

pub(crate) fn render_block(block: &Block) -> String {
    let marker = match block.is_completed() {
        Some(true) => "[x] ",
        Some(false) => "[ ] ",
        None => "",
    };
    format!("  {} {} {}{}", block.id, block.block_type(), marker, block.content)
}

pub fn render_stream(view: &ReplicaView) -> String {
    let Some(stream) = view.active_stream() else {
        return if view.synced {
            "no stream selected".to_string()
        } else {
            "waiting for a host snapshot...".to_string()
        };
    };
    let mut out = format!("# {} ({})\n", stream.title, stream.id);
    for block in &stream.blocks {
        out.push_str(&render_block(block));
        out.push('\n');
    }
    for message in &stream.messages {
        out.push_str(&format!(
            "  <{}> {} {}\n",
            message.sender_name,
            message.timestamp.format("%H:%M"),
            message.content
        ));
    }
    let others: Vec<String> = view
        .streams
        .iter()
        .filter(|s| s.id != stream.id)
        .map(|s| format!("{} ({})", s.title, s.id))
        .collect();
    if !others.is_empty() {
        out.push_str(&format!("other streams: {}\n", others.join(", ")));
    }
    out
}

pub fn render_peers(view: &ReplicaView) -> String {
    view.peers
        .iter()
        .map(|p| {
            let mut line = format!("  {} ({})", p.name, p.id);
            if p.is_host {
                line.push_str(" HOST");
            }
            if p.id == view.local.id {
                line.push_str(" (you)");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn inspect(commands: &mpsc::Sender<NodeCommand>) -> Option<ReplicaView> {
    let (tx, rx) = oneshot::channel();
    commands.send(NodeCommand::Inspect(tx)).await.ok()?;
    rx.await.ok()
}

/// Reads commands from stdin until EOF and forwards them to the node.
pub async fn run(commands: mpsc::Sender<NodeCommand>) {
    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                break;
            }
        };
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        debug!("Console command {:?}", command);
        let sent = match command {
            ConsoleCommand::Edit(edit) => commands.send(edit.into()).await.is_ok(),
            ConsoleCommand::List => match inspect(&commands).await {
                Some(view) => {
                    println!("{}", render_stream(&view));
                    true
                }
                None => false,
            },
            ConsoleCommand::Peers => match inspect(&commands).await {
                Some(view) => {
                    println!("{}", render_peers(&view));
                    true
                }
                None => false,
            },
            ConsoleCommand::Help => {
                println!("{}", HELP);
                true
            }
        };
        if !sent {
            warn!("Mesh node is gone, leaving console");
            break;
        }
    }
}
