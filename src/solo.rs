//! Line-oriented front end for the single-user journal and scratchpad.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::console::{parse_decision_fields, render_block};
use crate::models::BlockKind;
use crate::services::insight_service::InsightGenerator;
use crate::services::journal_service::Journal;
use crate::services::scratchpad_service::Scratchpad;
use crate::services::storage_service::KeyValueStore;

pub const HELP: &str = "\
commands:
  /sessions                               list sessions
  /new                                    start a new session
  /open <session id>                      switch session
  /rename <title>                         rename the active session
  /delete <session id>                    delete a session
  /note <text>                            add a note
  /task <text>                            add a task
  /done <block id>                        toggle a task
  /decide <decision> | <problem> | <option; option> | <rationale>
  /ask <question>                         ask the AI about this session
  /review                                 ask the AI for an unprompted review
  /pad [text]                             add to (or show) the scratchpad
  /unpad <item id>                        remove a scratchpad item
  /list                                   show the active session
  /help                                   this text
  <text>                                  add a note";

#[derive(Debug, PartialEq, Eq)]
pub enum SoloCommand {
    Sessions,
    NewSession,
    OpenSession(String),
    Rename(String),
    DeleteSession(String),
    AddBlock { kind: BlockKind, content: String },
    ToggleTask(String),
    Ask(String),
    Review,
    Pad(Option<String>),
    Unpad(String),
    List,
    Help,
}

/// Parses one input line. Blank lines parse to `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<SoloCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if !line.starts_with('/') {
        return Ok(Some(SoloCommand::AddBlock {
            kind: BlockKind::Note,
            content: line.to_string(),
        }));
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
        "/sessions" => SoloCommand::Sessions,
        "/new" => SoloCommand::NewSession,
        "/open" => SoloCommand::OpenSession(needs_arg("a session id")?),
        "/rename" => SoloCommand::Rename(needs_arg("a title")?),
        "/delete" => SoloCommand::DeleteSession(needs_arg("a session id")?),
        "/note" => SoloCommand::AddBlock {
            kind: BlockKind::Note,
            content: needs_arg("some text")?,
        },
        "/task" => SoloCommand::AddBlock {
            kind: BlockKind::task(),
            content: needs_arg("some text")?,
        },
        "/decide" => {
            let (kind, content) = parse_decision_fields(&needs_arg("a decision")?)?;
            SoloCommand::AddBlock { kind, content }
        }
        "/done" => SoloCommand::ToggleTask(needs_arg("a block id")?),
        "/ask" => SoloCommand::Ask(needs_arg("a question")?),
        "/review" => SoloCommand::Review,
        "/pad" => SoloCommand::Pad(Some(rest.to_string()).filter(|t| !t.is_empty())),
        "/unpad" => SoloCommand::Unpad(needs_arg("an item id")?),
        "/list" => SoloCommand::List,
        "/help" => SoloCommand::Help,
        other => return Err(format!("unknown command {}", other)),
    };
    Ok(Some(command))
}

/// Journal, scratchpad and insight generator behind the solo console.
pub struct SoloConsole<S: KeyValueStore, G: InsightGenerator> {
    journal: Journal<S>,
    scratchpad: Scratchpad<S>,
    insights: G,
}

impl<S: KeyValueStore, G: InsightGenerator> SoloConsole<S, G> {
    pub fn new(journal: Journal<S>, scratchpad: Scratchpad<S>, insights: G) -> Self {
        Self {
            journal,
            scratchpad,
            insights,
        }
    }

    pub fn journal(&self) -> &Journal<S> {
        &self.journal
    }

    pub fn scratchpad(&self) -> &Scratchpad<S> {
        &self.scratchpad
    }

    fn render_sessions(&self) -> String {
        let active = self.journal.active_session_id();
        self.journal
            .sessions()
            .iter()
            .map(|s| {
                let marker = if Some(s.id.as_str()) == active { "*" } else { " " };
                format!("{} {} ({}) {} blocks", marker, s.title, s.id, s.blocks.len())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_active(&self) -> String {
        let Some(session) = self.journal.active_session() else {
            return "no session selected".to_string();
        };
        let mut out = format!("# {} ({})", session.title, session.id);
        for block in &session.blocks {
            out.push('\n');
            out.push_str(&render_block(block));
        }
        out
    }

    fn render_scratchpad(&self) -> String {
        if self.scratchpad.items().is_empty() {
            return "scratchpad is empty".to_string();
        }
        self.scratchpad
            .items()
            .iter()
            .map(|i| format!("  {} {}", i.id, i.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs one command and returns what to show the user.
    pub async fn execute(&mut self, command: SoloCommand) -> String {
        debug!("Solo command {:?}", command);
        let result = match command {
            SoloCommand::Sessions => Ok(self.render_sessions()),
            SoloCommand::NewSession => {
                let id = self.journal.create_session();
                Ok(format!("started session {}", id))
            }
            SoloCommand::OpenSession(id) => self.journal.select_session(&id).map(|_| self.render_active()),
            SoloCommand::Rename(title) => match self.journal.active_session_id().map(str::to_string) {
                Some(id) => self.journal.rename_session(&id, &title).map(|_| format!("renamed to {}", title)),
                None => Ok("no session selected".to_string()),
            },
            SoloCommand::DeleteSession(id) => self.journal.delete_session(&id).map(|_| format!("deleted {}", id)),
            SoloCommand::AddBlock { kind, content } => self.journal.add_block(kind, &content).map(|b| render_block(&b)),
            SoloCommand::ToggleTask(id) => self
                .journal
                .toggle_task(&id)
                .map(|done| if done { "task done" } else { "task reopened" }.to_string()),
            SoloCommand::Ask(query) => self.journal.ask_ai(&self.insights, &query).await.map(|b| b.content),
            SoloCommand::Review => self.journal.review(&self.insights).await.map(|b| b.content),
            SoloCommand::Pad(Some(text)) => Ok(match self.scratchpad.add(&text) {
                Some(item) => format!("  {} {}", item.id, item.content),
                None => "nothing to add".to_string(),
            }),
            SoloCommand::Pad(None) => Ok(self.render_scratchpad()),
            SoloCommand::Unpad(id) => Ok(if self.scratchpad.remove(&id) {
                format!("removed {}", id)
            } else {
                format!("no scratchpad item {}", id)
            }),
            SoloCommand::List => Ok(self.render_active()),
            SoloCommand::Help => Ok(HELP.to_string()),
        };
        result.unwrap_or_else(|e| {
            warn!("Journal command rejected: {}", e);
            e.to_string()
        })
    }

    /// Reads commands from stdin until EOF.
    pub async fn run(mut self) {
        info!("Journal open with {} sessions", self.journal.sessions().len());
        println!("{}", HELP);
        println!("{}", self.render_active());
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
            match parse_line(&line) {
                Ok(Some(command)) => println!("{}", self.execute(command).await),
                Ok(None) => continue,
                Err(e) => println!("{}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use super::*;
    use crate::models::{Block, BlockType};
    use crate::services::journal_service::NEW_SESSION_TITLE;
    use crate::services::storage_service::MemoryStore;

    struct Canned;

    impl InsightGenerator for Canned {
        fn generate_insight(&self, blocks: &[Block], query: Option<&str>) -> impl Future<Output = String> + Send {
            let answer = format!("{} blocks, query {:?}", blocks.len(), query);
            async move { answer }
        }
    }

    fn console() -> SoloConsole<MemoryStore, Canned> {
        SoloConsole::new(
            Journal::open(MemoryStore::new()),
            Scratchpad::open(MemoryStore::new()),
            Canned,
        )
    }

    #[test]
    fn plain_text_is_a_note() {
        assert_eq!(
            parse_line("remember the cache"),
            Ok(Some(SoloCommand::AddBlock {
                kind: BlockKind::Note,
                content: "remember the cache".into(),
            }))
        );
        assert_eq!(parse_line("/pad"), Ok(Some(SoloCommand::Pad(None))));
        assert!(parse_line("/ask").is_err());
        assert!(parse_line("/decide use files |  | a; b |  ").is_err());
    }

    #[tokio::test]
    async fn first_note_titles_the_session() {
        let mut console = console();
        assert_eq!(console.journal().active_session().unwrap().title, NEW_SESSION_TITLE);

        console.execute(parse_line("Cache invalidation plan\nmore").unwrap().unwrap()).await;

        assert_eq!(console.journal().active_session().unwrap().title, "Cache invalidation plan");
    }

    #[tokio::test]
    async fn ask_records_question_and_answer() {
        let mut console = console();
        console.execute(SoloCommand::AddBlock {
            kind: BlockKind::Note,
            content: "context".into(),
        })
        .await;

        let answer = console.execute(SoloCommand::Ask("why?".into())).await;

        assert_eq!(answer, "2 blocks, query Some(\"why?\")");
        let types: Vec<BlockType> = console
            .journal()
            .active_session()
            .unwrap()
            .blocks
            .iter()
            .map(Block::block_type)
            .collect();
        assert_eq!(types, vec![BlockType::Note, BlockType::AiUserMsg, BlockType::AiInsight]);
    }

    #[tokio::test]
    async fn rejected_commands_report_the_error() {
        let mut console = console();
        let out = console.execute(SoloCommand::ToggleTask("missing".into())).await;
        assert!(out.contains("missing"));
        let out = console.execute(SoloCommand::OpenSession("nope".into())).await;
        assert!(out.contains("nope"));
    }

    #[tokio::test]
    async fn scratchpad_lists_newest_first() {
        let mut console = console();
        console.execute(SoloCommand::Pad(Some("first-item".into()))).await;
        console.execute(SoloCommand::Pad(Some("second-item".into()))).await;

        let listing = console.execute(SoloCommand::Pad(None)).await;
        let second = listing.find("second-item").unwrap();
        let first = listing.find("first-item").unwrap();
        assert!(second < first);

        let id = console.scratchpad().items()[0].id.clone();
        assert_eq!(console.execute(SoloCommand::Unpad(id.clone())).await, format!("removed {}", id));
        assert_eq!(console.scratchpad().items().len(), 1);
    }
}
