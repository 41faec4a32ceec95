use tracing::{error, info};

use super::insight_service::InsightGenerator;
use super::storage_service::{self, KeyValueStore};
use crate::error::JournalError;
use crate::models::{block, Block, BlockKind, BlockType, Session};
use crate::utils::clock;

pub const NEW_SESSION_TITLE: &str = "New Stream";
const AUTO_TITLE_CHARS: usize = 30;

/// Single-user thought streams, persisted after every change.
pub struct Journal<S: KeyValueStore> {
    store: S,
    sessions: Vec<Session>,
    active_session_id: Option<String>,
}

impl<S: KeyValueStore> Journal<S> {
    /// Loads saved sessions and selects the first. An empty journal starts
    /// with one fresh session.
    pub fn open(store: S) -> Self {
        let sessions = storage_service::load_sessions(&store);
        info!("Loaded {} sessions", sessions.len());
        let active_session_id = sessions.first().map(|s| s.id.clone());
        let mut journal = Self {
            store,
            sessions,
            active_session_id,
        };
        if journal.sessions.is_empty() {
            journal.create_session();
        }
        journal
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        let id = self.active_session_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    fn active_session_mut(&mut self) -> Result<&mut Session, JournalError> {
        let id = self.active_session_id.as_deref().ok_or(JournalError::NoActiveSession)?;
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(JournalError::NoActiveSession)
    }

    fn persist(&self) {
        if let Err(e) = storage_service::save_sessions(&self.store, &self.sessions) {
            error!("Failed to save sessions: {}", e);
        }
    }

    /// Creates an empty session at the top of the list and selects it.
    pub fn create_session(&mut self) -> String {
        let session = Session::new(NEW_SESSION_TITLE);
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.active_session_id = Some(id.clone());
        self.persist();
        id
    }

    pub fn select_session(&mut self, id: &str) -> Result<(), JournalError> {
        if !self.sessions.iter().any(|s| s.id == id) {
            return Err(JournalError::UnknownSession(id.to_string()));
        }
        self.active_session_id = Some(id.to_string());
        Ok(())
    }

    pub fn rename_session(&mut self, id: &str, title: &str) -> Result<(), JournalError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| JournalError::UnknownSession(id.to_string()))?;
        session.title = title.to_string();
        session.updated_at = clock::now();
        self.persist();
        Ok(())
    }

    /// Deletes a session. If it was selected, the first remaining one is.
    pub fn delete_session(&mut self, id: &str) -> Result<(), JournalError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| JournalError::UnknownSession(id.to_string()))?;
        self.sessions.remove(index);
        if self.active_session_id.as_deref() == Some(id) {
            self.active_session_id = self.sessions.first().map(|s| s.id.clone());
        }
        self.persist();
        Ok(())
    }

    /// Appends a block to the active session.
    ///
    /// The first note written into an untitled session names it after its
    /// first line.
    pub fn add_block(&mut self, kind: BlockKind, content: &str) -> Result<Block, JournalError> {
        let session = self.active_session_mut()?;
        if session.blocks.is_empty() && kind.block_type() == BlockType::Note && session.title == NEW_SESSION_TITLE {
            let first_line: String = content
                .lines()
                .next()
                .unwrap_or_default()
                .chars()
                .take(AUTO_TITLE_CHARS)
                .collect();
            if !first_line.is_empty() {
                session.title = first_line;
            }
        }
        let block = Block::new(kind, content);
        session.blocks.push(block.clone());
        session.updated_at = clock::now();
        self.persist();
        Ok(block)
    }

    /// Flips a task in the active session. Returns the new completion flag.
    pub fn toggle_task(&mut self, block_id: &str) -> Result<bool, JournalError> {
        let session = self.active_session_mut()?;
        let completed = block::toggle_task(&mut session.blocks, block_id)
            .ok_or_else(|| JournalError::NotATask(block_id.to_string()))?;
        self.persist();
        Ok(completed)
    }

    /// Records the question, asks the generator about the session and
    /// records its answer. Returns the answer block.
    pub async fn ask_ai<G: InsightGenerator>(&mut self, generator: &G, query: &str) -> Result<Block, JournalError> {
        self.add_block(BlockKind::AiUserMsg, query)?;
        let blocks = self.active_session_mut()?.blocks.clone();
        let insight = generator.generate_insight(&blocks, Some(query)).await;
        self.add_block(BlockKind::AiInsight, &insight)
    }

    /// Asks the generator for an unprompted review of the active session.
    pub async fn review<G: InsightGenerator>(&mut self, generator: &G) -> Result<Block, JournalError> {
        let blocks = self.active_session_mut()?.blocks.clone();
        let insight = generator.generate_insight(&blocks, None).await;
        self.add_block(BlockKind::AiInsight, &insight)
    }
}
