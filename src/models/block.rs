use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{clock, ids};

/// Wire tag of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Note,
    Task,
    Decision,
    AiInsight,
    AiUserMsg,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Note => write!(f, "NOTE"),
            BlockType::Task => write!(f, "TASK"),
            BlockType::Decision => write!(f, "DECISION"),
            BlockType::AiInsight => write!(f, "AI_INSIGHT"),
            BlockType::AiUserMsg => write!(f, "AI_USER_MSG"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionStatus {
    Proposed,
    Decided,
    Revoked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMetadata {
    pub problem: String,
    pub options: Vec<String>,
    pub rationale: String,
    pub status: DecisionStatus,
}

/// What a block is, together with the metadata that kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Note,
    Task(TaskMetadata),
    Decision(DecisionMetadata),
    AiInsight,
    AiUserMsg,
}

impl BlockKind {
    /// An open task.
    pub fn task() -> Self {
        BlockKind::Task(TaskMetadata::default())
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Note => BlockType::Note,
            BlockKind::Task(_) => BlockType::Task,
            BlockKind::Decision(_) => BlockType::Decision,
            BlockKind::AiInsight => BlockType::AiInsight,
            BlockKind::AiUserMsg => BlockType::AiUserMsg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: String,
    pub kind: BlockKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Block {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id: ids::generate_id(),
            kind,
            content: content.into(),
            timestamp: clock::now(),
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    /// Completion flag, `None` for anything that is not a task.
    pub fn is_completed(&self) -> Option<bool> {
        match &self.kind {
            BlockKind::Task(meta) => Some(meta.completed),
            _ => None,
        }
    }

    /// Flips the completion flag of a task and returns the new value.
    pub fn toggle_completed(&mut self) -> Option<bool> {
        match &mut self.kind {
            BlockKind::Task(meta) => {
                meta.completed = !meta.completed;
                Some(meta.completed)
            }
            _ => None,
        }
    }
}

/// Toggles the task with `block_id` in place. Other blocks are left untouched.
pub fn toggle_task(blocks: &mut [Block], block_id: &str) -> Option<bool> {
    blocks
        .iter_mut()
        .find(|b| b.id == block_id)
        .and_then(Block::toggle_completed)
}

// Wire shape: `{id, type, content, timestamp, metadata?}` where `metadata`
// depends on `type`. It is read loosely and only interpreted for kinds that
// carry metadata; anything sent along with other kinds is ignored.
#[derive(Serialize, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    block_type: BlockType,
    content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl TryFrom<RawBlock> for Block {
    type Error = String;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let mismatch = |e: serde_json::Error| {
            format!(
                "block '{}' of type {} carries mismatched metadata: {}",
                raw.id, raw.block_type, e
            )
        };
        let kind = match raw.block_type {
            BlockType::Note => BlockKind::Note,
            BlockType::AiInsight => BlockKind::AiInsight,
            BlockType::AiUserMsg => BlockKind::AiUserMsg,
            BlockType::Task => match raw.metadata {
                Some(meta) => BlockKind::Task(serde_json::from_value(meta).map_err(mismatch)?),
                None => BlockKind::task(),
            },
            BlockType::Decision => {
                let meta = raw.metadata.unwrap_or_default();
                BlockKind::Decision(serde_json::from_value(meta).map_err(mismatch)?)
            }
        };
        Ok(Block {
            id: raw.id,
            kind,
            content: raw.content,
            timestamp: raw.timestamp,
        })
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let block_type = block.block_type();
        // Plain structs of strings and bools always convert to a JSON value.
        let metadata = match block.kind {
            BlockKind::Task(meta) => serde_json::to_value(meta).ok(),
            BlockKind::Decision(meta) => serde_json::to_value(meta).ok(),
            _ => None,
        };
        RawBlock {
            id: block.id,
            block_type,
            content: block.content,
            timestamp: block.timestamp,
            metadata,
        }
    }
}
