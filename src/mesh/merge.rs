use crate::models::Block;

/// Folds an incoming UPDATE_STREAM block list into the local one.
pub type MergePolicy = fn(current: &[Block], incoming: Vec<Block>) -> Vec<Block>;

/// Last applied wins: the incoming array replaces the local one wholesale.
/// Concurrent edits from two peers lose whichever arrived first.
pub fn replace_blocks(_current: &[Block], incoming: Vec<Block>) -> Vec<Block> {
    incoming
}
