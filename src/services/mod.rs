pub mod insight_service;
pub mod journal_service;
pub mod scratchpad_service;
pub mod storage_service;
