//! Capabilities the engine consumes from its collaborators

pub mod condition;
pub mod security;
pub mod storage;
