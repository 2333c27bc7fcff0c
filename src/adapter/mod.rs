//! Implementations of the ports

pub mod manager;
pub mod storage;
