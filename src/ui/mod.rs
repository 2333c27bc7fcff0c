//! Terminal rendering

pub mod display;
