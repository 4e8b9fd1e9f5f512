//! Command implementations for the DStats CLI

pub mod serve;
