// Lantern: content-risk analysis and audit trail for user posts.
//
// This is the library root. Each module corresponds to a major subsystem
// of the analysis and persistence pipeline.

pub mod classify;
pub mod config;
pub mod db;
pub mod eval;
pub mod export;
pub mod language;
pub mod pipeline;
pub mod store;
pub mod web;
