// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An analyzed post, persisted exactly once and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// UUIDv4, generated at save time and never reused.
    pub id: String,
    pub text: String,
    /// Multi-label toxicity scores (JSON-encoded in the DB).
    pub toxicity: BTreeMap<String, f64>,
    pub fake_label: String,
    pub fake_score: f64,
    pub hate_label: String,
    pub hate_score: f64,
    /// RFC 3339 UTC timestamp stamped at save time.
    pub created_at: String,
}

/// A recorded user interaction with a post. Append-only.
///
/// `post_id` is a loose reference — it is not validated against the
/// posts table and may dangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub post_id: String,
    /// Free-form action name, e.g. "like" or "report".
    pub action: String,
    pub timestamp: String,
}
