// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite behind a tokio Mutex).
// All methods are async so a native-async backend could sit behind the
// same interface later without touching callers.
//
// The trait mirrors the queries.rs function signatures, so callers hold
// an `Arc<dyn Database>` and never see rusqlite directly.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Interaction, Post};
use crate::pipeline::PostAnalysis;

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Posts ---

    /// Persist one analyzed post. Generates a fresh UUID and stamps the
    /// current UTC time; the returned Post is the row as written.
    async fn save_post(&self, text: &str, analysis: &PostAnalysis) -> Result<Post>;

    /// All stored posts, most recently created first.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    // --- Interactions ---

    /// Append one interaction. post_id is not validated against the
    /// posts table — dangling references are accepted by design.
    async fn record_interaction(&self, post_id: &str, action: &str) -> Result<Interaction>;

    /// All recorded interactions, most recent first.
    async fn list_interactions(&self) -> Result<Vec<Interaction>>;
}
