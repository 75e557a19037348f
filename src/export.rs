// Export mirror — flat-file CSV snapshot of the persistence store.
//
// After every successful store write the mirror is rebuilt wholesale:
// read every row, rewrite both files from scratch. That is O(total
// rows) per write, which is fine at audit-log volume, and it means the
// mirror can never be stale or partially updated relative to the store.
//
// Each file is written to a temp path in the same directory and then
// renamed into place, so a concurrent download never observes a
// half-written file. Rebuilds are serialized under a mutex.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::models::{Interaction, Post};
use crate::db::Database;

/// Which mirrored entity a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Posts,
    Interactions,
}

impl ExportKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Posts => "posts.csv",
            ExportKind::Interactions => "interactions.csv",
        }
    }

    /// Parse the entity name used on the export surface.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "posts" => Some(ExportKind::Posts),
            "interactions" => Some(ExportKind::Interactions),
            _ => None,
        }
    }
}

pub struct ExportMirror {
    dir: PathBuf,
    rebuild_lock: Mutex<()>,
}

impl ExportMirror {
    /// Create a mirror rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
        Ok(Self {
            dir,
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Absolute path of one mirrored file.
    pub fn path(&self, kind: ExportKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Rebuild both mirror files from the store.
    ///
    /// Callers must only invoke this after a confirmed successful store
    /// write — the Store facade enforces that ordering.
    pub async fn regenerate(&self, db: &dyn Database) -> Result<()> {
        // Snapshot and write under one lock: if the snapshot were taken
        // first, an older snapshot could win the lock last and overwrite
        // a newer mirror with stale rows.
        let _guard = self.rebuild_lock.lock().await;
        let posts = db.list_posts().await?;
        let interactions = db.list_interactions().await?;

        write_atomically(&self.path(ExportKind::Posts), &render_posts(&posts))?;
        write_atomically(
            &self.path(ExportKind::Interactions),
            &render_interactions(&interactions),
        )?;

        debug!(
            posts = posts.len(),
            interactions = interactions.len(),
            "Export mirror regenerated"
        );
        Ok(())
    }
}

/// Write via temp-file-then-rename so readers see either the old file
/// or the new one, never a partial write.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn render_posts(posts: &[Post]) -> String {
    let mut out = String::from(
        "id,text,toxicity,fake_label,fake_score,hate_label,hate_score,created_at\n",
    );
    for post in posts {
        // The toxicity map is mirrored as its JSON encoding — the same
        // structured form the store holds.
        let toxicity = serde_json::to_string(&post.toxicity).unwrap_or_else(|_| "{}".to_string());
        let row = [
            csv_field(&post.id),
            csv_field(&post.text),
            csv_field(&toxicity),
            csv_field(&post.fake_label),
            post.fake_score.to_string(),
            csv_field(&post.hate_label),
            post.hate_score.to_string(),
            csv_field(&post.created_at),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn render_interactions(interactions: &[Interaction]) -> String {
    let mut out = String::from("id,post_id,action,timestamp\n");
    for i in interactions {
        let row = [
            csv_field(&i.id),
            csv_field(&i.post_id),
            csv_field(&i.action),
            csv_field(&i.timestamp),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a CSV field when it contains a delimiter, quote, or newline;
/// embedded quotes are doubled (RFC 4180).
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
