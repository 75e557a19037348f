// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send. The mutex also serializes concurrent writers, so
// two simultaneous saves can never interleave inside one INSERT.
//
// The free functions in queries.rs remain unchanged so tests can work
// against Connection directly.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Interaction, Post};
use super::traits::Database;
use crate::pipeline::PostAnalysis;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn save_post(&self, text: &str, analysis: &PostAnalysis) -> Result<Post> {
        let conn = self.conn.lock().await;
        super::queries::insert_post(&conn, text, analysis)
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        super::queries::list_posts(&conn)
    }

    async fn record_interaction(&self, post_id: &str, action: &str) -> Result<Interaction> {
        let conn = self.conn.lock().await;
        super::queries::insert_interaction(&conn, post_id, action)
    }

    async fn list_interactions(&self) -> Result<Vec<Interaction>> {
        let conn = self.conn.lock().await;
        super::queries::list_interactions(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::normalize::LabelScore;
    use crate::db::schema::create_tables;
    use std::collections::BTreeMap;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn analysis() -> PostAnalysis {
        PostAnalysis {
            text: "hello".to_string(),
            toxicity: BTreeMap::from([("toxic".to_string(), 0.1)]),
            fake_news: LabelScore {
                label: "real".to_string(),
                score: 0.9,
            },
            hate_speech: LabelScore {
                label: "not-hate".to_string(),
                score: 0.8,
            },
        }
    }

    #[tokio::test]
    async fn test_trait_save_and_list() {
        let db = test_db().await;
        let saved = db.save_post("hello", &analysis()).await.unwrap();
        let posts = db.list_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, saved.id);
    }

    #[tokio::test]
    async fn test_trait_interaction_roundtrip() {
        let db = test_db().await;
        db.record_interaction("some-post", "like").await.unwrap();
        let all = db.list_interactions().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].action, "like");
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_saves_do_not_collide() {
        let db = std::sync::Arc::new(test_db().await);
        let mut handles = Vec::new();
        for i in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                db.save_post(&format!("post {i}"), &analysis()).await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let post = handle.await.unwrap().unwrap();
            assert!(ids.insert(post.id), "duplicate id generated");
        }
        assert_eq!(db.list_posts().await.unwrap().len(), 8);
    }
}
