// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
//
// ID generation and timestamping happen here: each insert stamps a fresh
// UUIDv4 and the current UTC time, so a row is fully formed in a single
// atomic INSERT.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::models::{Interaction, Post};
use crate::pipeline::PostAnalysis;

// --- Posts ---

/// Insert one analyzed post. Returns the stored row, including the
/// generated id and created_at stamp.
pub fn insert_post(conn: &Connection, text: &str, analysis: &PostAnalysis) -> Result<Post> {
    let post = Post {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        toxicity: analysis.toxicity.clone(),
        fake_label: analysis.fake_news.label.clone(),
        fake_score: analysis.fake_news.score,
        hate_label: analysis.hate_speech.label.clone(),
        hate_score: analysis.hate_speech.score,
        created_at: Utc::now().to_rfc3339(),
    };

    // The toxicity map round-trips through JSON — structured data only,
    // never re-interpreted as anything executable.
    let toxicity_json =
        serde_json::to_string(&post.toxicity).context("Failed to encode toxicity scores")?;

    conn.execute(
        "INSERT INTO posts (id, text, toxicity, fake_label, fake_score, hate_label, hate_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            post.id,
            post.text,
            toxicity_json,
            post.fake_label,
            post.fake_score,
            post.hate_label,
            post.hate_score,
            post.created_at,
        ],
    )?;
    Ok(post)
}

/// All stored posts, most recently created first.
pub fn list_posts(conn: &Connection) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(
        "SELECT id, text, toxicity, fake_label, fake_score, hate_label, hate_score, created_at
         FROM posts
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let toxicity_json: String = row.get(2)?;
        Ok(Post {
            id: row.get(0)?,
            text: row.get(1)?,
            toxicity: serde_json::from_str(&toxicity_json).unwrap_or_default(),
            fake_label: row.get(3)?,
            fake_score: row.get(4)?,
            hate_label: row.get(5)?,
            hate_score: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

// --- Interactions ---

/// Append one interaction row. post_id is deliberately not checked
/// against the posts table.
pub fn insert_interaction(conn: &Connection, post_id: &str, action: &str) -> Result<Interaction> {
    let interaction = Interaction {
        id: Uuid::new_v4().to_string(),
        post_id: post_id.to_string(),
        action: action.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };

    conn.execute(
        "INSERT INTO interactions (id, post_id, action, timestamp)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            interaction.id,
            interaction.post_id,
            interaction.action,
            interaction.timestamp,
        ],
    )?;
    Ok(interaction)
}

/// All recorded interactions, most recent first.
pub fn list_interactions(conn: &Connection) -> Result<Vec<Interaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, action, timestamp
         FROM interactions
         ORDER BY timestamp DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(Interaction {
            id: row.get(0)?,
            post_id: row.get(1)?,
            action: row.get(2)?,
            timestamp: row.get(3)?,
        })
    })?;

    let mut interactions = Vec::new();
    for row in rows {
        interactions.push(row?);
    }
    Ok(interactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::normalize::LabelScore;
    use crate::db::schema::create_tables;
    use std::collections::BTreeMap;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn sample_analysis(text: &str) -> PostAnalysis {
        let mut toxicity = BTreeMap::new();
        toxicity.insert("toxic".to_string(), 0.92);
        toxicity.insert("insult".to_string(), 0.81);
        PostAnalysis {
            text: text.to_string(),
            toxicity,
            fake_news: LabelScore {
                label: "neutral".to_string(),
                score: 0.6,
            },
            hate_speech: LabelScore {
                label: "not-hate".to_string(),
                score: 0.55,
            },
        }
    }

    #[test]
    fn test_insert_post_roundtrip() {
        let conn = test_db();
        let analysis = sample_analysis("You are an idiot");
        let saved = insert_post(&conn, "You are an idiot", &analysis).unwrap();
        assert!(!saved.id.is_empty());
        assert!(!saved.created_at.is_empty());

        let posts = list_posts(&conn).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].text, "You are an idiot");
        assert_eq!(posts[0].toxicity["toxic"], 0.92);
        assert_eq!(posts[0].fake_label, "neutral");
    }

    #[test]
    fn test_list_posts_newest_first_with_fresh_ids() {
        let conn = test_db();
        let first = insert_post(&conn, "first", &sample_analysis("first")).unwrap();
        let second = insert_post(&conn, "second", &sample_analysis("second")).unwrap();
        assert_ne!(first.id, second.id);

        let posts = list_posts(&conn).unwrap();
        assert_eq!(posts[0].text, "second");
        assert_eq!(posts[1].text, "first");
        assert_eq!(posts[0].id, second.id);
    }

    #[test]
    fn test_interaction_roundtrip() {
        let conn = test_db();
        let interaction = insert_interaction(&conn, "post-123", "like").unwrap();
        assert!(!interaction.id.is_empty());

        let all = list_interactions(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].post_id, "post-123");
        assert_eq!(all[0].action, "like");
    }

    #[test]
    fn test_interaction_with_dangling_post_id_is_accepted() {
        let conn = test_db();
        // No post exists at all — the insert must still succeed and
        // the row must be retrievable.
        let interaction = insert_interaction(&conn, "does-not-exist", "report").unwrap();
        let all = list_interactions(&conn).unwrap();
        assert_eq!(all[0].id, interaction.id);
        assert_eq!(all[0].post_id, "does-not-exist");
    }

    #[test]
    fn test_toxicity_map_survives_json_roundtrip() {
        let conn = test_db();
        insert_post(&conn, "t", &sample_analysis("t")).unwrap();
        let posts = list_posts(&conn).unwrap();
        assert_eq!(posts[0].toxicity.len(), 2);
        assert!((posts[0].toxicity["insult"] - 0.81).abs() < f64::EPSILON);
    }
}
