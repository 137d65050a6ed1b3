use crate::models::{ChannelRow, DocumentRow, MessageRow, format_timestamp};
use crate::{Database, DbError, vector};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};
use uuid::Uuid;

use teamchat_types::api::NewChannel;
use teamchat_types::models::{Channel, DocumentMatch, Message, is_assistant};

impl Database {
    // -- Channels --

    pub fn list_channels(&self) -> Result<Vec<Channel>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at FROM channels
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ChannelRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows.into_iter().map(ChannelRow::into_channel).collect())
        })
    }

    /// Insert a batch of channels atomically. A duplicate name aborts the
    /// whole batch with `DbError::DuplicateChannel`.
    pub fn create_channels(&self, channels: &[NewChannel]) -> Result<Vec<Channel>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut created = Vec::with_capacity(channels.len());

            for new in channels {
                let row = ChannelRow {
                    id: Uuid::new_v4().to_string(),
                    name: new.name.clone(),
                    description: new.description.clone(),
                    created_at: format_timestamp(chrono::Utc::now()),
                };

                let inserted = tx.execute(
                    "INSERT INTO channels (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![row.id, row.name, row.description, row.created_at],
                );
                match inserted {
                    Ok(_) => created.push(row.into_channel()),
                    Err(e) if is_constraint_violation(&e) => {
                        return Err(DbError::DuplicateChannel(new.name.clone()).into());
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            tx.commit()?;
            Ok(created)
        })
    }

    // -- Messages --

    /// Insert a message. The AI flag is derived from the author name.
    pub fn insert_message(&self, channel_id: &str, user_name: &str, content: &str) -> Result<Message> {
        self.with_conn(|conn| {
            if query_channel(conn, channel_id)?.is_none() {
                return Err(DbError::ChannelNotFound(channel_id.to_string()).into());
            }

            let row = MessageRow {
                id: Uuid::new_v4().to_string(),
                channel_id: channel_id.to_string(),
                user_name: user_name.to_string(),
                content: content.to_string(),
                is_ai: is_assistant(user_name),
                created_at: format_timestamp(chrono::Utc::now()),
            };

            conn.execute(
                "INSERT INTO messages (id, channel_id, user_name, content, is_ai, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.id,
                    row.channel_id,
                    row.user_name,
                    row.content,
                    row.is_ai,
                    row.created_at
                ],
            )?;

            Ok(row.into_message())
        })
    }

    /// The `limit` most recent messages of a channel, oldest first.
    pub fn recent_messages(&self, channel_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let mut rows = query_messages_newest_first(conn, channel_id, limit)?;
            rows.reverse();
            Ok(rows.into_iter().map(MessageRow::into_message).collect())
        })
    }

    // -- Knowledge base --

    pub fn insert_document(&self, title: &str, content: &str, embedding: &[f32]) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (id, title, content, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    id.to_string(),
                    title,
                    content,
                    vector::encode(embedding),
                    format_timestamp(chrono::Utc::now())
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    /// Nearest documents by cosine similarity, best match first. Documents
    /// whose embedding dimension differs from the query are skipped.
    pub fn match_documents(&self, query_embedding: &[f32], match_count: usize) -> Result<Vec<DocumentMatch>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, title, content, embedding FROM documents")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DocumentRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        embedding: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut matches: Vec<DocumentMatch> = rows
            .into_iter()
            .filter_map(|row| {
                let similarity = vector::cosine_similarity(query_embedding, &vector::decode(&row.embedding))?;
                Some(DocumentMatch {
                    id: row.id.parse().unwrap_or_default(),
                    title: row.title,
                    content: row.content,
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(match_count);
        Ok(matches)
    }
}

fn query_channel(conn: &Connection, id: &str) -> Result<Option<ChannelRow>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, created_at FROM channels WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ChannelRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_messages_newest_first(conn: &Connection, channel_id: &str, limit: u32) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, channel_id, user_name, content, is_ai, created_at
         FROM messages
         WHERE channel_id = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![channel_id, limit], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                channel_id: row.get(1)?,
                user_name: row.get(2)?,
                content: row.get(3)?,
                is_ai: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_channel() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let channels = db.create_channels(&[NewChannel::new("general", "General discussion")]).unwrap();
        let id = channels[0].id.to_string();
        (db, id)
    }

    #[test]
    fn channels_list_in_creation_order() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_channels().unwrap().is_empty());

        db.create_channels(&teamchat_types::api::default_channels()).unwrap();
        let names: Vec<_> = db.list_channels().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["general", "random", "ai-help"]);
    }

    #[test]
    fn duplicate_channel_rolls_back_batch() {
        let (db, _) = db_with_channel();
        let err = db
            .create_channels(&[NewChannel::new("fresh", "x"), NewChannel::new("general", "y")])
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::DuplicateChannel(name)) if name == "general"));
        assert_eq!(db.list_channels().unwrap().len(), 1);
    }

    #[test]
    fn ai_flag_follows_author() {
        let (db, channel) = db_with_channel();
        let user = db.insert_message(&channel, "You", "hello @Claude").unwrap();
        let ai = db.insert_message(&channel, "Claude", "hi there").unwrap();
        assert!(!user.is_ai);
        assert!(ai.is_ai);
    }

    #[test]
    fn unknown_channel_rejects_message() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .insert_message(&Uuid::new_v4().to_string(), "You", "lost")
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::ChannelNotFound(_))));
    }

    #[test]
    fn recent_messages_are_latest_in_chronological_order() {
        let (db, channel) = db_with_channel();
        for i in 0..15 {
            db.insert_message(&channel, "You", &format!("m{}", i)).unwrap();
        }

        let recent = db.recent_messages(&channel, 10).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<String> = (5..15).map(|i| format!("m{}", i)).collect();
        assert_eq!(contents, expected);
    }

    #[test]
    fn messages_are_scoped_to_channel() {
        let (db, general) = db_with_channel();
        let random = db.create_channels(&[NewChannel::new("random", "Random chat")]).unwrap()[0]
            .id
            .to_string();
        db.insert_message(&general, "You", "in general").unwrap();
        db.insert_message(&random, "You", "in random").unwrap();

        let msgs = db.recent_messages(&random, 100).unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].content, "in random");
    }

    #[test]
    fn match_documents_ranks_by_similarity() {
        let db = Database::open_in_memory().unwrap();
        db.insert_document("far", "unrelated", &[0.0, 1.0]).unwrap();
        db.insert_document("near", "relevant", &[1.0, 0.1]).unwrap();
        db.insert_document("mid", "somewhat", &[1.0, 1.0]).unwrap();
        db.insert_document("wrong-dim", "skipped", &[1.0, 0.0, 0.0]).unwrap();

        let matches = db.match_documents(&[1.0, 0.0], 2).unwrap();
        let titles: Vec<_> = matches.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["near", "mid"]);
        assert!(matches[0].similarity > matches[1].similarity);
    }
}
