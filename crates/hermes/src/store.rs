//! Chart and conversation persistence keyed by user id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;
use urania::NatalChart;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid user id {0:?}: only letters, digits, '-' and '_' are allowed")]
    InvalidUserId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a user's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ChartStore: Send + Sync {
    async fn load_chart(&self, user_id: &str) -> Result<Option<NatalChart>, StoreError>;

    /// Insert or replace the user's chart.
    async fn save_chart(&self, user_id: &str, chart: &NatalChart) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append_turn(&self, user_id: &str, turn: &ConversationTurn) -> Result<(), StoreError>;

    /// Up to `limit` most recent turns, oldest first.
    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError>;
}

/// Process-local store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStore {
    charts: RwLock<HashMap<String, NatalChart>>,
    conversations: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChartStore for MemoryStore {
    async fn load_chart(&self, user_id: &str) -> Result<Option<NatalChart>, StoreError> {
        Ok(self.charts.read().await.get(user_id).cloned())
    }

    async fn save_chart(&self, user_id: &str, chart: &NatalChart) -> Result<(), StoreError> {
        self.charts
            .write()
            .await
            .insert(user_id.to_string(), chart.clone());
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn append_turn(&self, user_id: &str, turn: &ConversationTurn) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let conversations = self.conversations.read().await;
        let turns = conversations.get(user_id).map(Vec::as_slice).unwrap_or_default();
        Ok(tail(turns, limit).to_vec())
    }
}

/// Bytes read per step when scanning a conversation log from its end.
const TAIL_CHUNK: u64 = 8 * 1024;

/// Directory-backed document store.
///
/// Layout under the root: `charts/<user>.json` holds one chart document,
/// `conversations/<user>.jsonl` holds one turn per line.
pub struct DocumentStore {
    root: PathBuf,
    // Serializes appends and chart replacement within this process
    write_lock: tokio::sync::Mutex<()>,
}

impl DocumentStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("charts")).await?;
        fs::create_dir_all(root.join("conversations")).await?;
        log::info!("document store at {}", root.display());
        Ok(Self {
            root,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn chart_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("charts").join(format!("{}.json", checked_id(user_id)?)))
    }

    fn conversation_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .root
            .join("conversations")
            .join(format!("{}.jsonl", checked_id(user_id)?)))
    }
}

#[async_trait]
impl ChartStore for DocumentStore {
    async fn load_chart(&self, user_id: &str) -> Result<Option<NatalChart>, StoreError> {
        let path = self.chart_path(user_id)?;
        let bytes = match fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save_chart(&self, user_id: &str, chart: &NatalChart) -> Result<(), StoreError> {
        let path = self.chart_path(user_id)?;
        let body = serde_json::to_vec_pretty(chart)?;

        let _guard = self.write_lock.lock().await;
        // Write then rename so readers never see a half-written chart
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &path).await?;
        log::debug!("saved chart for {user_id}");
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for DocumentStore {
    async fn append_turn(&self, user_id: &str, turn: &ConversationTurn) -> Result<(), StoreError> {
        let path = self.conversation_path(user_id)?;
        let mut line = serde_json::to_string(turn)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let path = self.conversation_path(user_id)?;
        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // Walk backwards from the end so the read size follows `limit`
        let mut pos = file.metadata().await?.len();
        let mut pending: Vec<u8> = Vec::new();
        let mut newest_first = Vec::with_capacity(limit);
        while newest_first.len() < limit && pos > 0 {
            let step = pos.min(TAIL_CHUNK);
            pos -= step;
            let mut data = vec![0u8; step as usize];
            file.seek(SeekFrom::Start(pos)).await?;
            file.read_exact(&mut data).await?;
            data.extend_from_slice(&pending);

            // Bytes before the first newline may belong to a line further back
            let first_newline = data.iter().position(|&b| b == b'\n');
            let complete_from = match (pos, first_newline) {
                (0, _) => 0,
                (_, Some(i)) => i + 1,
                (_, None) => {
                    pending = data;
                    continue;
                }
            };

            for line in data[complete_from..].split(|&b| b == b'\n').rev() {
                if newest_first.len() == limit {
                    break;
                }
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                match serde_json::from_slice::<ConversationTurn>(line) {
                    Ok(turn) => newest_first.push(turn),
                    Err(e) => log::warn!("{}: skipping unreadable turn: {e}", path.display()),
                }
            }
            data.truncate(complete_from);
            pending = data;
        }

        newest_first.reverse();
        Ok(newest_first)
    }
}

fn checked_id(user_id: &str) -> Result<&str, StoreError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 128
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(user_id)
    } else {
        Err(StoreError::InvalidUserId(user_id.to_string()))
    }
}

fn tail<T>(items: &[T], limit: usize) -> &[T] {
    &items[items.len().saturating_sub(limit)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use urania::{Body, NatalBody};

    fn chart() -> NatalChart {
        NatalChart {
            ascendant: 15.0,
            houses: Some((0..12).map(|i| i as f64 * 30.0).collect()),
            planets: Some(vec![NatalBody::at(Body::Sun, 10.0)]),
            birth: None,
        }
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load_chart("u1").await.unwrap().is_none());

        store.save_chart("u1", &chart()).await.unwrap();
        assert_eq!(store.load_chart("u1").await.unwrap(), Some(chart()));

        for i in 0..5 {
            store
                .append_turn("u1", &ConversationTurn::user(format!("q{i}")))
                .await
                .unwrap();
        }
        let recent = store.recent_turns("u1", 2).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q3", "q4"]);
        assert!(store.recent_turns("nobody", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DocumentStore::open(dir.path()).await.unwrap();
            store.save_chart("42", &chart()).await.unwrap();
            store
                .append_turn("42", &ConversationTurn::user("will I travel?"))
                .await
                .unwrap();
            store
                .append_turn("42", &ConversationTurn::assistant("Jupiter says yes."))
                .await
                .unwrap();
        }

        let store = DocumentStore::open(dir.path()).await.unwrap();
        assert_eq!(store.load_chart("42").await.unwrap(), Some(chart()));
        let turns = store.recent_turns("42", 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "Jupiter says yes.");
    }

    #[tokio::test]
    async fn test_document_store_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        store
            .append_turn("7", &ConversationTurn::user("first"))
            .await
            .unwrap();
        let path = dir.path().join("conversations").join("7.jsonl");
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("{not json\n");
        std::fs::write(&path, text).unwrap();
        store
            .append_turn("7", &ConversationTurn::user("second"))
            .await
            .unwrap();

        let turns = store.recent_turns("7", 10).await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_document_store_reads_recent_turns_from_long_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();
        let path = dir.path().join("conversations").join("9.jsonl");

        let mut text = String::new();
        for i in 0..600 {
            let turn = ConversationTurn::user(format!("question {i}: la Lune ☽ et le Soleil ☉"));
            text.push_str(&serde_json::to_string(&turn).unwrap());
            text.push('\n');
        }
        text.push_str("{not json\n");
        assert!(text.len() as u64 > 3 * TAIL_CHUNK);
        std::fs::write(&path, text).unwrap();
        store
            .append_turn("9", &ConversationTurn::assistant("last"))
            .await
            .unwrap();

        let turns = store.recent_turns("9", 3).await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "question 598: la Lune ☽ et le Soleil ☉",
                "question 599: la Lune ☽ et le Soleil ☉",
                "last"
            ]
        );

        let all = store.recent_turns("9", 1000).await.unwrap();
        assert_eq!(all.len(), 601);
        assert_eq!(all[0].content, "question 0: la Lune ☽ et le Soleil ☉");
        assert!(store.recent_turns("9", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).await.unwrap();

        let err = store.save_chart("../etc", &chart()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidUserId(_)));
        assert!(store.load_chart("").await.is_err());
    }
}
