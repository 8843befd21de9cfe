//! 长期记忆 Store
//!
//! 记忆集合与关键词索引放在同一把读写锁之后：`create` / `remove` / `prune`
//! 在写锁内同时更新两者，读者永远看不到半更新的状态。
//! `query` / `get` 只需要读锁，可以并发执行。
//!
//! ## 快速上手
//!
//! ```rust,no_run
//! use banter_bot::llm::types::Message;
//! use banter_bot::memory::MemoryStore;
//!
//! # async fn example() -> banter_bot::error::Result<()> {
//! let store = MemoryStore::open("~/.banter-bot/memories.bin").await?;
//! store
//!     .create(
//!         vec![Message::user("Planning a trip to Lisbon".to_string())],
//!         "User is planning a trip to Lisbon.".to_string(),
//!         6,
//!         ["travel", "lisbon"],
//!     )
//!     .await?;
//! let hits = store.query(["lisbon"], 3).await;
//! store.persist("~/.banter-bot/memories.bin").await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{MemoryError, Result};
use crate::llm::types::Message;
use crate::memory::clock::{Clock, SystemClock};
use crate::memory::codec::{decode_memories, encode_memories};
use crate::memory::index::MemoryIndex;
use crate::memory::model::{Memory, normalize_keywords};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// 锁内的完整状态
#[derive(Default)]
struct StoreState {
    /// 按创建顺序排列
    memories: Vec<Memory>,
    /// uuid → memories 中的下标
    positions: HashMap<Uuid, usize>,
    index: MemoryIndex,
    last_timestamp: i64,
}

impl StoreState {
    fn from_memories(memories: Vec<Memory>) -> Self {
        let mut state = StoreState::default();
        for memory in memories {
            state.insert(memory);
        }
        state
    }

    fn insert(&mut self, memory: Memory) {
        self.index.add(memory.uuid, &memory.keywords);
        self.positions.insert(memory.uuid, self.memories.len());
        self.last_timestamp = self.last_timestamp.max(memory.timestamp);
        self.memories.push(memory);
    }

    fn remove(&mut self, uuid: Uuid) -> Option<Memory> {
        let pos = self.positions.remove(&uuid)?;
        let memory = self.memories.remove(pos);
        self.index.remove(uuid, &memory.keywords);
        for (i, m) in self.memories.iter().enumerate().skip(pos) {
            self.positions.insert(m.uuid, i);
        }
        Some(memory)
    }

    /// 按（匹配数，impact，timestamp，创建顺序）降序取前 `limit` 条
    fn rank(&self, hits: HashMap<Uuid, usize>, limit: usize) -> Vec<Memory> {
        let mut candidates: Vec<(usize, usize)> = hits
            .into_iter()
            .filter_map(|(uuid, count)| self.positions.get(&uuid).map(|&pos| (pos, count)))
            .collect();
        candidates.sort_by_key(|&(pos, count)| {
            let m = &self.memories[pos];
            (Reverse(count), Reverse(m.impact), Reverse(m.timestamp), Reverse(pos))
        });
        candidates
            .into_iter()
            .take(limit)
            .map(|(pos, _)| self.memories[pos].clone())
            .collect()
    }
}

/// 记忆集合 + 关键词索引，唯一的修改入口
pub struct MemoryStore {
    state: RwLock<StoreState>,
    /// 同一时刻只允许一次 persist（编码到重命名全程持有）
    persist_guard: Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 使用自定义时钟（测试中用 `ManualClock` 固定时间戳）
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            persist_guard: Mutex::new(()),
            clock,
        }
    }

    fn from_memories(memories: Vec<Memory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(StoreState::from_memories(memories)),
            persist_guard: Mutex::new(()),
            clock,
        }
    }

    /// 创建一条记忆并写入索引。
    ///
    /// `messages` 为空或关键词归一化后为空时返回 `Validation` 错误，store 不变。
    pub async fn create<I, S>(
        &self,
        messages: Vec<Message>,
        summary: String,
        impact: i64,
        keywords: I,
    ) -> Result<Memory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if messages.is_empty() {
            return Err(MemoryError::Validation("messages must not be empty".to_string()).into());
        }
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(MemoryError::Validation("keywords must not be empty".to_string()).into());
        }

        let mut state = self.state.write().await;
        let timestamp = self.clock.now().max(state.last_timestamp);
        let memory = Memory {
            keywords,
            summary,
            impact,
            timestamp,
            messages,
            uuid: Uuid::new_v4(),
        };
        state.insert(memory.clone());

        info!(
            uuid = %memory.uuid,
            keywords = memory.keywords.len(),
            messages = memory.messages.len(),
            impact = memory.impact,
            "🧠 新记忆已创建"
        );
        Ok(memory)
    }

    /// 按关键词检索，返回最多 `limit` 条。无匹配时返回空列表。
    pub async fn query<I, S>(&self, keywords: I, limit: usize) -> Vec<Memory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = normalize_keywords(keywords);
        let state = self.state.read().await;

        let mut hits: HashMap<Uuid, usize> = HashMap::new();
        for keyword in &keywords {
            if let Some(uuids) = state.index.get(keyword) {
                for uuid in uuids {
                    *hits.entry(*uuid).or_default() += 1;
                }
            }
        }

        let result = state.rank(hits, limit);
        debug!(keywords = keywords.len(), hits = result.len(), "🔍 记忆检索");
        result
    }

    /// 模糊检索：每个查询关键词额外匹配相似度 ≥ `threshold` 的已索引关键词。
    ///
    /// 相似度为 Jaro-Winkler（0.0 ~ 1.0）。一个查询关键词无论通过几个相似词命中同一条记忆，
    /// 都只计一次匹配；排序规则与 [`query`](Self::query) 相同。
    pub async fn query_fuzzy<I, S>(&self, keywords: I, limit: usize, threshold: f64) -> Vec<Memory>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = normalize_keywords(keywords);
        let state = self.state.read().await;

        let mut hits: HashMap<Uuid, usize> = HashMap::new();
        for keyword in &keywords {
            let matched: HashSet<Uuid> = state
                .index
                .keywords()
                .filter(|indexed| {
                    *indexed == keyword.as_str()
                        || strsim::jaro_winkler(keyword, indexed) >= threshold
                })
                .filter_map(|indexed| state.index.get(indexed))
                .flatten()
                .copied()
                .collect();
            for uuid in matched {
                *hits.entry(uuid).or_default() += 1;
            }
        }

        let result = state.rank(hits, limit);
        debug!(keywords = keywords.len(), threshold, hits = result.len(), "🔍 模糊记忆检索");
        result
    }

    /// 按 uuid 精确获取
    pub async fn get(&self, uuid: Uuid) -> Result<Memory> {
        let state = self.state.read().await;
        state
            .positions
            .get(&uuid)
            .map(|&pos| state.memories[pos].clone())
            .ok_or_else(|| MemoryError::NotFound(uuid).into())
    }

    /// 按创建顺序返回全部记忆
    pub async fn all(&self) -> Vec<Memory> {
        self.state.read().await.memories.clone()
    }

    /// 索引中某个关键词下的全部 uuid
    pub async fn lookup(&self, keyword: &str) -> HashSet<Uuid> {
        match crate::memory::model::normalize_keyword(keyword) {
            Some(keyword) => self.state.read().await.index.lookup(&keyword),
            None => HashSet::new(),
        }
    }

    /// 当前已索引的全部关键词（有序）
    pub async fn keywords(&self) -> BTreeSet<String> {
        self.state
            .read()
            .await
            .index
            .keywords()
            .map(String::from)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.memories.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.memories.is_empty()
    }

    /// 删除记忆及其全部索引条目
    pub async fn remove(&self, uuid: Uuid) -> Result<Memory> {
        let removed = self.state.write().await.remove(uuid);
        match removed {
            Some(memory) => {
                info!(uuid = %uuid, "🗑️ 记忆已删除");
                Ok(memory)
            }
            None => Err(MemoryError::NotFound(uuid).into()),
        }
    }

    /// 淘汰多余记忆直到数量不超过 `capacity`：先淘汰 impact 最低的，同分淘汰最旧的
    pub async fn prune(&self, capacity: usize) -> Vec<Memory> {
        self.prune_inner(capacity, None).await
    }

    /// 同 [`prune`](Self::prune)，但 `keep` 指定的记忆不参与淘汰
    pub async fn prune_keeping(&self, capacity: usize, keep: Uuid) -> Vec<Memory> {
        self.prune_inner(capacity, Some(keep)).await
    }

    async fn prune_inner(&self, capacity: usize, keep: Option<Uuid>) -> Vec<Memory> {
        let mut state = self.state.write().await;
        if state.memories.len() <= capacity {
            return Vec::new();
        }

        let excess = state.memories.len() - capacity;
        let mut order: Vec<usize> = (0..state.memories.len())
            .filter(|&pos| Some(state.memories[pos].uuid) != keep)
            .collect();
        order.sort_by_key(|&pos| {
            let m = &state.memories[pos];
            (m.impact, m.timestamp, pos)
        });
        let victims: Vec<Uuid> = order
            .into_iter()
            .take(excess)
            .map(|pos| state.memories[pos].uuid)
            .collect();

        let evicted: Vec<Memory> = victims
            .into_iter()
            .filter_map(|uuid| state.remove(uuid))
            .collect();
        info!(evicted = evicted.len(), remaining = state.memories.len(), "🧹 记忆淘汰完成");
        evicted
    }

    // ── 持久化 ────────────────────────────────────────────────────────────────

    /// 编码当前快照（读锁内完成，期间不会有并发写入）
    pub async fn to_bytes(&self) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        encode_memories(&state.memories)
    }

    /// 从帧序列构造 store，索引随之重建
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with_clock(bytes, Arc::new(SystemClock))
    }

    pub fn from_bytes_with_clock(bytes: &[u8], clock: Arc<dyn Clock>) -> Result<Self> {
        let memories = decode_memories(bytes)?;
        Ok(Self::from_memories(memories, clock))
    }

    /// 写入文件：先写临时文件再重命名，避免留下半个文件。
    ///
    /// 并发调用按顺序执行，后获得锁的一方写入的是更新的快照。
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = expand_tilde(path.as_ref());
        let _guard = self.persist_guard.lock().await;
        let (bytes, count) = {
            let state = self.state.read().await;
            (encode_memories(&state.memories)?, state.memories.len())
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::IoError(format!("创建目录失败: {e}")))?;
        }
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| MemoryError::IoError(format!("写入记忆文件失败: {e}")))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| MemoryError::IoError(format!("替换记忆文件失败: {e}")))?;

        debug!(path = %path.display(), memories = count, bytes = bytes.len(), "💾 记忆已持久化");
        Ok(())
    }

    /// 从文件加载。数据损坏时返回 `Corruption` 错误，不会构造部分 store
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_tilde(path.as_ref());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| MemoryError::IoError(format!("读取记忆文件失败: {e}")))?;
        let store = Self::from_bytes(&bytes)?;
        let state = store.state.read().await;
        info!(
            path = %path.display(),
            memories = state.memories.len(),
            keywords = state.index.len(),
            "🗄️ 记忆库已加载"
        );
        drop(state);
        Ok(store)
    }

    /// 文件存在则加载，否则返回空 store
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_tilde(path.as_ref());
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| MemoryError::IoError(format!("无法检查记忆文件: {e}")))?;
        if exists {
            Self::load(&path).await
        } else {
            info!(path = %path.display(), "🗄️ 记忆文件不存在，使用空记忆库");
            Ok(Self::new())
        }
    }
}

pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/")
        && let Some(home) = std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok())
    {
        return PathBuf::from(home).join(&s[2..]);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BanterError;
    use crate::testing::ManualClock;

    fn msgs(text: &str) -> Vec<Message> {
        vec![
            Message::user(text.to_string()),
            Message::assistant(format!("reply to {text}")),
        ]
    }

    /// A: {weather, travel} impact 5 @100；B: {weather} impact 9 @200
    async fn weather_store() -> (MemoryStore, Memory, Memory) {
        let clock = Arc::new(ManualClock::new(100));
        let store = MemoryStore::with_clock(clock.clone());
        let a = store
            .create(msgs("a"), "A".to_string(), 5, ["weather", "travel"])
            .await
            .unwrap();
        clock.set(200);
        let b = store
            .create(msgs("b"), "B".to_string(), 9, ["weather"])
            .await
            .unwrap();
        (store, a, b)
    }

    #[tokio::test]
    async fn test_get_returns_created_memory() {
        let (store, a, b) = weather_store().await;
        assert_eq!(store.get(a.uuid).await.unwrap(), a);
        assert_eq!(store.get(b.uuid).await.unwrap(), b);
        assert_eq!(a.timestamp, 100);
        assert_eq!(b.timestamp, 200);
    }

    #[tokio::test]
    async fn test_get_unknown_uuid() {
        let store = MemoryStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BanterError::Memory(MemoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_prefers_impact_on_equal_matches() {
        let (store, a, b) = weather_store().await;
        let result = store.query(["weather"], 10).await;
        assert_eq!(result, vec![b, a]);
    }

    #[tokio::test]
    async fn test_query_prefers_more_matches() {
        let (store, a, b) = weather_store().await;
        let result = store.query(["weather", "travel"], 10).await;
        assert_eq!(result, vec![a, b]);
    }

    #[tokio::test]
    async fn test_query_recency_breaks_ties() {
        let clock = Arc::new(ManualClock::new(10));
        let store = MemoryStore::with_clock(clock.clone());
        let old = store.create(msgs("old"), "old".to_string(), 4, ["cat"]).await.unwrap();
        clock.set(20);
        let new = store.create(msgs("new"), "new".to_string(), 4, ["cat"]).await.unwrap();

        let result = store.query(["Cat"], 10).await;
        assert_eq!(result, vec![new, old]);
    }

    #[tokio::test]
    async fn test_query_respects_limit_and_misses() {
        let (store, _, b) = weather_store().await;
        assert_eq!(store.query(["weather"], 1).await, vec![b]);
        assert!(store.query(["weather"], 0).await.is_empty());
        assert!(store.query(["nonexistent"], 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_payload() {
        let store = MemoryStore::new();

        let err = store
            .create(vec![], "s".to_string(), 1, ["k"])
            .await
            .unwrap_err();
        assert!(matches!(err, BanterError::Memory(MemoryError::Validation(_))));

        let err = store
            .create(msgs("x"), "s".to_string(), 1, ["  ", ""])
            .await
            .unwrap_err();
        assert!(matches!(err, BanterError::Memory(MemoryError::Validation(_))));

        assert!(store.is_empty().await);
        assert!(store.keywords().await.is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_never_decrease() {
        let clock = Arc::new(ManualClock::new(500));
        let store = MemoryStore::with_clock(clock.clone());
        store.create(msgs("a"), "a".to_string(), 1, ["a"]).await.unwrap();
        clock.set(400);
        let b = store.create(msgs("b"), "b".to_string(), 1, ["b"]).await.unwrap();
        assert_eq!(b.timestamp, 500);
    }

    #[tokio::test]
    async fn test_index_follows_create_and_remove() {
        let (store, a, b) = weather_store().await;
        assert!(store.lookup("travel").await.contains(&a.uuid));

        store.remove(a.uuid).await.unwrap();

        assert!(store.lookup("travel").await.is_empty());
        assert!(!store.keywords().await.contains("travel"));
        assert_eq!(store.lookup("weather").await, HashSet::from([b.uuid]));
        assert_eq!(store.all().await, vec![b.clone()]);
        assert_eq!(store.get(b.uuid).await.unwrap(), b);

        let err = store.remove(a.uuid).await.unwrap_err();
        assert!(matches!(err, BanterError::Memory(MemoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_all_in_creation_order() {
        let (store, a, b) = weather_store().await;
        assert_eq!(store.all().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_prune_evicts_lowest_impact_first() {
        let clock = Arc::new(ManualClock::new(1));
        let store = MemoryStore::with_clock(clock.clone());
        let low = store.create(msgs("low"), "low".to_string(), 1, ["x"]).await.unwrap();
        clock.set(2);
        let high = store.create(msgs("high"), "high".to_string(), 9, ["y"]).await.unwrap();
        clock.set(3);
        let mid = store.create(msgs("mid"), "mid".to_string(), 5, ["x"]).await.unwrap();

        let evicted = store.prune(2).await;
        assert_eq!(evicted, vec![low]);
        assert_eq!(store.all().await, vec![high, mid.clone()]);
        assert_eq!(store.lookup("x").await, HashSet::from([mid.uuid]));
        assert!(store.prune(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_fuzzy_query_expands_similar_keywords() {
        let store = MemoryStore::new();
        let cat = store.create(msgs("1"), "cat".to_string(), 6, ["cat", "dog"]).await.unwrap();
        let cats = store.create(msgs("2"), "cats".to_string(), 8, ["cats"]).await.unwrap();
        store.create(msgs("3"), "car".to_string(), 7, ["eat", "drive"]).await.unwrap();

        assert_eq!(store.query(["cat"], 10).await, vec![cat.clone()]);

        let fuzzy = store.query_fuzzy(["cat"], 10, 0.9).await;
        assert_eq!(fuzzy, vec![cats, cat]);
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let (store, a, b) = weather_store().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.bin");

        store.persist(&path).await.unwrap();
        let loaded = MemoryStore::load(&path).await.unwrap();

        assert_eq!(loaded.all().await, vec![a.clone(), b.clone()]);
        assert_eq!(loaded.query(["weather"], 10).await, vec![b, a]);
        assert_eq!(loaded.keywords().await, store.keywords().await);
    }

    #[tokio::test]
    async fn test_load_rejects_truncated_file() {
        let (store, _, _) = weather_store().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.bin");
        let bytes = store.to_bytes().await.unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

        let err = MemoryStore::load(&path).await.err().unwrap();
        assert!(err.is_corruption());
    }

    #[tokio::test]
    async fn test_open_missing_file_gives_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("none.bin")).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_open_reports_unreadable_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        let err = MemoryStore::open(file.join("memories.bin")).await.err().unwrap();
        assert!(matches!(err, BanterError::Memory(MemoryError::IoError(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_persist_is_serialized() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..50 {
            let own = format!("k{i}");
            store
                .create(msgs(&own), format!("m{i}"), i, ["shared", own.as_str()])
                .await
                .unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memories.bin");

        for _ in 0..5 {
            let mut handles = Vec::new();
            for _ in 0..8 {
                let store = store.clone();
                let path = path.clone();
                handles.push(tokio::spawn(async move { store.persist(&path).await }));
            }
            for h in handles {
                h.await.unwrap().unwrap();
            }
        }

        let loaded = MemoryStore::load(&path).await.unwrap();
        assert_eq!(loaded.all().await, store.all().await);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_loaded_mixed_case_keywords_are_queryable() {
        let record = serde_json::json!({
            "keywords": ["Weather"], "summary": "s", "impact": 1, "timestamp": 1,
            "messages": [{"role": "user", "content": "rain again"}],
            "uuid": Uuid::new_v4().to_string()
        });
        let body = record.to_string().into_bytes();
        let mut bytes = (body.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&body);

        let store = MemoryStore::from_bytes(&bytes).unwrap();
        assert_eq!(store.query(["weather"], 5).await.len(), 1);
        assert_eq!(store.lookup("WEATHER").await.len(), 1);
    }

    #[tokio::test]
    async fn test_prune_keeping_protects_memory() {
        let clock = Arc::new(ManualClock::new(1));
        let store = MemoryStore::with_clock(clock.clone());
        let strong = store.create(msgs("a"), "a".to_string(), 9, ["x"]).await.unwrap();
        clock.set(2);
        let fresh = store.create(msgs("b"), "b".to_string(), 1, ["y"]).await.unwrap();

        let evicted = store.prune_keeping(1, fresh.uuid).await;
        assert_eq!(evicted, vec![strong]);
        assert_eq!(store.all().await, vec![fresh]);
    }

    #[tokio::test]
    async fn test_loaded_store_keeps_timestamps_monotonic() {
        let (store, _, _) = weather_store().await;
        let bytes = store.to_bytes().await.unwrap();
        let loaded =
            MemoryStore::from_bytes_with_clock(&bytes, Arc::new(ManualClock::new(50))).unwrap();
        let c = loaded.create(msgs("c"), "c".to_string(), 1, ["c"]).await.unwrap();
        assert_eq!(c.timestamp, 200);
    }

    #[tokio::test]
    async fn test_concurrent_creates_stay_consistent() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let own = format!("k{i}");
                store
                    .create(msgs(&own), format!("m{i}"), i, ["shared", own.as_str()])
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.len().await, 16);
        assert_eq!(store.lookup("shared").await.len(), 16);
        assert_eq!(store.query(["shared"], 3).await.len(), 3);
    }
}
