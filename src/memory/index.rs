//! 关键词倒排索引
//!
//! keyword → 记忆 uuid 集合。索引是派生结构，可随时由记忆集合重建，
//! 因此从不单独持久化。

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 倒排索引，由 [`MemoryStore`](crate::memory::MemoryStore) 独占持有
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    entries: HashMap<String, HashSet<Uuid>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 把 uuid 挂到每个关键词下，重复添加无副作用
    pub fn add<I, S>(&mut self, uuid: Uuid, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            self.entries
                .entry(keyword.as_ref().to_string())
                .or_default()
                .insert(uuid);
        }
    }

    /// 从每个关键词下移除 uuid，集合变空时连同条目一起删除
    pub fn remove<I, S>(&mut self, uuid: Uuid, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in keywords {
            let keyword = keyword.as_ref();
            if let Some(uuids) = self.entries.get_mut(keyword) {
                uuids.remove(&uuid);
                if uuids.is_empty() {
                    self.entries.remove(keyword);
                }
            }
        }
    }

    /// 查询关键词对应的 uuid 集合，未知关键词返回空集
    pub fn lookup(&self, keyword: &str) -> HashSet<Uuid> {
        self.entries.get(keyword).cloned().unwrap_or_default()
    }

    pub(crate) fn get(&self, keyword: &str) -> Option<&HashSet<Uuid>> {
        self.entries.get(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut index = MemoryIndex::new();
        let id = Uuid::new_v4();
        index.add(id, ["weather", "travel"]);
        index.add(id, ["weather"]);

        assert_eq!(index.lookup("weather").len(), 1);
        assert!(index.lookup("travel").contains(&id));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_remove_prunes_empty_entries() {
        let mut index = MemoryIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.add(a, ["weather", "travel"]);
        index.add(b, ["weather"]);

        index.remove(a, ["weather", "travel"]);

        assert!(index.lookup("travel").is_empty());
        assert!(index.get("travel").is_none(), "空条目应被删除");
        assert_eq!(index.lookup("weather"), HashSet::from([b]));
    }

    #[test]
    fn test_lookup_unknown_keyword() {
        let index = MemoryIndex::new();
        assert!(index.lookup("nonexistent").is_empty());
    }
}
