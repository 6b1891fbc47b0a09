//! 履歴台帳（メモリ上、新しい順、追記のみ）

use chrono::{DateTime, Utc};

use crate::language::find_language;
use crate::types::{BinaryAsset, EntryId, HistoryEntry, OperationMode};

/// 履歴エントリの材料（IDは台帳が採番）
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub original_text: String,
    pub files: Vec<BinaryAsset>,
    pub result: Option<String>,
    pub mode: OperationMode,
    pub language_code: String,
    pub timestamp: DateTime<Utc>,
}

/// 履歴台帳
///
/// IDはセッション内の連番なので同一ミリ秒に完了しても衝突しない
#[derive(Debug, Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    next_id: u64,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 先頭に追加（重複排除・削除なし）
    pub fn append(&mut self, entry: NewEntry) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.insert(
            0,
            HistoryEntry {
                id,
                original_text: entry.original_text,
                files: entry.files,
                result: entry.result,
                mode: entry.mode,
                language_code: entry.language_code,
                timestamp: entry.timestamp,
            },
        );
        id
    }

    /// 新しい順の全エントリ
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 大文字小文字を区別しない部分一致検索
    ///
    /// 本文、または言語の表示名・現地語名に一致するエントリを新しい順で返す。
    /// カタログにない言語コードのエントリは本文のみで判定する。
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| matches_query(entry, &query))
            .collect()
    }
}

fn matches_query(entry: &HistoryEntry, query: &str) -> bool {
    if entry.original_text.to_lowercase().contains(query) {
        return true;
    }
    match find_language(&entry.language_code) {
        Some(lang) => {
            lang.display_name.to_lowercase().contains(query)
                || lang.native_display_name.to_lowercase().contains(query)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(text: &str, language_code: &str) -> NewEntry {
        NewEntry {
            original_text: text.to_string(),
            files: vec![],
            result: Some(format!("result of {}", text)),
            mode: OperationMode::Simplify,
            language_code: language_code.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_append_newest_first() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("first", "en"));
        ledger.append(new_entry("second", "en"));

        let texts: Vec<_> = ledger.entries().iter().map(|e| e.original_text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn test_ids_unique_with_same_timestamp() {
        let mut ledger = HistoryLedger::new();
        let timestamp = Utc::now();
        let mut a = new_entry("same", "en");
        a.timestamp = timestamp;
        let mut b = new_entry("same", "en");
        b.timestamp = timestamp;

        let id_a = ledger.append(a);
        let id_b = ledger.append(b);
        assert_ne!(id_a, id_b);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_get_by_id() {
        let mut ledger = HistoryLedger::new();
        let id = ledger.append(new_entry("lookup", "fr"));
        assert_eq!(ledger.get(id).unwrap().original_text, "lookup");
        assert!(ledger.get(EntryId(999)).is_none());
    }

    #[test]
    fn test_search_text_case_insensitive() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("Photosynthesis basics", "en"));
        ledger.append(new_entry("Cell division", "en"));

        let hits = ledger.search("PHOTO");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].original_text, "Photosynthesis basics");
    }

    #[test]
    fn test_search_by_native_name_matches_language_only() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("Les volcans", "fr"));
        ledger.append(new_entry("Volcanoes", "en"));
        ledger.append(new_entry("Vulkane", "de"));
        ledger.append(new_entry("Plus de volcans", "fr"));

        let hits = ledger.search("français");
        let codes: Vec<_> = hits.iter().map(|e| e.language_code.as_str()).collect();
        assert_eq!(codes, vec!["fr", "fr"]);
    }

    #[test]
    fn test_search_by_display_name() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("درس", "ar-sy"));
        ledger.append(new_entry("lesson", "en"));

        let hits = ledger.search("syrian");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].language_code, "ar-sy");
    }

    #[test]
    fn test_search_unknown_language_matches_text_only() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("Klingon grammar", "tlh"));

        assert!(ledger.search("english").is_empty());
        assert_eq!(ledger.search("grammar").len(), 1);
    }

    #[test]
    fn test_search_empty_query_returns_all() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("a", "en"));
        ledger.append(new_entry("b", "xx"));
        assert_eq!(ledger.search("").len(), 2);
    }

    #[test]
    fn test_search_native_name_is_substring_match() {
        let mut ledger = HistoryLedger::new();
        ledger.append(new_entry("درس مصري", "ar"));
        ledger.append(new_entry("درس فصيح", "ar-fusha"));
        ledger.append(new_entry("درس شامي", "ar-sy"));

        // 「العربية」はエジプト方言の現地語名「العربية (بالمصري)」にも含まれる
        let codes: Vec<&str> = ledger
            .search("العربية")
            .iter()
            .map(|e| e.language_code.as_str())
            .collect();
        assert_eq!(codes, vec!["ar-fusha", "ar"]);
    }
}
