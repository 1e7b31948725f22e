//! Cost tracking storage
//!
//! Every metered call appends one record to a monthly JSONL bucket
//! (`costs/YYYY-MM.jsonl`). Aggregation happens at read time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::providers::Response;
use crate::storage::{append_jsonl, current_day, current_month, now_iso, read_jsonl, StoragePaths};

/// One metered call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// When the call completed
    pub timestamp: String,
    /// Model that served the call
    pub model: String,
    /// Provider that served the call
    pub provider: String,
    /// Input token count
    pub input_tokens: u64,
    /// Output token count
    pub output_tokens: u64,
    /// Estimated cost in USD
    pub cost: f64,
}

impl CostRecord {
    /// Builds a record from a provider response, stamped with the
    /// current time
    pub fn from_response(response: &Response) -> Self {
        Self {
            timestamp: now_iso(),
            model: response.model.clone(),
            provider: response.provider.clone(),
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            cost: response.cost,
        }
    }
}

/// Per-model aggregate used by the `costs --by-model` view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelStats {
    /// Number of calls
    pub calls: usize,
    /// Summed input tokens
    pub input_tokens: u64,
    /// Summed output tokens
    pub output_tokens: u64,
    /// Summed estimated cost in USD
    pub cost: f64,
}

/// Store for monthly cost buckets
///
/// # Examples
///
/// ```
/// use agentctl::storage::{CostStore, StoragePaths};
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = CostStore::new(StoragePaths::new(dir.path()));
/// assert!(store.load(None).unwrap().is_empty());
/// ```
pub struct CostStore {
    paths: StoragePaths,
}

impl CostStore {
    /// Creates a store rooted at the given paths
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    fn month_file(&self, month: &str) -> PathBuf {
        self.paths.costs_dir().join(format!("{}.jsonl", month))
    }

    /// Appends a record to the current month's bucket
    pub fn record(&self, record: &CostRecord) -> Result<()> {
        let path = self.month_file(&current_month());
        append_jsonl(&path, record)?;
        tracing::debug!(
            "Recorded cost: {} {} ${:.4}",
            record.provider,
            record.model,
            record.cost
        );
        Ok(())
    }

    /// Loads every record for a month (`YYYY-MM`), defaulting to the
    /// current one; a missing bucket reads as empty
    pub fn load(&self, month: Option<&str>) -> Result<Vec<CostRecord>> {
        let month = month.map(str::to_string).unwrap_or_else(current_month);
        read_jsonl(&self.month_file(&month))
    }

    /// Loads today's records from the current month's bucket
    pub fn load_today(&self) -> Result<Vec<CostRecord>> {
        let day = current_day();
        let mut records = self.load(None)?;
        records.retain(|r| r.timestamp.starts_with(&day));
        Ok(records)
    }
}

/// Groups records by model name
pub fn by_model(records: &[CostRecord]) -> BTreeMap<String, ModelStats> {
    let mut stats: BTreeMap<String, ModelStats> = BTreeMap::new();
    for record in records {
        let entry = stats.entry(record.model.clone()).or_default();
        entry.calls += 1;
        entry.input_tokens += record.input_tokens;
        entry.output_tokens += record.output_tokens;
        entry.cost += record.cost;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, CostStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CostStore::new(StoragePaths::new(dir.path()));
        (dir, store)
    }

    fn record(model: &str, input: u64, output: u64, cost: f64) -> CostRecord {
        CostRecord {
            timestamp: now_iso(),
            model: model.to_string(),
            provider: "openai".to_string(),
            input_tokens: input,
            output_tokens: output,
            cost,
        }
    }

    #[test]
    fn test_record_lands_in_current_month_bucket() {
        let (dir, store) = store();
        store.record(&record("gpt-4o", 10, 5, 0.001)).unwrap();

        let bucket = dir
            .path()
            .join("costs")
            .join(format!("{}.jsonl", current_month()));
        assert!(bucket.exists());

        let records = store.load(None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "gpt-4o");
    }

    #[test]
    fn test_load_other_month_is_empty() {
        let (_dir, store) = store();
        store.record(&record("gpt-4o", 10, 5, 0.001)).unwrap();
        assert!(store.load(Some("1999-01")).unwrap().is_empty());
    }

    #[test]
    fn test_load_today_filters_by_day() {
        let (dir, store) = store();
        store.record(&record("gpt-4o", 10, 5, 0.001)).unwrap();

        // Hand-write a record from another day into the same bucket
        let old = CostRecord {
            timestamp: "2001-01-01T00:00:00.000000".to_string(),
            ..record("gpt-4o", 1, 1, 0.1)
        };
        let bucket = dir
            .path()
            .join("costs")
            .join(format!("{}.jsonl", current_month()));
        append_jsonl(&bucket, &old).unwrap();

        assert_eq!(store.load(None).unwrap().len(), 2);
        let today = store.load_today().unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].input_tokens, 10);
    }

    #[test]
    fn test_million_token_record_costs_12_50() {
        let (_dir, store) = store();
        // 1M input at $2.50 plus 1M output at $10.00
        store
            .record(&record("gpt-4o", 1_000_000, 1_000_000, 12.50))
            .unwrap();
        let records = store.load(None).unwrap();
        assert_eq!(records[0].cost, 12.50);
    }

    #[test]
    fn test_by_model_aggregation() {
        let records = vec![
            record("gpt-4o", 100, 50, 0.002),
            record("gpt-4o", 200, 100, 0.004),
            record("claude-sonnet-4-20250514", 10, 5, 0.001),
        ];
        let stats = by_model(&records);
        assert_eq!(stats.len(), 2);

        let gpt = &stats["gpt-4o"];
        assert_eq!(gpt.calls, 2);
        assert_eq!(gpt.input_tokens, 300);
        assert_eq!(gpt.output_tokens, 150);
        assert!((gpt.cost - 0.006).abs() < 1e-9);

        assert_eq!(stats["claude-sonnet-4-20250514"].calls, 1);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let (dir, store) = store();
        store.record(&record("gpt-4o", 10, 5, 0.001)).unwrap();
        let bucket = dir
            .path()
            .join("costs")
            .join(format!("{}.jsonl", current_month()));
        let mut contents = std::fs::read_to_string(&bucket).unwrap();
        contents.push_str("{truncated\n");
        std::fs::write(&bucket, contents).unwrap();
        store.record(&record("gpt-4o-mini", 1, 1, 0.0)).unwrap();

        let records = store.load(None).unwrap();
        assert_eq!(records.len(), 2);
    }
}
