use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{BidHistoryEntry, BidStatus, Party};

#[derive(Debug, Serialize)]
struct BidHistoryRow<'a> {
    bid_thread_id: &'a str,
    created_at: Option<DateTime<Utc>>,
    party: Party,
    status: BidStatus,
    amount: f64,
    note: Option<&'a str>,
}

/// Default export location: the user's download folder, timestamped. The
/// thread id is reduced to `[A-Za-z0-9_-]` so it cannot leave that folder.
pub fn default_export_path(bid_thread_id: &str, now: DateTime<Utc>) -> PathBuf {
    let id: String = bid_thread_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut path = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(format!("bid_{}_{}.csv", id, now.format("%Y%m%d_%H%M%S")));
    path
}

/// Write one negotiation thread to `path` as CSV, one row per event.
pub fn write_bid_history(
    path: &Path,
    bid_thread_id: &str,
    entries: &[BidHistoryEntry],
) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for entry in entries {
        wtr.serialize(BidHistoryRow {
            bid_thread_id,
            created_at: entry.created_at,
            party: entry.party,
            status: entry.status,
            amount: entry.amount,
            note: entry.note.as_deref(),
        })
        .context("Failed to write bid history row")?;
    }
    wtr.flush().context("Failed to flush bid history export")?;

    tracing::info!(rows = entries.len(), path = %path.display(), "Bid history exported");
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(amount: f64, status: BidStatus, party: Party) -> BidHistoryEntry {
        BidHistoryEntry {
            amount,
            status,
            party,
            note: None,
            created_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_write_bid_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let entries = vec![
            entry(430_000.0, BidStatus::Open, Party::Tenant),
            BidHistoryEntry {
                note: Some("includes parking".to_string()),
                ..entry(450_000.0, BidStatus::CounterOffer, Party::Landlord)
            },
        ];

        let rows = write_bid_history(&path, "77", &entries).unwrap();
        assert_eq!(rows, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "bid_thread_id,created_at,party,status,amount,note"
        );
        assert!(lines[1].starts_with("77,2026-02-01T09:30:00Z,TENANT,OPEN,430000.0,"));
        assert!(lines[2].contains("LANDLORD,COUNTER_OFFER,450000.0,includes parking"));
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        assert_eq!(write_bid_history(&path, "1", &[]).unwrap(), 0);
    }

    #[test]
    fn test_default_export_path_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let path = default_export_path("42", now);
        assert!(path.ends_with("bid_42_20260201_093000.csv"));
    }

    #[test]
    fn test_default_export_path_sanitizes_thread_id() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 30, 0).unwrap();
        let path = default_export_path("88/../../etc", now);

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("bid_88_______etc_20260201_093000.csv")
        );
        assert_eq!(
            path.parent(),
            Some(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")).as_path())
        );
    }
}
