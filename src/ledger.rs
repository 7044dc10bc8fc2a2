//! Incremental-run bookkeeping for a watched folder.
//!
//! A [`Ledger`] is an explicit, versioned value: planning reads it, advancing returns a
//! new one. Reading and writing it is left to the caller; it derives serde for that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

pub const LEDGER_FORMAT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub format: u32,
    /// Bumped on every [`Ledger::advance`].
    pub version: u64,
    pub last_run: DateTime<Utc>,
    pub processed: BTreeSet<PathBuf>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            format: LEDGER_FORMAT,
            version: 0,
            last_run: DateTime::<Utc>::UNIX_EPOCH,
            processed: BTreeSet::new(),
        }
    }
}

/// A document found in the watched folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path; the ledger tracks documents by it.
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Documents to compile this run, in path order.
    pub eligible: Vec<PathBuf>,
    /// Documents already handled or not modified since the last run.
    pub skipped: Vec<PathBuf>,
}

impl Ledger {
    /// Splits candidates into those modified after the last run and never processed,
    /// and the rest.
    pub fn plan(&self, candidates: &[Candidate]) -> Plan {
        let mut sorted: Vec<&Candidate> = candidates.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        sorted.dedup_by(|a, b| a.path == b.path);

        let mut plan = Plan::default();
        for candidate in sorted {
            if candidate.modified > self.last_run && !self.processed.contains(&candidate.path) {
                plan.eligible.push(candidate.path.clone());
            } else {
                plan.skipped.push(candidate.path.clone());
            }
        }
        tracing::debug!(
            eligible = plan.eligible.len(),
            skipped = plan.skipped.len(),
            since = %self.last_run,
            "planned incremental run"
        );
        plan
    }

    /// The ledger after a run started at `now` that successfully handled `processed`.
    /// Failed documents are simply left out so the next run retries them.
    pub fn advance<I>(&self, processed: I, now: DateTime<Utc>) -> Ledger
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut next = self.clone();
        next.processed.extend(processed);
        next.last_run = now;
        next.version += 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn candidate(path: &str, modified: i64) -> Candidate {
        Candidate {
            path: PathBuf::from(path),
            modified: at(modified),
        }
    }

    #[test]
    fn fresh_ledger_accepts_everything() {
        let plan = Ledger::default().plan(&[candidate("/v/b.md", 10), candidate("/v/a.md", 5)]);
        assert_eq!(plan.eligible, vec![PathBuf::from("/v/a.md"), PathBuf::from("/v/b.md")]);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn skips_old_and_processed_documents() {
        let ledger = Ledger::default().advance([PathBuf::from("/v/done.md")], at(100));
        let plan = ledger.plan(&[
            candidate("/v/done.md", 200),
            candidate("/v/old.md", 50),
            candidate("/v/new.md", 150),
        ]);
        assert_eq!(plan.eligible, vec![PathBuf::from("/v/new.md")]);
        assert_eq!(
            plan.skipped,
            vec![PathBuf::from("/v/done.md"), PathBuf::from("/v/old.md")]
        );
    }

    #[test]
    fn advance_returns_a_new_version() {
        let first = Ledger::default();
        let second = first.advance(Vec::new(), at(42));
        assert_eq!(first.version, 0);
        assert_eq!(second.version, 1);
        assert_eq!(second.last_run, at(42));
        assert_eq!(first.last_run, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn ledger_round_trips_through_json() {
        let ledger = Ledger::default().advance([PathBuf::from("/v/a.md")], at(7));
        let json = serde_json::to_string(&ledger).unwrap();
        assert!(json.contains("\"lastRun\""));
        let back: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
