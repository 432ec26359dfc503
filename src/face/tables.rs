//! Tables owned exclusively by a Face: the pending-interest table, the
//! interest-filter table, and the registered-prefix table.
//!
//! Entries are referenced from outside only by id; ids come from one
//! monotonic pool and are never reused. Removal requested before the
//! matching insertion (registration is asynchronous) is recorded in a
//! pending-removal set that the insertion site consults.

use std::collections::HashSet;
use std::time::Instant;

use regex::Regex;
use tokio::task::JoinHandle;

use crate::wire::{Data, Interest, Name};

/// Callback invoked with the matched Interest and the arriving Data.
pub type OnData = Box<dyn FnOnce(&Interest, &Data) + Send>;

/// Callback invoked when an Interest's lifetime expires unanswered.
pub type OnTimeout = Box<dyn FnOnce(&Interest) + Send>;

/// Callback invoked for every inbound Interest matching a filter.
pub type OnInterest = Box<dyn FnMut(&Name, &Interest) + Send>;

/// Callback invoked when a prefix registration fails.
pub type OnRegisterFailed = Box<dyn FnOnce(&Name) + Send>;

/// Callback invoked when a prefix registration succeeds.
pub type OnRegisterSuccess = Box<dyn FnOnce(&Name, u64) + Send>;

/// A name predicate for dispatching inbound Interests.
#[derive(Debug, Clone)]
pub struct InterestFilter {
    /// Names must fall under this prefix.
    pub prefix: Name,
    /// Optional additional pattern matched against the name URI.
    pub regex: Option<Regex>,
}

impl InterestFilter {
    /// Filter on a prefix alone.
    pub fn new(prefix: Name) -> Self {
        Self {
            prefix,
            regex: None,
        }
    }

    /// Filter on a prefix plus a URI pattern.
    pub fn with_regex(prefix: Name, regex: Regex) -> Self {
        Self {
            prefix,
            regex: Some(regex),
        }
    }

    /// Whether `name` satisfies the filter.
    pub fn matches(&self, name: &Name) -> bool {
        self.prefix.is_prefix_of(name)
            && self
                .regex
                .as_ref()
                .is_none_or(|re| re.is_match(&name.to_uri()))
    }
}

/// One outstanding Interest.
pub struct PitEntry {
    /// Unique id for the life of the Face.
    pub id: u64,
    /// The expressed Interest.
    pub interest: Interest,
    /// Invoked on matching Data.
    pub on_data: OnData,
    /// Invoked on lifetime expiry.
    pub on_timeout: Option<OnTimeout>,
    /// When the entry was created.
    pub created_at: Instant,
    /// Handle of the lifetime timer task.
    pub timer: Option<JoinHandle<()>>,
}

/// One installed interest filter.
pub struct FilterEntry {
    /// Unique id.
    pub id: u64,
    /// The predicate.
    pub filter: InterestFilter,
    /// Invoked for each matching inbound Interest.
    pub on_interest: OnInterest,
}

/// One prefix registered with the forwarder.
#[derive(Debug, Clone)]
pub struct PrefixEntry {
    /// Unique id.
    pub id: u64,
    /// The registered prefix.
    pub prefix: Name,
    /// Id of the filter installed alongside, or 0.
    pub related_filter_id: u64,
}

/// All Face-owned tables.
#[derive(Default)]
pub struct Tables {
    pit: Vec<PitEntry>,
    filters: Vec<FilterEntry>,
    prefixes: Vec<PrefixEntry>,
    pending_interest_removals: HashSet<u64>,
    pending_prefix_removals: HashSet<u64>,
}

impl Tables {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding Interests.
    pub fn pit_len(&self) -> usize {
        self.pit.len()
    }

    /// Insert a PIT entry unless its removal was already requested.
    ///
    /// Returns the entry unchanged when insertion is suppressed so the
    /// caller can cancel its timer.
    pub fn insert_pit(&mut self, entry: PitEntry) -> Result<(), PitEntry> {
        if self.pending_interest_removals.remove(&entry.id) {
            return Err(entry);
        }
        self.pit.push(entry);
        Ok(())
    }

    /// Remove a PIT entry by id.
    pub fn remove_pit(&mut self, id: u64) -> Option<PitEntry> {
        let idx = self.pit.iter().position(|e| e.id == id)?;
        Some(self.pit.remove(idx))
    }

    /// Record that a PIT entry should be skipped when it is inserted.
    pub fn defer_pit_removal(&mut self, id: u64) {
        self.pending_interest_removals.insert(id);
    }

    /// Whether a deferred removal is recorded for this PIT id, erasing
    /// the marker.
    pub fn take_deferred_pit_removal(&mut self, id: u64) -> bool {
        self.pending_interest_removals.remove(&id)
    }

    /// Remove and return every entry whose Interest matches `data`.
    ///
    /// The walk is index-descending so removal cannot skip entries; the
    /// result is flipped back to insertion order for callback delivery.
    pub fn extract_matches(&mut self, data: &Data) -> Vec<PitEntry> {
        let mut matched = Vec::new();
        let mut i = self.pit.len();
        while i > 0 {
            i -= 1;
            if self.pit[i].interest.matches_data(data) {
                matched.push(self.pit.remove(i));
            }
        }
        matched.reverse();
        matched
    }

    /// Remove every PIT entry (Face close).
    pub fn drain_pit(&mut self) -> Vec<PitEntry> {
        std::mem::take(&mut self.pit)
    }

    /// Install an interest filter.
    pub fn insert_filter(&mut self, entry: FilterEntry) {
        self.filters.push(entry);
    }

    /// Remove a filter by id.
    pub fn remove_filter(&mut self, id: u64) -> Option<FilterEntry> {
        let idx = self.filters.iter().position(|e| e.id == id)?;
        Some(self.filters.remove(idx))
    }

    /// Number of installed filters.
    pub fn filter_len(&self) -> usize {
        self.filters.len()
    }

    /// The filters in insertion order.
    pub fn filters_mut(&mut self) -> &mut [FilterEntry] {
        &mut self.filters
    }

    /// Insert a registered-prefix entry unless its removal was requested.
    pub fn insert_prefix(&mut self, entry: PrefixEntry) -> bool {
        if self.pending_prefix_removals.remove(&entry.id) {
            return false;
        }
        self.prefixes.push(entry);
        true
    }

    /// Remove a registered-prefix entry by id.
    pub fn remove_prefix(&mut self, id: u64) -> Option<PrefixEntry> {
        let idx = self.prefixes.iter().position(|e| e.id == id)?;
        Some(self.prefixes.remove(idx))
    }

    /// Record that a prefix entry should be skipped when it is inserted.
    pub fn defer_prefix_removal(&mut self, id: u64) {
        self.pending_prefix_removals.insert(id);
    }

    /// Whether a deferred removal is recorded for this prefix id, erasing
    /// the marker.
    pub fn take_deferred_prefix_removal(&mut self, id: u64) -> bool {
        self.pending_prefix_removals.remove(&id)
    }
}
