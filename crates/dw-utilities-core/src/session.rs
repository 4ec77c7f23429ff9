//! Page-busy and submit-guard bookkeeping scoped to the workflow that owns it.

use std::collections::{BTreeMap, BTreeSet};

/// Holder key for requests that are not tied to a specific form.
pub const PAGE_HOLDER: &str = "page";

/// Tracks which workflows currently keep the page busy. The busy class should
/// be present on the document body exactly while [`BusyTracker::is_busy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyTracker {
    holders: BTreeSet<String>,
}

impl BusyTracker {
    /// Returns `true` when the page switched from idle to busy.
    pub fn acquire(&mut self, holder: &str) -> bool {
        let was_idle = self.holders.is_empty();
        self.holders.insert(holder.to_string());
        was_idle
    }

    /// Returns `true` when the page switched from busy to idle.
    pub fn release(&mut self, holder: &str) -> bool {
        self.holders.remove(holder) && self.holders.is_empty()
    }

    /// Releases `holder` and returns `true` whenever the page is idle
    /// afterwards, even if the holder was never registered. Error paths use
    /// this so a busy class set outside the tracker is still cleared.
    pub fn settle(&mut self, holder: &str) -> bool {
        self.holders.remove(holder);
        self.holders.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        !self.holders.is_empty()
    }

    pub fn holds(&self, holder: &str) -> bool {
        self.holders.contains(holder)
    }
}

/// Pending asynchronous field checks per form. A form may not be submitted
/// while any of its own checks are in flight; other forms are unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitGuards {
    pending: BTreeMap<String, u32>,
}

impl SubmitGuards {
    pub fn begin(&mut self, form: &str) {
        *self.pending.entry(form.to_string()).or_insert(0) += 1;
    }

    pub fn end(&mut self, form: &str) {
        if let Some(count) = self.pending.get_mut(form) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending.remove(form);
            }
        }
    }

    pub fn is_blocked(&self, form: &str) -> bool {
        self.pending.contains_key(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_state_follows_holders() {
        let mut busy = BusyTracker::default();
        assert!(busy.acquire("form.edit-form"));
        assert!(!busy.acquire("upload:cover"));
        assert!(!busy.release("form.edit-form"));
        assert!(busy.is_busy());
        assert!(busy.release("upload:cover"));
        assert!(!busy.is_busy());
    }

    #[test]
    fn releasing_unknown_holder_is_a_no_op() {
        let mut busy = BusyTracker::default();
        assert!(!busy.release(PAGE_HOLDER));
        busy.acquire(PAGE_HOLDER);
        assert!(!busy.release("other"));
        assert!(busy.holds(PAGE_HOLDER));
    }

    #[test]
    fn settling_reports_idle_even_without_a_change() {
        let mut busy = BusyTracker::default();
        assert!(busy.settle(PAGE_HOLDER));

        busy.acquire("form.edit-form");
        assert!(busy.settle("form.edit-form"));
        assert!(!busy.is_busy());
    }

    #[test]
    fn settling_keeps_the_page_busy_for_other_holders() {
        let mut busy = BusyTracker::default();
        busy.acquire("upload:cover");
        busy.acquire("form.edit-form");
        assert!(!busy.settle("form.edit-form"));
        assert!(busy.holds("upload:cover"));
        assert!(busy.settle("upload:cover"));
    }

    #[test]
    fn guards_are_isolated_per_form() {
        let mut guards = SubmitGuards::default();
        guards.begin("form#a");
        guards.begin("form#a");
        assert!(guards.is_blocked("form#a"));
        assert!(!guards.is_blocked("form#b"));
        guards.end("form#a");
        assert!(guards.is_blocked("form#a"));
        guards.end("form#a");
        assert!(!guards.is_blocked("form#a"));
        guards.end("form#a");
        assert!(!guards.is_blocked("form#a"));
    }
}
