//! Handle tracking: which resources exist and whether they are checked out

use std::collections::HashMap;

/// Opaque identifier for one pooled resource instance.
///
/// Handles are allocated from a per-pool counter and never reused, so a
/// stale handle can never alias a newer resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub(crate) usize);

/// Whether a handle is currently checked out or available for reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Checked out to a caller
    Active,
    /// Available for reuse
    Inactive,
}

/// Outcome of a set-Inactive transition, so the pool can apply its
/// duplicate-release policy without a second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReleaseOutcome {
    Released,
    AlreadyInactive,
    Unknown,
}

/// Mapping from handle to status, with O(1) transitions and an
/// incrementally maintained active counter.
///
/// Mutating a handle absent from the map is a no-op signalled through the
/// return value, never a panic.
#[derive(Debug, Default)]
pub(crate) struct TrackingRegistry {
    entries: HashMap<ResourceHandle, ResourceStatus>,
    active: usize,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created handle as Inactive. Returns false if the
    /// handle was already tracked (the entry is left untouched).
    pub fn insert_inactive(&mut self, handle: ResourceHandle) -> bool {
        match self.entries.entry(handle) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(ResourceStatus::Inactive);
                true
            }
        }
    }

    /// Flip a handle to Active. Returns false when the handle is unknown
    /// or already Active.
    pub fn set_active(&mut self, handle: ResourceHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(status) if *status == ResourceStatus::Inactive => {
                *status = ResourceStatus::Active;
                self.active += 1;
                true
            }
            _ => false,
        }
    }

    /// Flip a handle to Inactive.
    pub fn set_inactive(&mut self, handle: ResourceHandle) -> ReleaseOutcome {
        match self.entries.get_mut(&handle) {
            Some(status) if *status == ResourceStatus::Active => {
                *status = ResourceStatus::Inactive;
                self.active -= 1;
                ReleaseOutcome::Released
            }
            Some(_) => ReleaseOutcome::AlreadyInactive,
            None => ReleaseOutcome::Unknown,
        }
    }

    /// Remove a handle entirely. Unknown handles are a silent no-op.
    pub fn remove(&mut self, handle: ResourceHandle) -> Option<ResourceStatus> {
        let status = self.entries.remove(&handle)?;
        if status == ResourceStatus::Active {
            self.active -= 1;
        }
        Some(status)
    }

    pub fn status(&self, handle: ResourceHandle) -> Option<ResourceStatus> {
        self.entries.get(&handle).copied()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn inactive_count(&self) -> usize {
        self.entries.len() - self.active
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Snapshot of every Active handle, taken before the caller iterates.
    pub fn active_handles(&self) -> Vec<ResourceHandle> {
        self.entries
            .iter()
            .filter(|(_, status)| **status == ResourceStatus::Active)
            .map(|(handle, _)| *handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: usize) -> ResourceHandle {
        ResourceHandle(id)
    }

    #[test]
    fn counts_track_transitions() {
        let mut registry = TrackingRegistry::new();
        assert!(registry.insert_inactive(handle(1)));
        assert!(registry.insert_inactive(handle(2)));
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.inactive_count(), 2);

        assert!(registry.set_active(handle(1)));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.inactive_count(), 1);
        assert_eq!(registry.status(handle(1)), Some(ResourceStatus::Active));

        assert_eq!(registry.set_inactive(handle(1)), ReleaseOutcome::Released);
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.active_count() + registry.inactive_count(), registry.count());
    }

    #[test]
    fn absent_handles_are_signalled_noops() {
        let mut registry = TrackingRegistry::new();
        assert!(!registry.set_active(handle(9)));
        assert_eq!(registry.set_inactive(handle(9)), ReleaseOutcome::Unknown);
        assert_eq!(registry.remove(handle(9)), None);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut registry = TrackingRegistry::new();
        assert!(registry.insert_inactive(handle(1)));
        assert!(registry.set_active(handle(1)));
        assert!(!registry.insert_inactive(handle(1)));
        // the Active entry survives the rejected insert
        assert_eq!(registry.status(handle(1)), Some(ResourceStatus::Active));
    }

    #[test]
    fn duplicate_transitions_are_reported() {
        let mut registry = TrackingRegistry::new();
        registry.insert_inactive(handle(1));
        registry.set_active(handle(1));
        assert!(!registry.set_active(handle(1)));
        assert_eq!(registry.set_inactive(handle(1)), ReleaseOutcome::Released);
        assert_eq!(
            registry.set_inactive(handle(1)),
            ReleaseOutcome::AlreadyInactive
        );
    }

    #[test]
    fn removing_active_handle_fixes_counter() {
        let mut registry = TrackingRegistry::new();
        registry.insert_inactive(handle(1));
        registry.set_active(handle(1));
        assert_eq!(registry.remove(handle(1)), Some(ResourceStatus::Active));
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn active_handles_snapshot() {
        let mut registry = TrackingRegistry::new();
        for id in 0..4 {
            registry.insert_inactive(handle(id));
        }
        registry.set_active(handle(1));
        registry.set_active(handle(3));

        let mut active = registry.active_handles();
        active.sort();
        assert_eq!(active, vec![handle(1), handle(3)]);
    }
}
