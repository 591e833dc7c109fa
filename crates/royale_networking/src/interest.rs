//! # Interest Tracking
//!
//! Per-viewer object lifecycle that decides which list each object goes in:
//!
//! ```text
//!            enters view            changed while visible
//! Unseen ─────────────────▶ Known ─────────────────────▶ partial (or full
//!   ▲       (full)            │                            if creation
//!   │                         │ leaves view / destroyed    fields changed)
//!   └─────────────────────────┘
//!            (deleted)
//! ```
//!
//! The tracker only sorts ids. The caller builds the object records for
//! each list and puts them in the [`UpdateMessage`](crate::protocol::UpdateMessage).

use std::collections::HashSet;

use crate::protocol::ObjectId;

/// Where an object stands for one viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterestState {
    /// Never sent, or deleted since.
    Unseen,
    /// Full data has been sent.
    Known,
}

/// Ids to send this tick, each list sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterestPlan {
    /// Send full data.
    pub full: Vec<ObjectId>,
    /// Send partial data.
    pub partial: Vec<ObjectId>,
    /// Send as deleted.
    pub deleted: Vec<ObjectId>,
}

impl InterestPlan {
    /// True if nothing needs sending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.partial.is_empty() && self.deleted.is_empty()
    }
}

/// Tracks which objects one viewer knows about.
#[derive(Debug, Default)]
pub struct InterestTracker {
    known: HashSet<ObjectId>,
}

impl InterestTracker {
    /// Creates a tracker for a viewer that knows nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything, e.g. after the viewer reconnects.
    pub fn reset(&mut self) {
        self.known.clear();
    }

    /// State of one object.
    #[must_use]
    pub fn state(&self, id: ObjectId) -> InterestState {
        if self.known.contains(&id) {
            InterestState::Known
        } else {
            InterestState::Unseen
        }
    }

    /// Number of known objects.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// Plans one tick and advances every object's state.
    ///
    /// - `visible`: objects in the viewer's interest set this tick
    /// - `full_dirty`: objects whose creation fields changed
    /// - `partial_dirty`: objects whose partial fields changed
    pub fn plan(
        &mut self,
        visible: &HashSet<ObjectId>,
        full_dirty: &HashSet<ObjectId>,
        partial_dirty: &HashSet<ObjectId>,
    ) -> InterestPlan {
        let mut plan = InterestPlan::default();

        for &id in visible {
            if !self.known.contains(&id) || full_dirty.contains(&id) {
                plan.full.push(id);
            } else if partial_dirty.contains(&id) {
                plan.partial.push(id);
            }
        }

        plan.deleted = self.known.difference(visible).copied().collect();

        self.known.retain(|id| visible.contains(id));
        self.known.extend(plan.full.iter().copied());

        plan.full.sort_unstable();
        plan.partial.sort_unstable();
        plan.deleted.sort_unstable();

        tracing::trace!(
            full = plan.full.len(),
            partial = plan.partial.len(),
            deleted = plan.deleted.len(),
            known = self.known.len(),
            "interest planned"
        );
        plan
    }
}
