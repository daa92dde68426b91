//! Selection state and stale-response tracking.
//!
//! [`Selection`] is the single source of truth for what the content area
//! should display: the tuple of (category, subcategory, time filter).
//! Every reload reads the full current tuple, never a partial snapshot.
//!
//! [`RequestToken`] implements last-request-wins for one logical view.
//! Each spawned fetch carries the generation it was issued under; the
//! event handler discards any result whose generation is no longer
//! current, so an older fetch resolving late can never overwrite the
//! state of a newer one.

use crate::api::TimeFilter;

/// The (category, subcategory, time filter) tuple driving every reload.
///
/// Invariant: `subcategory_id` is only meaningful within the selected
/// category, so changing the category always clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub time_filter: TimeFilter,
}

/// The scope a reload applies to: subcategory if one is active, else the
/// category, else everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Category(i64),
    Subcategory { category_id: i64, subcategory_id: i64 },
}

impl Selection {
    pub fn new(
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        time_filter: TimeFilter,
    ) -> Self {
        let mut selection = Selection {
            category_id: None,
            subcategory_id: None,
            time_filter,
        };
        selection.set_category(category_id);
        selection.set_subcategory(subcategory_id);
        selection
    }

    /// Select a category (or `None` for "all"). Clears the subcategory.
    ///
    /// Returns whether the selection actually changed.
    pub fn set_category(&mut self, category_id: Option<i64>) -> bool {
        if self.category_id == category_id {
            return false;
        }
        self.category_id = category_id;
        self.subcategory_id = None;
        true
    }

    /// Select a subcategory within the current category.
    ///
    /// Ignored (returns `false`) when no category is active, since a
    /// subcategory without its category is meaningless.
    pub fn set_subcategory(&mut self, subcategory_id: Option<i64>) -> bool {
        if self.category_id.is_none() && subcategory_id.is_some() {
            tracing::debug!(?subcategory_id, "Ignoring subcategory without active category");
            return false;
        }
        if self.subcategory_id == subcategory_id {
            return false;
        }
        self.subcategory_id = subcategory_id;
        true
    }

    pub fn set_time_filter(&mut self, time_filter: TimeFilter) -> bool {
        if self.time_filter == time_filter {
            return false;
        }
        self.time_filter = time_filter;
        true
    }

    pub fn scope(&self) -> Scope {
        match (self.category_id, self.subcategory_id) {
            (Some(category_id), Some(subcategory_id)) => Scope::Subcategory {
                category_id,
                subcategory_id,
            },
            (Some(category_id), None) => Scope::Category(category_id),
            (None, _) => Scope::All,
        }
    }
}

/// Monotonic generation counter for one logical view (board, detail,
/// map, posturas). `issue` invalidates every previously issued token.
#[derive(Debug, Default)]
pub struct RequestToken {
    latest: u64,
}

impl RequestToken {
    /// Issue a new generation, superseding all prior ones.
    pub fn issue(&mut self) -> u64 {
        self.latest = self.latest.wrapping_add(1);
        self.latest
    }

    /// Whether `generation` is still the latest issued.
    pub fn is_current(&self, generation: u64) -> bool {
        self.latest == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_change_clears_subcategory() {
        let mut selection = Selection::new(Some(1), Some(10), TimeFilter::H24);
        assert_eq!(selection.subcategory_id, Some(10));

        assert!(selection.set_category(Some(2)));
        assert_eq!(selection.category_id, Some(2));
        assert_eq!(selection.subcategory_id, None);
    }

    #[test]
    fn test_reselecting_same_category_is_a_noop() {
        let mut selection = Selection::new(Some(1), Some(10), TimeFilter::H24);
        assert!(!selection.set_category(Some(1)));
        // No-op must not clear the subcategory either
        assert_eq!(selection.subcategory_id, Some(10));
    }

    #[test]
    fn test_subcategory_requires_category() {
        let mut selection = Selection::default();
        assert!(!selection.set_subcategory(Some(5)));
        assert_eq!(selection.subcategory_id, None);

        // Constructor applies the same rule
        let constructed = Selection::new(None, Some(5), TimeFilter::H72);
        assert_eq!(constructed.subcategory_id, None);
    }

    #[test]
    fn test_scope_precedence() {
        assert_eq!(Selection::default().scope(), Scope::All);
        assert_eq!(
            Selection::new(Some(3), None, TimeFilter::H72).scope(),
            Scope::Category(3)
        );
        assert_eq!(
            Selection::new(Some(3), Some(7), TimeFilter::H72).scope(),
            Scope::Subcategory {
                category_id: 3,
                subcategory_id: 7
            }
        );
    }

    #[test]
    fn test_request_token_last_request_wins() {
        let mut token = RequestToken::default();
        let first = token.issue();
        let second = token.issue();

        // The older fetch resolves late: its result must be discarded.
        assert!(!token.is_current(first));
        assert!(token.is_current(second));
    }

    #[test]
    fn test_time_filter_change_detection() {
        let mut selection = Selection::default();
        assert!(!selection.set_time_filter(TimeFilter::H72)); // already the default
        assert!(selection.set_time_filter(TimeFilter::H24));
        assert_eq!(selection.time_filter, TimeFilter::H24);
    }
}
