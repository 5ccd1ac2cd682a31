//! Headless pointer-driven reordering for a vertical list.
//!
//! The controller owns at most one [`ReorderSession`] at a time. All render
//! state (row classification, the dragged row's offset) is derived from the
//! session on demand, so hosts never mutate row visuals imperatively.

use crate::config::ReorderConfig;

/// How a row should be drawn while a drag is in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Classification {
    #[default]
    None,
    /// The row being dragged.
    Selected,
    /// Shifted up by one slot to fill the gap left behind the dragged row.
    SwappedUp,
    /// Shifted down by one slot to make room above the dragged row.
    SwappedDown,
}

/// Geometry of the list, sampled once when a drag starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ListSnapshot {
    pub item_count: usize,
    pub entry_height: f32,
}

impl ListSnapshot {
    pub fn new(item_count: usize, entry_height: f32) -> Self {
        Self {
            item_count,
            entry_height,
        }
    }
}

/// A single drag gesture, from pointer-down to pointer-up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReorderSession {
    pub source_index: usize,
    pub item_height: f32,
    pub cumulative_offset: f32,
    pub list_length: usize,
    pub last_pointer_y: f32,
}

impl ReorderSession {
    pub fn prospective_index(&self, snap_threshold: f32) -> usize {
        prospective_index(
            self.source_index,
            self.cumulative_offset,
            self.item_height,
            self.list_length,
            snap_threshold,
        )
    }
}

/// The index move produced by a finished drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReorderCommit {
    pub from: usize,
    pub to: usize,
}

/// Per-row render hint. `offset` is non-zero only for the selected row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RowHint {
    pub classification: Classification,
    pub offset: f32,
}

impl RowHint {
    /// Vertical translation to apply to the row, given the session's item height.
    pub fn translate_y(&self, item_height: f32) -> f32 {
        match self.classification {
            Classification::None => 0.,
            Classification::Selected => self.offset,
            Classification::SwappedUp => -item_height,
            Classification::SwappedDown => item_height,
        }
    }
}

/// Clamp a drag offset so the dragged row stays between the first and last slot.
pub fn clamp_offset(offset: f32, source_index: usize, item_count: usize, item_height: f32) -> f32 {
    if offset.is_nan() || !(item_height > 0.) || !item_height.is_finite() {
        return 0.;
    }
    let min = -item_height * source_index as f32;
    let max = item_height * item_count.saturating_sub(source_index + 1) as f32;
    offset.clamp(min, max)
}

/// The slot the dragged row would land in if released now.
///
/// Positions past `snap_threshold` of a slot snap to the next slot; the result
/// always saturates into `0..item_count`.
pub fn prospective_index(
    source_index: usize,
    offset: f32,
    item_height: f32,
    item_count: usize,
    snap_threshold: f32,
) -> usize {
    let Some(last) = item_count.checked_sub(1) else {
        return 0;
    };
    if !(item_height > 0.) {
        return source_index.min(last);
    }

    let position = source_index as f32 + offset / item_height;
    if position.is_nan() {
        return source_index.min(last);
    }

    let mut slot = position.floor();
    if position - slot >= snap_threshold {
        slot += 1.;
    }

    if slot <= 0. {
        0
    } else if slot >= last as f32 {
        last
    } else {
        slot as usize
    }
}

/// Classification of the row at `ordinal`, derived only from the drag indices.
pub fn classify(source_index: usize, prospective_index: usize, ordinal: usize) -> Classification {
    if ordinal == source_index {
        Classification::Selected
    } else if prospective_index >= ordinal && ordinal > source_index {
        Classification::SwappedUp
    } else if prospective_index <= ordinal && ordinal < source_index {
        Classification::SwappedDown
    } else {
        Classification::None
    }
}

type CommitSink = Box<dyn FnMut(usize, usize)>;

fn checked(config: ReorderConfig) -> ReorderConfig {
    config.validate().unwrap_or_else(|_| ReorderConfig::default())
}

/// Drives a [`ReorderSession`] from pointer events.
///
/// The controller never moves items itself; a finished drag is reported to the
/// commit sink (and returned from [`ReorderController::pointer_up`]) as a pair
/// of indices valid for the list observed at drag start.
pub struct ReorderController {
    config: ReorderConfig,
    session: Option<ReorderSession>,
    on_commit: Option<CommitSink>,
}

impl Default for ReorderController {
    fn default() -> Self {
        Self::new(ReorderConfig::default())
    }
}

impl ReorderController {
    /// A config with an out-of-range snap threshold is replaced by the default.
    pub fn new(config: ReorderConfig) -> Self {
        Self {
            config: checked(config),
            session: None,
            on_commit: None,
        }
    }

    /// Provide the sink invoked once per drag that changes the order.
    pub fn on_commit(mut self, on_commit: impl FnMut(usize, usize) + 'static) -> Self {
        self.on_commit = Some(Box::new(on_commit));
        self
    }

    pub fn set_on_commit(&mut self, on_commit: impl FnMut(usize, usize) + 'static) {
        self.on_commit = Some(Box::new(on_commit));
    }

    pub fn config(&self) -> ReorderConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ReorderConfig) {
        self.config = checked(config);
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ReorderSession> {
        self.session.as_ref()
    }

    pub fn prospective_index(&self) -> Option<usize> {
        self.session
            .as_ref()
            .map(|session| session.prospective_index(self.config.snap_threshold))
    }

    /// Start dragging the row at `ordinal`.
    ///
    /// Returns `false` (and stays idle) when a drag is already running, the
    /// list is empty, the ordinal is out of range or the row has no height.
    pub fn pointer_down(&mut self, ordinal: usize, snapshot: ListSnapshot, pointer_y: f32) -> bool {
        if self.session.is_some() {
            return false;
        }
        if snapshot.item_count == 0
            || ordinal >= snapshot.item_count
            || !(snapshot.entry_height > 0.)
            || !snapshot.entry_height.is_finite()
            || !pointer_y.is_finite()
        {
            tracing::debug!(
                ordinal,
                item_count = snapshot.item_count,
                entry_height = snapshot.entry_height,
                "ignoring pointer-down"
            );
            return false;
        }

        self.session = Some(ReorderSession {
            source_index: ordinal,
            item_height: snapshot.entry_height,
            cumulative_offset: 0.,
            list_length: snapshot.item_count,
            last_pointer_y: pointer_y,
        });
        tracing::debug!(
            source_index = ordinal,
            list_length = snapshot.item_count,
            "reorder session opened"
        );
        true
    }

    /// Track the pointer. Returns `true` if the drag state changed.
    pub fn pointer_move(&mut self, pointer_y: f32) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !pointer_y.is_finite() {
            return false;
        }

        let delta = pointer_y - session.last_pointer_y;
        session.last_pointer_y = pointer_y;
        session.cumulative_offset = clamp_offset(
            session.cumulative_offset + delta,
            session.source_index,
            session.list_length,
            session.item_height,
        );

        tracing::trace!(
            offset = session.cumulative_offset,
            prospective_index = session.prospective_index(self.config.snap_threshold),
            "reorder pointer moved"
        );
        delta != 0.
    }

    /// Finish the drag, committing the move if the row changed slots.
    pub fn pointer_up(&mut self) -> Option<ReorderCommit> {
        let session = self.session.take()?;
        let to = session.prospective_index(self.config.snap_threshold);
        let from = session.source_index;

        if from == to {
            tracing::debug!(source_index = from, "reorder released in place");
            return None;
        }

        tracing::debug!(from, to, "reorder committed");
        if let Some(on_commit) = self.on_commit.as_mut() {
            on_commit(from, to);
        }
        Some(ReorderCommit { from, to })
    }

    /// Abandon any running drag without committing.
    pub fn teardown(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        tracing::debug!(
            source_index = session.source_index,
            "reorder session torn down"
        );
        true
    }

    pub fn classification(&self, ordinal: usize) -> Classification {
        self.row_hint(ordinal).classification
    }

    pub fn row_hint(&self, ordinal: usize) -> RowHint {
        let Some(session) = self.session.as_ref() else {
            return RowHint::default();
        };
        if ordinal >= session.list_length {
            return RowHint::default();
        }

        let prospective = session.prospective_index(self.config.snap_threshold);
        let classification = classify(session.source_index, prospective, ordinal);
        let offset = if classification == Classification::Selected {
            session.cumulative_offset
        } else {
            0.
        };
        RowHint {
            classification,
            offset,
        }
    }
}

impl Drop for ReorderController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const H: f32 = 20.;

    fn recording() -> (ReorderController, Rc<RefCell<Vec<(usize, usize)>>>) {
        let commits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&commits);
        let controller = ReorderController::default()
            .on_commit(move |from, to| sink.borrow_mut().push((from, to)));
        (controller, commits)
    }

    #[test]
    fn classify_shifts_rows_between_source_and_target() {
        assert_eq!(classify(1, 3, 0), Classification::None);
        assert_eq!(classify(1, 3, 1), Classification::Selected);
        assert_eq!(classify(1, 3, 2), Classification::SwappedUp);
        assert_eq!(classify(1, 3, 3), Classification::SwappedUp);

        assert_eq!(classify(3, 1, 0), Classification::None);
        assert_eq!(classify(3, 1, 1), Classification::SwappedDown);
        assert_eq!(classify(3, 1, 2), Classification::SwappedDown);
        assert_eq!(classify(3, 1, 3), Classification::Selected);
    }

    #[test]
    fn classify_in_place_leaves_siblings_alone() {
        for ordinal in [0, 1, 3] {
            assert_eq!(classify(2, 2, ordinal), Classification::None);
        }
    }

    #[test]
    fn prospective_index_rounds_half_up() {
        assert_eq!(prospective_index(1, 0.49 * H, H, 4, 0.5), 1);
        assert_eq!(prospective_index(1, 0.5 * H, H, 4, 0.5), 2);
        assert_eq!(prospective_index(2, -0.4 * H, H, 4, 0.5), 2);
        assert_eq!(prospective_index(2, -0.6 * H, H, 4, 0.5), 1);
    }

    #[test]
    fn prospective_index_honors_custom_threshold() {
        assert_eq!(prospective_index(0, 0.3 * H, H, 4, 0.25), 1);
        assert_eq!(prospective_index(0, 0.3 * H, H, 4, 0.75), 0);
    }

    #[test]
    fn prospective_index_saturates() {
        assert_eq!(prospective_index(0, -1e9, H, 4, 0.5), 0);
        assert_eq!(prospective_index(3, 1e9, H, 4, 0.5), 3);
        assert_eq!(prospective_index(1, f32::INFINITY, H, 4, 0.5), 3);
        assert_eq!(prospective_index(1, f32::NEG_INFINITY, H, 4, 0.5), 0);
        assert_eq!(prospective_index(1, f32::NAN, H, 4, 0.5), 1);
        assert_eq!(prospective_index(1, 10., 0., 4, 0.5), 1);
        assert_eq!(prospective_index(0, 10., H, 0, 0.5), 0);
    }

    #[test]
    fn clamp_offset_keeps_row_inside_list() {
        assert_eq!(clamp_offset(-100., 1, 4, H), -H);
        assert_eq!(clamp_offset(100., 1, 4, H), 2. * H);
        assert_eq!(clamp_offset(5., 1, 4, H), 5.);
        assert_eq!(clamp_offset(5., 0, 1, H), 0.);
    }

    #[test]
    fn pointer_down_rejects_degenerate_lists() {
        let mut controller = ReorderController::default();
        assert!(!controller.pointer_down(0, ListSnapshot::new(0, H), 0.));
        assert!(!controller.pointer_down(0, ListSnapshot::new(3, 0.), 0.));
        assert!(!controller.pointer_down(0, ListSnapshot::new(3, -4.), 0.));
        assert!(!controller.pointer_down(3, ListSnapshot::new(3, H), 0.));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn second_pointer_down_is_ignored() {
        let mut controller = ReorderController::default();
        assert!(controller.pointer_down(1, ListSnapshot::new(4, H), 10.));
        assert!(!controller.pointer_down(2, ListSnapshot::new(4, H), 50.));
        assert_eq!(controller.session().unwrap().source_index, 1);
        assert_eq!(controller.session().unwrap().last_pointer_y, 10.);
    }

    #[test]
    fn moves_accumulate_deltas_and_clamp() {
        let mut controller = ReorderController::default();
        controller.pointer_down(1, ListSnapshot::new(4, H), 100.);

        controller.pointer_move(110.);
        assert_eq!(controller.session().unwrap().cumulative_offset, 10.);

        controller.pointer_move(-500.);
        assert_eq!(controller.session().unwrap().cumulative_offset, -H);

        // Moving back down after hitting the top edge starts from the clamp.
        controller.pointer_move(-490.);
        assert_eq!(controller.session().unwrap().cumulative_offset, -H + 10.);
        assert_eq!(controller.prospective_index(), Some(1));
    }

    #[test]
    fn non_finite_moves_are_dropped() {
        let mut controller = ReorderController::default();
        controller.pointer_down(0, ListSnapshot::new(3, H), 0.);
        assert!(!controller.pointer_move(f32::NAN));
        assert!(!controller.pointer_move(f32::INFINITY));
        assert_eq!(controller.session().unwrap().cumulative_offset, 0.);
    }

    #[test]
    fn selected_row_carries_the_offset() {
        let mut controller = ReorderController::default();
        controller.pointer_down(2, ListSnapshot::new(4, H), 0.);
        controller.pointer_move(-25.);

        let hint = controller.row_hint(2);
        assert_eq!(hint.classification, Classification::Selected);
        assert_eq!(hint.offset, -25.);
        assert_eq!(hint.translate_y(H), -25.);

        let sibling = controller.row_hint(1);
        assert_eq!(sibling.classification, Classification::SwappedDown);
        assert_eq!(sibling.offset, 0.);
        assert_eq!(sibling.translate_y(H), H);
    }

    #[test]
    fn release_without_movement_does_not_commit() {
        let (mut controller, commits) = recording();
        controller.pointer_down(2, ListSnapshot::new(4, H), 30.);
        controller.pointer_move(30.);
        assert_eq!(controller.pointer_up(), None);
        assert!(commits.borrow().is_empty());
        assert!(!controller.is_dragging());
    }

    #[test]
    fn whole_item_shift_commits_once() {
        let (mut controller, commits) = recording();
        controller.pointer_down(3, ListSnapshot::new(5, H), 0.);
        controller.pointer_move(-2. * H);
        assert_eq!(
            controller.pointer_up(),
            Some(ReorderCommit { from: 3, to: 1 })
        );
        assert_eq!(controller.pointer_up(), None);
        assert_eq!(*commits.borrow(), vec![(3, 1)]);
    }

    #[test]
    fn invalid_threshold_falls_back_to_default() {
        for bad in [0., -0.5, 1., 1.5, f32::NAN, f32::INFINITY] {
            let config = ReorderConfig::default().snap_threshold(bad);
            let mut controller = ReorderController::new(config);
            assert_eq!(controller.config(), ReorderConfig::default());

            controller.set_config(ReorderConfig::default().snap_threshold(0.25));
            assert_eq!(controller.config().snap_threshold, 0.25);
            controller.set_config(config);
            assert_eq!(controller.config(), ReorderConfig::default());
        }
    }

    #[test]
    fn dropping_mid_drag_never_commits() {
        let commits = Rc::new(RefCell::new(Vec::new()));
        {
            let sink = Rc::clone(&commits);
            let mut controller = ReorderController::default()
                .on_commit(move |from, to| sink.borrow_mut().push((from, to)));
            controller.pointer_down(0, ListSnapshot::new(3, H), 0.);
            controller.pointer_move(2. * H);
        }
        assert!(commits.borrow().is_empty());
    }
}
