use std::{cell::RefCell, rc::Rc};

use gpui::{
    App, Context, CursorStyle, ElementId, Entity, EventEmitter, FocusHandle,
    InteractiveElement as _, IntoElement, KeyBinding, MouseButton, MouseDownEvent,
    MouseMoveEvent, MouseUpEvent, ParentElement as _, Pixels, Render, RenderOnce, SharedString,
    StyleRefinement, Styled, Window, actions, canvas, div, prelude::FluentBuilder as _, px,
};
use gpui_component::{ActiveTheme as _, StyledExt as _};
use gpui_component::list::ListItem;

use crate::config::ReorderConfig;
use crate::controller::{Classification, ListSnapshot, ReorderController};

const CONTEXT: &str = "ReorderList";

actions!(reorder_list, [CancelDrag]);

/// Register the list's key bindings. Call once at startup.
pub fn init(cx: &mut App) {
    cx.bind_keys([KeyBinding::new("escape", CancelDrag, Some(CONTEXT))]);
}

type RenderItem<T> =
    Rc<dyn Fn(usize, &ReorderListItem<T>, ReorderRowState, &mut Window, &mut App) -> ListItem>;

/// Create a [`ReorderList`].
pub fn reorder_list<T, R>(state: &Entity<ReorderListState<T>>, render_item: R) -> ReorderList<T>
where
    T: 'static,
    R: Fn(usize, &ReorderListItem<T>, ReorderRowState, &mut Window, &mut App) -> ListItem
        + 'static,
{
    ReorderList::new(state, render_item)
}

/// A single entry in a [`ReorderListState`].
#[derive(Clone)]
pub struct ReorderListItem<T> {
    pub id: SharedString,
    pub label: SharedString,
    pub data: T,
    disabled: bool,
}

impl<T> ReorderListItem<T> {
    pub fn new(id: impl Into<SharedString>, label: impl Into<SharedString>, data: T) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReorderRowState {
    pub classification: Classification,
    /// Whether any row of the list is being dragged.
    pub list_dragging: bool,
}

impl ReorderRowState {
    pub fn is_selected(&self) -> bool {
        self.classification == Classification::Selected
    }
}

/// Emitted when a drag ends in a different slot than it started.
///
/// The list does not reorder its own items; the subscriber persists the move
/// and hands the new order back through [`ReorderListState::set_items`].
#[derive(Clone, Debug)]
pub struct ReorderListCommit {
    pub item_id: SharedString,
    pub from: usize,
    pub to: usize,
}

/// Items plus the drag controller, without any window plumbing.
struct ReorderRows<T> {
    items: Vec<ReorderListItem<T>>,
    controller: ReorderController,
}

impl<T> ReorderRows<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            controller: ReorderController::default(),
        }
    }

    /// Disabled rows never start a drag.
    fn begin(&mut self, ix: usize, row_height: f32, pointer_y: f32) -> bool {
        if self.items.get(ix).is_none_or(|item| item.is_disabled()) {
            return false;
        }
        let snapshot = ListSnapshot::new(self.items.len(), row_height);
        self.controller.pointer_down(ix, snapshot, pointer_y)
    }

    /// The dragged item's id is read before the session closes, so the event
    /// names the row that was picked up.
    fn release(&mut self) -> Option<ReorderListCommit> {
        let item_id = self
            .controller
            .session()
            .and_then(|session| self.items.get(session.source_index))
            .map(|item| item.id.clone());

        let commit = self.controller.pointer_up()?;
        Some(ReorderListCommit {
            item_id: item_id?,
            from: commit.from,
            to: commit.to,
        })
    }

    fn replace(&mut self, items: Vec<ReorderListItem<T>>) {
        self.controller.teardown();
        self.items = items;
    }
}

/// State for a pointer-reorderable list.
pub struct ReorderListState<T> {
    focus_handle: FocusHandle,
    rows: ReorderRows<T>,
    row_heights: Rc<RefCell<Vec<Option<Pixels>>>>,
    drag_handle_width: Option<Pixels>,
    render_item: RenderItem<T>,
}

impl<T: 'static> EventEmitter<ReorderListCommit> for ReorderListState<T> {}

impl<T: 'static> ReorderListState<T> {
    pub fn new(cx: &mut App) -> Self {
        Self {
            focus_handle: cx.focus_handle(),
            rows: ReorderRows::new(),
            row_heights: Rc::new(RefCell::new(Vec::new())),
            drag_handle_width: Some(px(32.)),
            render_item: Rc::new(|_, _, _, _, _| ListItem::new("reorder-list-empty")),
        }
    }

    pub fn items(mut self, items: impl Into<Vec<ReorderListItem<T>>>) -> Self {
        self.rows.items = items.into();
        self
    }

    pub fn config(mut self, config: ReorderConfig) -> Self {
        self.rows.controller.set_config(config);
        self
    }

    /// Restrict drag start to a left-side handle area with the given width.
    pub fn drag_handle_width(mut self, width: Pixels) -> Self {
        self.drag_handle_width = Some(width);
        self
    }

    /// Allow dragging from anywhere on the row.
    pub fn drag_on_row(mut self) -> Self {
        self.drag_handle_width = None;
        self
    }

    /// Replace the items. Any running drag is abandoned without a commit.
    pub fn set_items(&mut self, items: impl Into<Vec<ReorderListItem<T>>>, cx: &mut Context<Self>) {
        self.rows.replace(items.into());
        self.row_heights.borrow_mut().clear();
        cx.notify();
    }

    pub fn items_ref(&self) -> &[ReorderListItem<T>] {
        &self.rows.items
    }

    pub fn is_dragging(&self) -> bool {
        self.rows.controller.is_dragging()
    }

    /// Slot the dragged row would land in if released now.
    pub fn prospective_index(&self) -> Option<usize> {
        self.rows.controller.prospective_index()
    }

    /// Abandon a running drag, e.g. when the hosting view goes away.
    pub fn cancel_drag(&mut self, cx: &mut Context<Self>) {
        if self.rows.controller.teardown() {
            cx.notify();
        }
    }

    fn row_height(&self, ix: usize) -> f32 {
        self.row_heights
            .borrow()
            .get(ix)
            .copied()
            .flatten()
            .map(f32::from)
            .unwrap_or(0.)
    }

    fn on_row_mouse_down(
        &mut self,
        ix: usize,
        event: &MouseDownEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let row_height = self.row_height(ix);
        if self.rows.begin(ix, row_height, f32::from(event.position.y)) {
            window.focus(&self.focus_handle);
            window.prevent_default();
            cx.notify();
        }
    }

    fn on_pointer_move(&mut self, y: f32, cx: &mut Context<Self>) {
        if self.rows.controller.pointer_move(y) {
            cx.notify();
        }
    }

    fn on_pointer_up(&mut self, cx: &mut Context<Self>) {
        let commit = self.rows.release();
        cx.notify();
        if let Some(commit) = commit {
            cx.emit(commit);
        }
    }
}

/// Window-level move/up listeners, painted only while a drag is running.
///
/// Listeners registered during paint live for a single frame, so they are gone
/// as soon as the list renders without an open session.
fn session_listeners<T: 'static>(state: Entity<ReorderListState<T>>) -> impl IntoElement {
    canvas(
        |_, _, _| {},
        move |_, _, window, _| {
            window.on_mouse_event({
                let state = state.clone();
                move |event: &MouseMoveEvent, phase, _window, cx| {
                    if !phase.bubble() {
                        return;
                    }
                    // The button was released outside the window.
                    if event.pressed_button != Some(MouseButton::Left) {
                        state.update(cx, |this, cx| this.on_pointer_up(cx));
                        return;
                    }
                    let y = f32::from(event.position.y);
                    state.update(cx, |this, cx| this.on_pointer_move(y, cx));
                }
            });

            window.on_mouse_event(move |event: &MouseUpEvent, phase, _window, cx| {
                if !phase.bubble() || event.button != MouseButton::Left {
                    return;
                }
                state.update(cx, |this, cx| this.on_pointer_up(cx));
            });
        },
    )
    .absolute()
    .top_0()
    .left_0()
    .size_full()
}

impl<T: 'static> Render for ReorderListState<T> {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let render_item = Rc::clone(&self.render_item);
        let state_entity = cx.entity();
        let row_bg = cx.theme().background;
        let drag_handle_width = self.drag_handle_width;
        let controller = &self.rows.controller;
        let list_dragging = controller.is_dragging();
        let item_height = controller
            .session()
            .map(|session| session.item_height)
            .unwrap_or(0.);

        self.row_heights
            .borrow_mut()
            .resize(self.rows.items.len(), None);

        let mut rows = Vec::with_capacity(self.rows.items.len());
        for (ix, item) in self.rows.items.iter().enumerate() {
            let hint = controller.row_hint(ix);
            let row_state = ReorderRowState {
                classification: hint.classification,
                list_dragging,
            };
            let selected = row_state.is_selected();
            let is_disabled = item.is_disabled();
            let list_item = (render_item)(ix, item, row_state, window, cx);
            let heights = Rc::clone(&self.row_heights);

            let row = div()
                .id(ix)
                .relative()
                .top(px(hint.translate_y(item_height)))
                .when(selected, |this| this.bg(row_bg).shadow_md())
                .child(list_item.disabled(is_disabled).selected(selected))
                .child(
                    canvas(
                        move |bounds, _, _| {
                            if let Some(slot) = heights.borrow_mut().get_mut(ix) {
                                *slot = Some(bounds.size.height);
                            }
                        },
                        |_, _, _, _| {},
                    )
                    .absolute()
                    .top_0()
                    .left_0()
                    .size_full(),
                )
                .when(!is_disabled, |this| match drag_handle_width {
                    Some(handle_width) => this.child(
                        div()
                            .id(("reorder-list-handle", ix))
                            .absolute()
                            .top_0()
                            .left_0()
                            .bottom_0()
                            .w(handle_width)
                            .cursor(CursorStyle::OpenHand)
                            .on_mouse_down(
                                MouseButton::Left,
                                cx.listener(move |this, event: &MouseDownEvent, window, cx| {
                                    this.on_row_mouse_down(ix, event, window, cx);
                                }),
                            ),
                    ),
                    None => this.cursor(CursorStyle::OpenHand).on_mouse_down(
                        MouseButton::Left,
                        cx.listener(move |this, event: &MouseDownEvent, window, cx| {
                            this.on_row_mouse_down(ix, event, window, cx);
                        }),
                    ),
                });

            rows.push(row);
        }

        div()
            .id("reorder-list-state")
            .relative()
            .w_full()
            .flex()
            .flex_col()
            .when(list_dragging, |this| this.cursor(CursorStyle::ClosedHand))
            .children(rows)
            .when(list_dragging, |this| {
                this.child(session_listeners(state_entity))
            })
    }
}

/// A list element whose rows can be reordered by dragging them vertically.
#[derive(IntoElement)]
pub struct ReorderList<T: 'static> {
    id: ElementId,
    state: Entity<ReorderListState<T>>,
    style: StyleRefinement,
    render_item: RenderItem<T>,
}

impl<T: 'static> ReorderList<T> {
    pub fn new<R>(state: &Entity<ReorderListState<T>>, render_item: R) -> Self
    where
        R: Fn(usize, &ReorderListItem<T>, ReorderRowState, &mut Window, &mut App) -> ListItem
            + 'static,
    {
        Self {
            id: ElementId::Name(format!("reorder-list-{}", state.entity_id()).into()),
            state: state.clone(),
            style: StyleRefinement::default(),
            render_item: Rc::new(render_item),
        }
    }
}

impl<T: 'static> Styled for ReorderList<T> {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl<T: 'static> RenderOnce for ReorderList<T> {
    fn render(self, window: &mut Window, cx: &mut App) -> impl IntoElement {
        let focus_handle = self.state.read(cx).focus_handle.clone();
        self.state
            .update(cx, |state, _| state.render_item = self.render_item);

        div()
            .id(self.id)
            .key_context(CONTEXT)
            .track_focus(&focus_handle)
            .on_action(window.listener_for(&self.state, |state, _: &CancelDrag, _, cx| {
                state.cancel_drag(cx);
            }))
            .w_full()
            .child(self.state)
            .refine_style(&self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 24.;

    fn rows(ids: &[&'static str]) -> ReorderRows<()> {
        let mut rows = ReorderRows::new();
        rows.items = ids
            .iter()
            .map(|id| ReorderListItem::new(*id, id.to_uppercase(), ()))
            .collect();
        rows
    }

    #[test]
    fn release_names_the_dragged_item() {
        let mut rows = rows(&["a", "b", "c"]);
        assert!(rows.begin(0, H, 0.));
        rows.controller.pointer_move(2. * H);

        let commit = rows.release().unwrap();
        assert_eq!(commit.item_id.as_ref(), "a");
        assert_eq!((commit.from, commit.to), (0, 2));
        assert!(!rows.controller.is_dragging());
    }

    #[test]
    fn release_in_place_emits_nothing() {
        let mut rows = rows(&["a", "b"]);
        rows.begin(1, H, 10.);
        rows.controller.pointer_move(10. - 0.3 * H);
        assert!(rows.release().is_none());
        assert!(!rows.controller.is_dragging());
    }

    #[test]
    fn replacing_items_mid_drag_abandons_the_session() {
        let mut rows = rows(&["a", "b", "c"]);
        rows.begin(2, H, 0.);
        rows.controller.pointer_move(-2. * H);

        rows.replace(vec![ReorderListItem::new("z", "Z", ())]);
        assert!(!rows.controller.is_dragging());
        assert!(rows.release().is_none());
        assert_eq!(rows.items.len(), 1);
    }

    #[test]
    fn disabled_rows_cannot_be_picked_up() {
        let mut rows = rows(&["a", "b"]);
        rows.items[1] = ReorderListItem::new("b", "B", ()).disabled(true);

        assert!(!rows.begin(1, H, 0.));
        assert!(!rows.begin(5, H, 0.));
        assert!(!rows.controller.is_dragging());

        // Enabled rows can still be dragged across a disabled one.
        assert!(rows.begin(0, H, 0.));
        rows.controller.pointer_move(H);
        assert_eq!(rows.release().map(|c| c.to), Some(1));
    }
}
