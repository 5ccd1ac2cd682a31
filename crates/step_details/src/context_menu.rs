use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MenuPosition {
    pub x: f32,
    pub y: f32,
}

impl MenuPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// What a menu action gets to see when it is clicked.
#[derive(Clone, Copy, Debug)]
pub struct MenuActionContext<'a> {
    pub item_id: Option<&'a str>,
    pub position: MenuPosition,
}

pub type MenuAction = Rc<dyn Fn(&MenuActionContext<'_>)>;

#[derive(Clone)]
pub enum MenuEntry {
    Item {
        title: String,
        disabled: bool,
        action: MenuAction,
    },
    Separator,
}

impl MenuEntry {
    pub fn item(
        title: impl Into<String>,
        action: impl Fn(&MenuActionContext<'_>) + 'static,
    ) -> Self {
        Self::Item {
            title: title.into(),
            disabled: false,
            action: Rc::new(action),
        }
    }

    pub fn separator() -> Self {
        Self::Separator
    }

    pub fn disabled(mut self, value: bool) -> Self {
        if let Self::Item { disabled, .. } = &mut self {
            *disabled = value;
        }
        self
    }
}

/// Open flag shared by all context menus of one surface, so that only one of
/// them can be open at a time.
#[derive(Clone, Debug, Default)]
pub struct MenuOpenFlag(Rc<Cell<bool>>);

impl MenuOpenFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.0.get()
    }

    fn set(&self, open: bool) {
        self.0.set(open);
    }
}

/// Open/closed state of a context menu anchored at the pointer.
pub struct ContextMenu {
    entries: Vec<MenuEntry>,
    open_flag: MenuOpenFlag,
    item_id: Option<String>,
    anchor: Option<MenuPosition>,
}

impl ContextMenu {
    pub fn new(entries: impl Into<Vec<MenuEntry>>, open_flag: MenuOpenFlag) -> Self {
        Self {
            entries: entries.into(),
            open_flag,
            item_id: None,
            anchor: None,
        }
    }

    /// Identify the object the menu was opened for; passed on to actions.
    pub fn item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn anchor(&self) -> Option<MenuPosition> {
        self.anchor
    }

    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }

    /// Secondary click at `position`. Ignored while any menu sharing the open
    /// flag is open. Returns whether the state changed.
    pub fn handle_context_menu(&mut self, position: MenuPosition) -> bool {
        if self.open_flag.is_open() {
            return false;
        }

        let opening = self.anchor.is_none();
        self.anchor = opening.then_some(position);
        self.open_flag.set(opening);
        true
    }

    /// Run the entry at `ix` and close. Disabled entries and separators do nothing.
    pub fn handle_clicked(&mut self, ix: usize) -> bool {
        let Some(position) = self.anchor else {
            return false;
        };
        let Some(MenuEntry::Item {
            title,
            disabled: false,
            action,
        }) = self.entries.get(ix)
        else {
            return false;
        };

        tracing::debug!(%title, "context menu action");
        let action = Rc::clone(action);
        action(&MenuActionContext {
            item_id: self.item_id.as_deref(),
            position,
        });
        self.close();
        true
    }

    pub fn close(&mut self) {
        self.anchor = None;
        self.open_flag.set(false);
    }
}
