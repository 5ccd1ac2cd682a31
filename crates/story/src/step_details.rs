use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::list::ListItem;
use gpui_component::{ActiveTheme as _, Icon, IconName, Sizable as _, h_flex, v_flex};
use gpui_dnd_reorder::{
    Classification, ReorderConfig, ReorderListCommit, ReorderListItem, ReorderListState,
    ReorderRowState, reorder_list,
};
use gpui_step_details::{
    ConnectionDict, ConnectionEntry, ConnectionInfo, ContextMenu, FileExistence as _,
    FileLookupKey, FileValidity, FsExistence, Kernel, MenuEntry, MenuOpenFlag, MenuPosition,
    PendingLookup, Step, StepPatch, StepProperties,
};

const PROJECT_UUID: &str = "demo-project";
const PIPELINE_UUID: &str = "demo-pipeline";
const PIPELINE_PATH: &str = "main.orchest";
const PROJECTS_ROOT_ENV: &str = "STEP_DETAILS_PROJECTS_ROOT";
const MAX_SAVED_PATCHES: usize = 8;

const DEMO_TITLES: &[&str] = &["Train Model", "Evaluate", "Export Report"];
const DEMO_FILES: &[&str] = &["train.ipynb", "evaluate.py", "report.R"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuCommand {
    RecheckFile,
    LogOrder,
}

pub struct StepDetailsExample {
    properties: StepProperties,
    connections: ConnectionDict,
    list: Entity<ReorderListState<ConnectionEntry>>,
    validity: FileValidity,
    checker: FsExistence,
    lookup_task: Option<Task<()>>,
    menu: ContextMenu,
    menu_command: Rc<Cell<Option<MenuCommand>>>,
    saved: Vec<String>,
    title_ix: usize,
    file_ix: usize,
    _subscriptions: Vec<Subscription>,
}

impl StepDetailsExample {
    pub fn view(_window: &mut Window, cx: &mut App) -> Entity<Self> {
        let properties = StepProperties::new(demo_step());
        let connections = demo_connections();
        let items = list_items(&properties, &connections);
        let list = cx.new(|cx| {
            ReorderListState::new(cx)
                .items(items)
                .config(ReorderConfig::default())
                .drag_on_row()
        });

        cx.new(|cx| {
            let subscriptions = vec![cx.subscribe(&list, Self::on_reorder_commit)];
            let menu_command = Rc::new(Cell::new(None));
            let menu = connection_menu(&menu_command, properties.step().uuid.clone());
            let projects_root = std::env::var_os(PROJECTS_ROOT_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));

            let mut this = Self {
                properties,
                connections,
                list,
                validity: FileValidity::new(),
                checker: FsExistence::new(projects_root).pipeline(
                    PROJECT_UUID,
                    PIPELINE_UUID,
                    PIPELINE_PATH,
                ),
                lookup_task: None,
                menu,
                menu_command,
                saved: Vec::new(),
                title_ix: 0,
                file_ix: 0,
                _subscriptions: subscriptions,
            };
            this.check_file(cx);
            this
        })
    }

    fn on_reorder_commit(
        &mut self,
        list: Entity<ReorderListState<ConnectionEntry>>,
        event: &ReorderListCommit,
        cx: &mut Context<Self>,
    ) {
        tracing::info!(
            item = %event.item_id,
            from = event.from,
            to = event.to,
            "connection moved"
        );
        let Some(patch) = self.properties.move_connection(event.from, event.to) else {
            return;
        };
        self.record(patch);

        let items = list_items(&self.properties, &self.connections);
        list.update(cx, |list, cx| list.set_items(items, cx));
        cx.notify();
    }

    fn record(&mut self, patch: StepPatch) {
        match serde_json::to_string(&patch) {
            Ok(json) => {
                self.saved.push(json);
                if self.saved.len() > MAX_SAVED_PATCHES {
                    self.saved.remove(0);
                }
            }
            Err(err) => tracing::warn!(%err, "failed to serialize step patch"),
        }
    }

    fn rename(&mut self, cx: &mut Context<Self>) {
        let title = DEMO_TITLES[self.title_ix % DEMO_TITLES.len()];
        self.title_ix += 1;
        let patch = self.properties.set_title(title);
        self.record(patch);
        self.check_file(cx);
        cx.notify();
    }

    fn pick_file(&mut self, cx: &mut Context<Self>) {
        let file = DEMO_FILES[self.file_ix % DEMO_FILES.len()];
        self.file_ix += 1;
        let patch = self.properties.set_file_name(file, false);
        self.record(patch);
        self.check_file(cx);
        cx.notify();
    }

    fn check_file(&mut self, cx: &mut Context<Self>) {
        let key = FileLookupKey::new(
            PROJECT_UUID,
            PIPELINE_UUID,
            self.properties.step().file_path.clone(),
        );
        let lookup = self.validity.request(key);
        self.spawn_lookup(lookup, cx);
    }

    /// Run `lookup` off the main thread. Replacing the task drops the previous
    /// one, and `FileValidity` discards anything that still comes back late.
    fn spawn_lookup(&mut self, lookup: Option<PendingLookup>, cx: &mut Context<Self>) {
        let Some(lookup) = lookup else {
            return;
        };
        let checker = self.checker.clone();

        self.lookup_task = Some(cx.spawn(async move |this, cx| {
            let key = lookup.key.clone();
            let outcome = cx
                .background_executor()
                .spawn(async move { checker.exists(&key) })
                .await;

            this.update(cx, |this, cx| {
                this.validity.resolve(lookup.generation, outcome);
                cx.notify();
            })
            .ok();
        }));
    }

    fn on_secondary_click(
        &mut self,
        event: &MouseDownEvent,
        _window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let position = MenuPosition::new(f32::from(event.position.x), f32::from(event.position.y));
        if self.menu.handle_context_menu(position) {
            cx.notify();
        }
    }

    fn on_menu_click(&mut self, ix: usize, cx: &mut Context<Self>) {
        if !self.menu.handle_clicked(ix) {
            return;
        }

        match self.menu_command.take() {
            Some(MenuCommand::RecheckFile) => {
                let lookup = self.validity.refresh();
                self.spawn_lookup(lookup, cx);
            }
            Some(MenuCommand::LogOrder) => tracing::info!(
                order = ?self.properties.step().incoming_connections,
                "current connection order"
            ),
            None => {}
        }
        cx.notify();
    }

    fn render_menu(&self, cx: &Context<Self>) -> Option<impl IntoElement> {
        let anchor = self.menu.anchor()?;
        let theme = cx.theme();
        let (border, popover, popover_foreground, muted, accent) = (
            theme.border,
            theme.popover,
            theme.popover_foreground,
            theme.muted_foreground,
            theme.accent,
        );

        let rows = self
            .menu
            .entries()
            .iter()
            .enumerate()
            .map(|(ix, entry)| match entry {
                MenuEntry::Separator => div().h(px(1.)).my_1().bg(border).into_any_element(),
                MenuEntry::Item {
                    title, disabled, ..
                } => div()
                    .id(ix)
                    .px_3()
                    .py_1()
                    .text_sm()
                    .child(title.clone())
                    .when(*disabled, |this| this.text_color(muted))
                    .when(!*disabled, |this| {
                        this.cursor_pointer()
                            .hover(|style| style.bg(accent))
                            .on_click(cx.listener(move |this, _, _, cx| {
                                this.on_menu_click(ix, cx);
                            }))
                    })
                    .into_any_element(),
            })
            .collect::<Vec<_>>();

        Some(deferred(
            anchored()
                .position(point(px(anchor.x), px(anchor.y)))
                .snap_to_window()
                .child(
                    v_flex()
                        .id("connection-menu")
                        .min_w(px(180.))
                        .py_1()
                        .rounded(px(8.))
                        .border_1()
                        .border_color(border)
                        .bg(popover)
                        .text_color(popover_foreground)
                        .shadow_md()
                        .children(rows)
                        .on_mouse_down_out(cx.listener(|this, _: &MouseDownEvent, _, cx| {
                            this.menu.close();
                            cx.notify();
                        })),
                ),
        ))
    }
}

impl Render for StepDetailsExample {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let (muted, border, background) =
            (theme.muted_foreground, theme.border, theme.background);

        let step = self.properties.step();
        let file_status = if self.validity.is_pending() {
            "checking"
        } else if self.validity.result() {
            "exists"
        } else {
            "not found"
        };
        let hint = match self.list.read(cx).prospective_index() {
            Some(ix) => format!("Release to move to position {}", ix + 1),
            None => "Drag a connection to reorder it. Right-click for more.".to_string(),
        };
        let saved = self
            .saved
            .iter()
            .rev()
            .map(|line| div().text_xs().child(line.clone()));
        let menu = self.render_menu(cx);

        v_flex()
            .size_full()
            .p(px(16.))
            .gap_y_3()
            .child(
                div()
                    .text_xl()
                    .font_weight(FontWeight::BOLD)
                    .child("Step Details"),
            )
            .child(field_row("Title", step.title.clone(), muted))
            .child(field_row(
                "File",
                format!("{} ({file_status})", step.file_path),
                muted,
            ))
            .child(field_row(
                "Kernel",
                step.kernel.display_name.clone(),
                muted,
            ))
            .child(
                h_flex()
                    .gap_x_2()
                    .child(
                        Button::new("rename")
                            .small()
                            .label("Rename")
                            .on_click(cx.listener(|this, _, _, cx| this.rename(cx))),
                    )
                    .child(
                        Button::new("pick-file")
                            .small()
                            .ghost()
                            .label("Pick file")
                            .on_click(cx.listener(|this, _, _, cx| this.pick_file(cx))),
                    ),
            )
            .child(
                v_flex()
                    .gap_y_1()
                    .child(
                        div()
                            .text_sm()
                            .font_weight(FontWeight::MEDIUM)
                            .child("Connections"),
                    )
                    .child(div().text_xs().text_color(muted).child(hint)),
            )
            .child(
                div()
                    .id("connections-panel")
                    .w(px(420.))
                    .rounded(px(12.))
                    .border_1()
                    .border_color(border)
                    .bg(background)
                    .p(px(4.))
                    .on_mouse_down(MouseButton::Right, cx.listener(Self::on_secondary_click))
                    .child(reorder_list(
                        &self.list,
                        |ix, item, row_state, _window, cx| {
                            render_connection_row(ix, item, row_state, cx)
                        },
                    )),
            )
            .child(
                v_flex()
                    .gap_y_0p5()
                    .child(
                        div()
                            .text_sm()
                            .font_weight(FontWeight::MEDIUM)
                            .child("Saved patches"),
                    )
                    .children(saved),
            )
            .children(menu)
    }
}

fn field_row(label: &'static str, value: String, muted: Hsla) -> impl IntoElement {
    h_flex()
        .gap_x_2()
        .child(div().w(px(80.)).text_sm().text_color(muted).child(label))
        .child(div().text_sm().child(value))
}

fn render_connection_row(
    ix: usize,
    item: &ReorderListItem<ConnectionEntry>,
    row_state: ReorderRowState,
    cx: &mut App,
) -> ListItem {
    let muted = cx.theme().muted_foreground;
    let shift = match row_state.classification {
        Classification::SwappedUp => "↑",
        Classification::SwappedDown => "↓",
        Classification::None | Classification::Selected => "",
    };

    ListItem::new(ix)
        .when(row_state.list_dragging && !row_state.is_selected(), |this| {
            this.opacity(0.8)
        })
        .child(
            h_flex()
                .gap_x_2()
                .items_center()
                .child(Icon::from(IconName::Menu).small().text_color(muted))
                .child(item.label.clone())
                .child(
                    div()
                        .text_xs()
                        .text_color(muted)
                        .child(format!("({})", item.data.file_path)),
                )
                .child(div().text_xs().text_color(muted).child(shift)),
        )
}

fn list_items(
    properties: &StepProperties,
    connections: &ConnectionDict,
) -> Vec<ReorderListItem<ConnectionEntry>> {
    properties
        .connections(connections)
        .into_iter()
        .map(|entry| ReorderListItem::new(entry.uuid.clone(), entry.title.clone(), entry))
        .collect()
}

fn connection_menu(command: &Rc<Cell<Option<MenuCommand>>>, step_uuid: String) -> ContextMenu {
    let recheck = Rc::clone(command);
    let log_order = Rc::clone(command);
    ContextMenu::new(
        vec![
            MenuEntry::item("Re-check file", move |_| {
                recheck.set(Some(MenuCommand::RecheckFile));
            }),
            MenuEntry::item("Log connection order", move |cx| {
                tracing::debug!(step = cx.item_id.unwrap_or_default(), "order requested");
                log_order.set(Some(MenuCommand::LogOrder));
            }),
            MenuEntry::separator(),
            MenuEntry::item("Remove connection", |_| {}).disabled(true),
        ],
        MenuOpenFlag::new(),
    )
    .item_id(step_uuid)
}

fn demo_step() -> Step {
    Step {
        uuid: "step-train".into(),
        title: String::new(),
        file_path: String::new(),
        kernel: Kernel {
            name: "python".into(),
            display_name: "Python 3".into(),
        },
        environment: "env-python".into(),
        parameters: Default::default(),
        incoming_connections: vec![
            "step-load".into(),
            "step-clean".into(),
            "step-features".into(),
            "step-split".into(),
        ],
    }
}

fn demo_connections() -> ConnectionDict {
    [
        ("step-load", "Load Data", "load.py"),
        ("step-clean", "Clean", "clean.ipynb"),
        ("step-features", "Feature Engineering", "features.py"),
        ("step-split", "Train/Test Split", "split.R"),
    ]
    .into_iter()
    .map(|(uuid, title, file_path)| {
        (
            uuid.to_string(),
            ConnectionInfo {
                title: title.to_string(),
                file_path: file_path.to_string(),
            },
        )
    })
    .collect()
}
