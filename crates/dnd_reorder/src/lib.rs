mod config;
mod controller;
mod list;

pub use config::{ConfigError, ReorderConfig};
pub use controller::{
    Classification, ListSnapshot, ReorderCommit, ReorderController, ReorderSession, RowHint,
    clamp_offset, classify, prospective_index,
};
pub use list::{
    CancelDrag, ReorderList, ReorderListCommit, ReorderListItem, ReorderListState, ReorderRowState,
    init, reorder_list,
};
