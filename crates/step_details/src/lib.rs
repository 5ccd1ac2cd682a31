mod connections;
mod context_menu;
mod environment;
mod filename;
mod step;
mod validity;

pub use connections::{ConnectionDict, ConnectionEntry, ConnectionInfo, move_item};
pub use context_menu::{
    ContextMenu, MenuAction, MenuActionContext, MenuEntry, MenuOpenFlag, MenuPosition,
};
pub use environment::{
    Environment, EnvironmentChoice, EnvironmentOption, KERNEL_OPTIONS, KernelOption,
    environment_options, environments_endpoint, kernel_name_to_language,
};
pub use filename::{
    ALLOWED_STEP_EXTENSIONS, extension_from_filename, path_validator, to_valid_filename,
};
pub use step::{Kernel, KernelPatch, Step, StepPatch, StepProperties};
pub use validity::{
    ExistenceError, FileExistence, FileLookupKey, FileValidity, FsExistence, PendingLookup,
};
