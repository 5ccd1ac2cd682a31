pub mod logging;
pub mod step_details;
