mod spinner;
mod status;
mod table;

pub use spinner::with_spinner;

pub use status::{print_command_status, CommandStatus};

pub use table::report_table;
