use dialoguer::console::style;

pub enum CommandStatus {
    Success,
    Warning,
    Error,
}

/// One-line run outcome on stderr, leaving stdout to the report itself.
pub fn print_command_status(status: CommandStatus, message: &str) {
    let indicator = match status {
        CommandStatus::Success => style("✓").green(),
        CommandStatus::Warning => style("!").yellow(),
        CommandStatus::Error => style("✗").red(),
    };
    eprintln!("{indicator} {message}");
}
