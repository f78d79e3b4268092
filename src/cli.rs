/// Alumni portal API server.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Default, PartialEq, Eq)]
pub(crate) enum Command {
    /// Runs the HTTP server (default)
    #[default]
    Serve,
    /// Applies pending migrations and exits
    Migrate,
    /// Notifies members registered for tomorrow's events
    #[command(name = "events:send-reminders")]
    SendReminders,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn serve_is_the_default() {
        let args = Args::parse_from(["alumni"]);
        assert_eq!(args.command.unwrap_or_default(), Command::Serve);
    }

    #[test]
    fn reminder_command_uses_namespaced_name() {
        let args = Args::parse_from(["alumni", "events:send-reminders"]);
        assert_eq!(args.command, Some(Command::SendReminders));
        assert!(Args::try_parse_from(["alumni", "send-reminders"]).is_err());
    }
}
