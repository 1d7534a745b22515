//! Slash-command parsing.
//!
//! Command names are matched case-insensitively and may carry an `@botname`
//! suffix as Telegram appends in groups, so `/weeklySummary@lunch_bot` and
//! `/weeklysummary` are the same command.

/// A recognized bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Menu,
    ShowMenu,
    Cancel,
    Reset,
    Summary,
    WeeklySummary,
    MonthlySummary,
    Pending,
    Random,
    SavePhoto(String),
    SaveGroupPhoto(String),
    Photo(String),
    Photos,
}

impl Command {
    /// Parse a message as a command; `None` for plain text and unknown commands
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;

        let (head, args) = match rest.find(char::is_whitespace) {
            Some(index) => (&rest[..index], rest[index..].trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "menu" => Command::Menu,
            "showmenu" => Command::ShowMenu,
            "cancel" => Command::Cancel,
            "reset" => Command::Reset,
            "summary" => Command::Summary,
            "weeklysummary" => Command::WeeklySummary,
            "monthlysummary" => Command::MonthlySummary,
            "pending" => Command::Pending,
            "random" => Command::Random,
            "savephoto" => Command::SavePhoto(args.to_string()),
            "savegroupphoto" => Command::SaveGroupPhoto(args.to_string()),
            "photo" => Command::Photo(args.to_string()),
            "photos" => Command::Photos,
            _ => return None,
        };

        Some(command)
    }
}
