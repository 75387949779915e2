use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show the model this session talks to
    Model,
    /// Exit the application
    Bye,
    /// Show help
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Model => "show the model in use",
            SlashCommand::Bye => "exit the application",
            SlashCommand::Help => "show available commands",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input.
///
/// Unknown commands return `None` so the text is sent as an ordinary message.
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();

    let command = SlashCommand::from_str(&head)
        .ok()
        .or_else(|| match head.as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let rest: Vec<&str> = parts.collect();
    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }
    help.push_str("Aliases: /q, /quit and /exit for /bye, /h for /help");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(
            parse_slash_command("/help").map(|c| c.command),
            Some(SlashCommand::Help)
        );
        assert_eq!(
            parse_slash_command("  /QUIT ").map(|c| c.command),
            Some(SlashCommand::Bye)
        );
        assert_eq!(
            parse_slash_command("/model now please"),
            Some(ParsedCommand {
                command: SlashCommand::Model,
                argument: Some("now please".into()),
            })
        );
    }

    #[test]
    fn ordinary_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello /help"), None);
        assert_eq!(parse_slash_command("/unknown thing"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for command in SlashCommand::iter() {
            assert!(help.contains(&format!("/{}", command.command())));
        }
    }
}
