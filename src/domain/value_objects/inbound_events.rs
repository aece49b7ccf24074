/// Transport-neutral shapes the conversation engine accepts. The webhook
/// layer translates raw Telegram updates into these before they reach any
/// usecase.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Command(CommandToken),
    Text(String),
    Callback(CallbackToken),
    Location { lat: f64, lon: f64 },
}

/// Who sent the event and where replies go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    pub telegram_user_id: i64,
    pub telegram_chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandToken {
    Start,
    Settings,
    Stop,
    Resume,
    Today,
    Tomorrow,
    Cancel,
    /// `/settimezone <iana>`; `None` when the argument is missing.
    SetTimezone(Option<String>),
}

impl CommandToken {
    /// Parses a leading-slash command line. Returns `None` for anything that
    /// is not a recognized command, so callers can fall through to free text.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let mut parts = trimmed.split_whitespace();
        let head = parts.next()?;

        match head {
            "/start" => Some(CommandToken::Start),
            "/settings" => Some(CommandToken::Settings),
            "/stop" => Some(CommandToken::Stop),
            "/resume" => Some(CommandToken::Resume),
            "/today" => Some(CommandToken::Today),
            "/tomorrow" => Some(CommandToken::Tomorrow),
            "/cancel" => Some(CommandToken::Cancel),
            "/settimezone" => Some(CommandToken::SetTimezone(
                parts.next().map(|arg| arg.to_string()),
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackToken {
    Join,
    ChangeMorning,
    ChangeEvening,
    Disable,
    Enable,
}

impl CallbackToken {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "JOIN" => Some(CallbackToken::Join),
            "SETTINGS_CHANGE_MORNING" => Some(CallbackToken::ChangeMorning),
            "SETTINGS_CHANGE_EVENING" => Some(CallbackToken::ChangeEvening),
            "SETTINGS_DISABLE" => Some(CallbackToken::Disable),
            "SETTINGS_ENABLE" => Some(CallbackToken::Enable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackToken::Join => "JOIN",
            CallbackToken::ChangeMorning => "SETTINGS_CHANGE_MORNING",
            CallbackToken::ChangeEvening => "SETTINGS_CHANGE_EVENING",
            CallbackToken::Disable => "SETTINGS_DISABLE",
            CallbackToken::Enable => "SETTINGS_ENABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(CommandToken::parse("/start"), Some(CommandToken::Start));
        assert_eq!(CommandToken::parse(" /stop "), Some(CommandToken::Stop));
        assert_eq!(
            CommandToken::parse("/settimezone Europe/Moscow"),
            Some(CommandToken::SetTimezone(Some("Europe/Moscow".to_string())))
        );
        assert_eq!(
            CommandToken::parse("/settimezone"),
            Some(CommandToken::SetTimezone(None))
        );
    }

    #[test]
    fn rejects_unknown_commands_and_plain_text() {
        assert_eq!(CommandToken::parse("/frobnicate"), None);
        assert_eq!(CommandToken::parse("08:30"), None);
        assert_eq!(CommandToken::parse(""), None);
    }

    #[test]
    fn callback_tokens_round_trip() {
        for token in [
            CallbackToken::Join,
            CallbackToken::ChangeMorning,
            CallbackToken::ChangeEvening,
            CallbackToken::Disable,
            CallbackToken::Enable,
        ] {
            assert_eq!(CallbackToken::parse(token.as_str()), Some(token));
        }
        assert_eq!(CallbackToken::parse("NOPE"), None);
    }
}
