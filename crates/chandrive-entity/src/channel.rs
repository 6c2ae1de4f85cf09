//! Channel and bot-token entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A backing chat-platform channel registered for a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    /// Numeric channel identifier.
    pub channel_id: i64,
    /// Display name.
    pub channel_name: String,
    /// Owning user.
    pub user_id: i64,
    /// Whether this is the user's default upload channel.
    pub selected: bool,
}

/// A bot credential bound to `(user_id, channel_id)`.
///
/// The token has the form `<bot_user_id>:<secret>`; the prefix before the
/// colon identifies the bot user for channel resolution.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BotToken {
    /// Owning user.
    pub user_id: i64,
    /// Channel the bot is joined to.
    pub channel_id: i64,
    /// Credential string.
    pub token: String,
}

impl BotToken {
    /// The bot user id portion of the token.
    pub fn bot_user(&self) -> &str {
        self.token.split(':').next().unwrap_or(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_user_prefix() {
        let bot = BotToken {
            user_id: 1,
            channel_id: 2,
            token: "12345:abcdef".into(),
        };
        assert_eq!(bot.bot_user(), "12345");
    }
}
