use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest reason a reporter may give, in characters.
pub const REASON_MAX_LENGTH: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Report reason is {0} characters long, the limit is {max}", max = REASON_MAX_LENGTH)]
    ReasonTooLong(usize),
}

/// A report filed against a single message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MessageReport {
    /// the reported message
    pub message_id: String,
    /// who filed the report
    pub reporter_id: String,
    /// who wrote the reported message
    pub reportee_id: String,
    /// why?
    pub reason: String,
}

impl MessageReport {
    pub fn new(
        message_id: impl Into<String>,
        reporter_id: impl Into<String>,
        reportee_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<Self, Error> {
        let reason = reason.into();
        let len = reason.chars().count();
        if len > REASON_MAX_LENGTH {
            return Err(Error::ReasonTooLong(len));
        }
        Ok(Self {
            message_id: message_id.into(),
            reporter_id: reporter_id.into(),
            reportee_id: reportee_id.into(),
            reason,
        })
    }
}

/// How often things have been reported, as shown to the moderators.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCounts {
    /// reports on this message
    pub message: u64,
    /// reports against the message author
    pub reportee: u64,
    /// reports sent by the reporter
    pub reporter: u64,
}

/// Jump link to a message in a guild channel.
pub fn message_link(
    guild_id: impl std::fmt::Display,
    channel_id: impl std::fmt::Display,
    message_id: impl std::fmt::Display,
) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id, channel_id, message_id
    )
}

static GIFT_SCAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"steamcommunity\.com/gift/[a-zA-Z0-9]+").expect("gift scam pattern is valid")
});

/// Does this message look like the fake steam gift scam?
pub fn is_gift_scam(content: &str) -> bool {
    GIFT_SCAM.is_match(content)
}

#[cfg(test)]
mod tests {
    use crate::{is_gift_scam, message_link, Error, MessageReport, REASON_MAX_LENGTH};

    #[test]
    fn test_message_link() {
        assert_eq!(
            message_link(1u64, 2u64, 3u64),
            "https://discord.com/channels/1/2/3"
        );
        assert_eq!(
            message_link("111", "222", "333"),
            "https://discord.com/channels/111/222/333"
        );
    }

    #[test]
    fn test_gift_scam() {
        assert!(is_gift_scam("free nitro https://steamcommunity.com/gift/abc123 hurry"));
        assert!(is_gift_scam("steamcommunity.com/gift/X"));
        assert!(!is_gift_scam("https://steamcommunity.com/gift/"));
        assert!(!is_gift_scam("https://steamcommunity.com/id/someone"));
        assert!(!is_gift_scam("steamcommunityXcom/gift/abc"));
        assert!(!is_gift_scam(""));
    }

    #[test]
    fn test_reason_bounds() {
        let at_limit = "a".repeat(REASON_MAX_LENGTH);
        let r = MessageReport::new("m", "a", "b", at_limit.clone()).unwrap();
        assert_eq!(r.reason, at_limit);
        assert_eq!(
            MessageReport::new("m", "a", "b", "a".repeat(REASON_MAX_LENGTH + 1)),
            Err(Error::ReasonTooLong(REASON_MAX_LENGTH + 1))
        );
        // whatever the modal accepted is stored as is
        assert_eq!(
            MessageReport::new("m", "a", "b", "   ").unwrap().reason,
            "   "
        );
        // characters, not bytes
        assert!(MessageReport::new("m", "a", "b", "é".repeat(REASON_MAX_LENGTH)).is_ok());
    }
}
