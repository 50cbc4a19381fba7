use common::{message_link, MessageReport, ReportCounts};
use database::Database;
use poise::serenity_prelude::{
    Channel, ChannelId, ChannelType, Color, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, GuildId,
};

mod modal;
pub mod spam;
pub use modal::execute_modal;

/// What happened to a freshly filed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// stored with this row id
    Recorded(i64),
    /// the reporter already reported this message, nothing was stored
    AlreadyReported,
}

/// Store a report. A duplicate is an expected outcome, not an error;
/// anything coming back as `Err` is the database falling over.
pub async fn record_report(
    db: &Database,
    report: &MessageReport,
) -> Result<ReportOutcome, database::Error> {
    match db.add_message_report(report).await {
        Ok(id) => Ok(ReportOutcome::Recorded(id)),
        Err(database::Error::AlreadyReported) => Ok(ReportOutcome::AlreadyReported),
        Err(e) => Err(e),
    }
}

pub fn thanks_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("Thanks!")
        .description("Report sent to moderators")
        .color(Color::from_rgb(0, 255, 0))
}

pub fn already_reported_embed() -> CreateEmbed {
    error_embed("You have already reported this message")
}

pub fn failure_embed() -> CreateEmbed {
    error_embed("Something went wrong, please try again later.")
}

pub fn error_embed(description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::default()
        .title("Error")
        .description(description)
        .color(Color::from_rgb(255, 0, 0))
}

/// Reply only the person who triggered the interaction can see.
pub fn ephemeral_embed(embed: CreateEmbed) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::default()
            .embed(embed)
            .ephemeral(true),
    )
}

/// Summaries only go to plain guild text channels.
pub fn is_summary_channel(channel: &Channel) -> bool {
    matches!(channel, Channel::Guild(c) if c.kind == ChannelType::Text)
}

/// Everything the moderators get to see about a report.
#[derive(Debug, Clone)]
pub struct ReportSummary<'a> {
    pub guild_id: GuildId,
    /// where the reported message lives
    pub channel_id: ChannelId,
    pub report: &'a MessageReport,
    pub counts: ReportCounts,
}

pub fn create_summary_embed(s: &ReportSummary<'_>) -> CreateEmbed {
    CreateEmbed::default()
        .field(
            "Reported message",
            format!(
                "{} (reported {} times)",
                message_link(s.guild_id, s.channel_id, &s.report.message_id),
                s.counts.message
            ),
            false,
        )
        .field(
            "Message author",
            format!(
                "<@{}> (reported {} times)",
                s.report.reportee_id, s.counts.reportee
            ),
            true,
        )
        .field(
            "Reported by",
            format!(
                "<@{}> (sent {} reports)",
                s.report.reporter_id, s.counts.reporter
            ),
            true,
        )
        .field("Reason", s.report.reason.clone(), false)
}
