use poise::{
    serenity_prelude::{CreateEmbed, CreateEmbedFooter, User},
    CreateReply,
};

const PREVIEW: u32 = 5;

/// How often has someone been reported, and how often do they report others?
#[poise::command(slash_command)]
pub async fn reports(
    ctx: crate::Context<'_>,
    #[description = "who?"] user: User,
) -> anyhow::Result<()> {
    let db = &ctx.data().db;
    let id = user.id.to_string();
    let (against, by, recent) = tokio::try_join!(
        db.count_reports_against(&id),
        db.count_reports_by(&id),
        db.recent_reports_against(&id, PREVIEW),
    )?;

    let description = if recent.is_empty() {
        "No reports against this user.".to_string()
    } else {
        recent.into_iter().fold(String::new(), |mut o, r| {
            o.push_str(&format!(
                "* <t:{}:R> by <@{}>: '{}' (message {})\n",
                r.created_at.timestamp(),
                r.report.reporter_id,
                r.report.reason,
                r.report.message_id
            ));
            o
        })
    };

    let embed = CreateEmbed::default()
        .title(format!("Reports against {}", user.name))
        .description(description)
        .field("Reported", format!("{} times", against), true)
        .field("Has reported", format!("{} messages", by), true)
        .footer(CreateEmbedFooter::new(format!(
            "Showing up to {} recent reports",
            PREVIEW
        )));

    ctx.send(CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
