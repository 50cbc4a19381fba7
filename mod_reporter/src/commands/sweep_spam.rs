use poise::{serenity_prelude::GuildChannel, CreateReply};

/// Delete fake steam gift links from the recent history of a channel
#[poise::command(slash_command)]
pub async fn sweep_spam(
    ctx: crate::Context<'_>,
    #[description = "Channel to clean up, defaults to this one"]
    #[channel_types("Text")]
    channel: Option<GuildChannel>,
) -> anyhow::Result<()> {
    ctx.defer_ephemeral().await?;
    let channel = channel.map(|c| c.id).unwrap_or_else(|| ctx.channel_id());
    let limit = ctx.data().config.spam.scan_limit();
    let removed =
        mod_reporter::spam::sweep_channel(ctx.serenity_context(), channel, limit).await?;
    ctx.send(
        CreateReply::default()
            .content(format!("Removed {} spam messages from <#{}>", removed, channel))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
