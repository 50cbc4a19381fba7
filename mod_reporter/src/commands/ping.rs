use poise::CreateReply;
/// Is the bot alive?
#[poise::command(slash_command)]
pub async fn ping(ctx: crate::Context<'_>) -> anyhow::Result<()> {
    ctx.send(
        CreateReply::default()
            .content(format!("Pong! mod_reporter v{}", env!("CARGO_PKG_VERSION")))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
