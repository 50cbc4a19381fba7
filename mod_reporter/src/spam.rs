use async_shutdown::ShutdownManager;
use common::is_gift_scam;
use poise::serenity_prelude::{CacheHttp, ChannelId, Context, GetMessages};
use tracing::{debug, error, info, instrument};

/// Discord won't hand out more than this many messages per request.
pub const MAX_SCAN: u8 = 100;

/// Delete every recent message in `channel` carrying a fake steam gift link.
/// Returns how many were deleted. Stops at the first failed delete.
#[instrument(skip(ctx))]
pub async fn sweep_channel(
    ctx: &impl CacheHttp,
    channel: ChannelId,
    limit: u8,
) -> anyhow::Result<usize> {
    let messages = channel
        .messages(ctx.http(), GetMessages::new().limit(limit.min(MAX_SCAN)))
        .await?;
    let mut deleted = 0;
    for m in messages.iter().filter(|m| is_gift_scam(&m.content)) {
        m.delete(ctx).await?;
        deleted += 1;
    }
    Ok(deleted)
}

/// Run [`sweep_channel`] in the background. The sweep is dropped if the bot
/// shuts down before it finishes.
pub fn spawn_sweep(
    ctx: Context,
    channel: ChannelId,
    limit: u8,
    shutdown: &ShutdownManager<&'static str>,
) {
    let sweep = shutdown.wrap_cancel(async move { sweep_channel(&ctx, channel, limit).await });
    tokio::spawn(async move {
        match sweep.await {
            Ok(Ok(0)) => debug!("No spam in {}", channel),
            Ok(Ok(n)) => info!("Removed {} gift scam messages from {}", n, channel),
            Ok(Err(e)) => error!("Spam sweep in {} failed: {:?}", channel, e),
            Err(reason) => debug!("Spam sweep in {} cancelled: {}", channel, reason),
        }
    });
}
