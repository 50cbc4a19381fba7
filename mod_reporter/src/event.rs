use std::sync::atomic::Ordering;

use crate::{tasks, ModReporter};
use poise::serenity_prelude::{ActivityData, Context, FullEvent};
use poise::FrameworkContext;
use tracing::{info, instrument};

#[instrument(skip_all)]
pub async fn handle(
    ctx: &Context,
    evt: &FullEvent,
    framework: FrameworkContext<'_, ModReporter, anyhow::Error>,
) -> anyhow::Result<()> {
    if let FullEvent::Ready { data_about_bot } = evt {
        info!(
            "{} v{} is watching for reports",
            data_about_bot.user.name,
            env!("CARGO_PKG_VERSION")
        );
        ctx.set_activity(Some(ActivityData::watching("for reported messages")));
        let mr = framework.user_data;
        if !mr.tasks_started.swap(true, Ordering::SeqCst) {
            tasks::start_all_background_tasks(ctx.clone(), mr.shutdown.clone(), mr.clone())
                .await?;
        }
    }
    Ok(())
}
