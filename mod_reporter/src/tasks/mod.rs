use std::time::Duration;

use async_shutdown::ShutdownManager;
use poise::serenity_prelude::Context;
use tokio::select;
use tracing::{error, info, instrument};

use crate::ModReporter;

mod console;
use console::console_task;

macro_rules! task {
    ($task:ident, $s:expr, $mr:expr, $ctx:expr) => {
        info!("starting '{}' task", stringify!($task));
        match $s.wrap_delay_shutdown({
            let ctx = $ctx.clone();
            let s = $s.clone();
            let mr = $mr.clone();
            async move {
                if let Err(e) = $task(ctx, mr, s).await {
                    error!("Failed to run '{}': {:?}", stringify!($task), e);
                }
            }
        }) {
            Ok(fut) => {
                tokio::spawn(fut);
            }
            Err(_) => error!("Not starting '{}', already shut down", stringify!($task)),
        }
    };
}

#[instrument(skip_all)]
pub async fn start_all_background_tasks(
    ctx: Context,
    s: ShutdownManager<&'static str>,
    mr: ModReporter,
) -> anyhow::Result<()> {
    info!("Starting background tasks");
    task!(optimize_db_task, s, mr, ctx);
    task!(console_task, s, mr, ctx);
    info!("Background tasks started");
    Ok(())
}

#[instrument(skip_all)]
async fn optimize_db_task(
    _: Context,
    mr: ModReporter,
    s: ShutdownManager<&'static str>,
) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        select! {
            _ = interval.tick() => {},
            _ = s.wait_shutdown_triggered() => {
                break;
            }
        }
        info!("Optimizing DB");
        if let Err(e) = mr.db.optimize().await {
            error!("Failed to optimize DB: {}!", e)
        } else {
            info!("DB optimized");
        }
    }
    Ok(())
}
