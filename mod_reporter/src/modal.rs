use std::sync::atomic::Ordering;
use std::time::Duration;

use poise::{serenity_prelude as serenity, Modal};
use tracing::debug;

/// Show a modal as the response to an application command and wait for the
/// invoking user to submit it.
///
/// Returns `None` if nothing was submitted before `timeout` ran out. The
/// submission is handed back without being acknowledged, so the caller must
/// respond to it (Discord shows an error to the user otherwise).
///
/// Note: a modal must be the first response to a command. You cannot send any messages before,
/// or the modal will fail.
pub async fn execute_modal<U: Send + Sync, E, M: Modal>(
    ctx: poise::ApplicationContext<'_, U, E>,
    defaults: Option<M>,
    timeout: Duration,
) -> Result<Option<(M, serenity::ModalInteraction)>, serenity::Error> {
    let interaction = ctx.interaction;
    let modal_custom_id = interaction.id.to_string();

    interaction
        .create_response(
            ctx.serenity_context(),
            M::create(defaults, modal_custom_id.clone()),
        )
        .await?;
    ctx.has_sent_initial_response.store(true, Ordering::SeqCst);

    let response = serenity::ModalInteractionCollector::new(ctx.serenity_context())
        .author_id(interaction.user.id)
        .filter(move |d| d.data.custom_id == modal_custom_id)
        .timeout(timeout)
        .await;
    let response = match response {
        Some(x) => x,
        None => {
            debug!("No modal submission from {} within {:?}", interaction.user.id, timeout);
            return Ok(None);
        }
    };

    let modal = M::parse(response.data.clone()).map_err(serenity::Error::Other)?;
    Ok(Some((modal, response)))
}
