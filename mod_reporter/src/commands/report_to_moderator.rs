use common::MessageReport;
use mod_reporter::{
    already_reported_embed, create_summary_embed, ephemeral_embed, execute_modal,
    failure_embed, is_summary_channel, record_report, spam, thanks_embed, ReportOutcome,
    ReportSummary,
};
use poise::{
    serenity_prelude::{CreateMessage, Message},
    FrameworkError, Modal,
};
use tracing::{debug, error, info};

/// Report a message to the moderators
#[poise::command(context_menu_command = "Report to moderator", on_error = "log_error")]
pub async fn report_to_moderator(
    ctx: crate::ApplicationContext<'_>,
    message: Message,
) -> anyhow::Result<()> {
    let sctx = ctx.serenity_context();
    let interaction = ctx.interaction;
    let Some(guild_id) = interaction.guild_id else {
        debug!("Report outside of a guild, ignoring");
        return Ok(());
    };

    // the resolved message can be stale, make sure it still exists
    let message = match interaction.channel_id.message(sctx, message.id).await {
        Ok(m) => m,
        Err(e) => {
            debug!("Could not fetch reported message {}: {}", message.id, e);
            return Ok(());
        }
    };
    let author = match guild_id.member(sctx, message.author.id).await {
        Ok(m) => m,
        Err(e) => {
            debug!("Author of {} is not a member: {}", message.id, e);
            return Ok(());
        }
    };

    let mr = ctx.data();
    let resp: Option<(ReasonModal, _)> =
        execute_modal(ctx, None, mr.config.report.modal_timeout()).await?;
    let Some((modal, submitted)) = resp else {
        return Ok(());
    };

    let recorded = async {
        let report = MessageReport::new(
            message.id.to_string(),
            interaction.user.id.to_string(),
            author.user.id.to_string(),
            modal.reason,
        )?;
        let outcome = record_report(&mr.db, &report).await?;
        anyhow::Ok((report, outcome))
    }
    .await;
    // the submission is the only thing the reporter can still see, answer it
    let report = match recorded {
        Ok((_, ReportOutcome::AlreadyReported)) => {
            submitted
                .create_response(sctx, ephemeral_embed(already_reported_embed()))
                .await?;
            return Ok(());
        }
        Ok((report, ReportOutcome::Recorded(id))) => {
            info!("Report #{} on {} by {}", id, report.message_id, report.reporter_id);
            report
        }
        Err(e) => {
            if let Err(reply) = submitted
                .create_response(sctx, ephemeral_embed(failure_embed()))
                .await
            {
                error!("Failed to tell the reporter about the failure: {}", reply);
            }
            return Err(e);
        }
    };
    submitted
        .create_response(sctx, ephemeral_embed(thanks_embed()))
        .await?;

    let counts = mr.db.report_counts(&report).await?;

    let Some(moderators) = mr.config.discord.moderators else {
        return Ok(());
    };
    match moderators.to_channel(sctx).await {
        Ok(c) if is_summary_channel(&c) => {}
        other => {
            debug!("Moderator channel {} is unusable: {:?}", moderators, other.map(|c| c.id()));
            return Ok(());
        }
    }
    let summary = ReportSummary {
        guild_id,
        channel_id: interaction.channel_id,
        report: &report,
        counts,
    };
    moderators
        .send_message(sctx, CreateMessage::default().embed(create_summary_embed(&summary)))
        .await?;

    if mr.config.spam.sweep_after_report {
        spam::spawn_sweep(
            sctx.clone(),
            interaction.channel_id,
            mr.config.spam.scan_limit(),
            &mr.shutdown,
        );
    }
    Ok(())
}

/// Once the modal is shown the command interaction can't take a plain reply
/// anymore, and the submission is answered in the command itself.
async fn log_error(error: FrameworkError<'_, crate::ModReporter, anyhow::Error>) {
    if let FrameworkError::Command { error, .. } = error {
        error!("Error while filing a report: {:?}", error);
    } else if let Err(e) = poise::builtins::on_error(error).await {
        error!("Error while handling error: {}", e);
    }
}

#[derive(Debug, Modal)]
#[name = "Report to moderator"]
struct ReasonModal {
    #[name = "Reason"]
    #[paragraph]
    #[max_length = 100]
    reason: String,
}

#[cfg(test)]
mod tests {
    use super::ReasonModal;
    use common::REASON_MAX_LENGTH;
    use poise::Modal;

    #[test]
    fn reason_input_is_required_and_capped() {
        let v = serde_json::to_value(ReasonModal::create(None, "1234".to_string())).unwrap();
        assert_eq!(v["data"]["custom_id"], "1234");
        assert_eq!(v["data"]["title"], "Report to moderator");
        let input = &v["data"]["components"][0]["components"][0];
        assert_eq!(input["label"], "Reason");
        assert_eq!(input["required"], true);
        assert_eq!(input["max_length"], REASON_MAX_LENGTH as u64);
    }
}
