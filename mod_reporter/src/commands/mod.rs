use poise::serenity_prelude::Permissions;

mod ping;
mod report_to_moderator;
mod reports;
mod sweep_spam;

pub fn commands() -> Vec<poise::Command<crate::ModReporter, anyhow::Error>> {
    let moderator_only = vec![reports::reports(), sweep_spam::sweep_spam()]
        .into_iter()
        .map(|mut i| {
            i.guild_only = true;
            i.checks
                .push(|ctx: crate::Context| Box::pin(async move { check_perms(ctx).await }));
            i
        });
    // anyone may report or ping, guild checks for reports happen inside
    vec![report_to_moderator::report_to_moderator(), ping::ping()]
        .into_iter()
        .chain(moderator_only)
        .collect()
}

async fn check_perms(ctx: crate::Context<'_>) -> anyhow::Result<bool> {
    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };
    let Some(guild) = ctx.guild() else {
        return Ok(false);
    };
    Ok(member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .any(|role| grants_moderation(role.permissions, &role.name)))
}

fn grants_moderation(permissions: Permissions, role_name: &str) -> bool {
    permissions.contains(Permissions::ADMINISTRATOR)
        || role_name.contains("Admin")
        || role_name.contains("Mod")
}

#[cfg(test)]
mod tests {
    use super::{commands, grants_moderation};
    use poise::serenity_prelude::Permissions;

    #[test]
    fn only_moderation_commands_are_checked() {
        let cmds = commands();
        let checked = |name: &str| {
            let c = cmds
                .iter()
                .find(|c| c.name == name)
                .unwrap_or_else(|| panic!("no command {}", name));
            !c.checks.is_empty()
        };
        assert!(!checked("report_to_moderator"));
        assert!(!checked("ping"));
        assert!(checked("reports"));
        assert!(checked("sweep_spam"));
        assert_eq!(cmds.len(), 4);
    }

    #[test]
    fn moderator_roles() {
        assert!(grants_moderation(Permissions::ADMINISTRATOR, "everyone"));
        assert!(grants_moderation(Permissions::empty(), "Server Admin"));
        assert!(grants_moderation(Permissions::SEND_MESSAGES, "Mods"));
        assert!(!grants_moderation(Permissions::SEND_MESSAGES, "member"));
        assert!(!grants_moderation(Permissions::MANAGE_MESSAGES, "moderator"));
    }
}
