use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
mod commands;
use anyhow::Context as _;
use async_shutdown::ShutdownManager;
use database::Database;
use poise::serenity_prelude::{ChannelId, Client, GatewayIntents, GuildId};
use poise::{CreateReply, Framework, FrameworkError, FrameworkOptions};
use serde::Deserialize;
use tracing::info;
mod event;
mod tasks;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    main: MainConfig,
    discord: DiscordConfig,
    #[serde(default)]
    report: ReportConfig,
    #[serde(default)]
    spam: SpamConfig,
}
#[derive(Deserialize, Clone, Debug)]
pub struct MainConfig {
    token: String,
    #[serde(default = "default_database")]
    database: PathBuf,
}
#[derive(Deserialize, Clone, Debug)]
pub struct DiscordConfig {
    /// where report summaries go
    moderators: Option<ChannelId>,
    debug_guild: Option<GuildId>,
}
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ReportConfig {
    modal_timeout_secs: u64,
}
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SpamConfig {
    sweep_after_report: bool,
    scan_limit: u8,
}

fn default_database() -> PathBuf {
    PathBuf::from("mod_reporter.db")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            modal_timeout_secs: 300,
        }
    }
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            sweep_after_report: true,
            scan_limit: mod_reporter::spam::MAX_SCAN,
        }
    }
}

impl ReportConfig {
    pub fn modal_timeout(&self) -> Duration {
        Duration::from_secs(self.modal_timeout_secs)
    }
}

impl SpamConfig {
    pub fn scan_limit(&self) -> u8 {
        self.scan_limit.clamp(1, mod_reporter::spam::MAX_SCAN)
    }
}

impl Config {
    /// `DISCORD_TOKEN` and `MOD_CHANNEL_ID` win over the config file.
    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(token) = var("DISCORD_TOKEN") {
            self.main.token = token;
        }
        if let Some(channel) = var("MOD_CHANNEL_ID") {
            let id: u64 = channel
                .trim()
                .parse()
                .context("MOD_CHANNEL_ID is not a channel id")?;
            anyhow::ensure!(id != 0, "MOD_CHANNEL_ID can't be 0");
            self.discord.moderators = Some(ChannelId::new(id));
        }
        Ok(self)
    }
}

pub const DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

fn load_or_create_config() -> anyhow::Result<Config> {
    let config_path = PathBuf::from("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG).context("Failed to create default config")?;
    }
    let config_file =
        String::from_utf8(std::fs::read(config_path).context("failed to read config file")?)
            .context("config file is not utf8!")?;
    toml::from_str(&config_file).context("Failed to parse config file")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();
    info!("Starting mod_reporter v{}", env!("CARGO_PKG_VERSION"));
    let config = load_or_create_config()?.apply_env(|k| std::env::var(k).ok())?;
    config
        .discord
        .moderators
        .context("No moderator channel set (discord.moderators or MOD_CHANNEL_ID)")?;
    poise::serenity_prelude::validate_token(&config.main.token).context("Invalid token")?;

    let db = Database::new(&config.main.database)
        .await
        .context("Failed to open the database")?;
    let shutdown = ShutdownManager::new();

    setup_control_c(shutdown.clone());

    bot(config, db, shutdown.clone()).await?;

    let reason = shutdown.wait_shutdown_triggered().await;
    info!("Shutting down: {}", reason);

    let _ = shutdown.wait_shutdown_complete().await;
    info!("Goodbye!");
    Ok(())
}

fn setup_control_c(s: ShutdownManager<&'static str>) {
    tokio::task::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
        let _ = s.trigger_shutdown("ctrl-c");
    });
}

pub type Context<'a> = poise::Context<'a, ModReporter, anyhow::Error>;
pub type ApplicationContext<'a> = poise::ApplicationContext<'a, ModReporter, anyhow::Error>;

#[derive(Clone)]
pub struct ModReporter {
    pub config: Config,
    pub db: Arc<Database>,
    pub shutdown: ShutdownManager<&'static str>,
    /// background tasks only start on the first ready
    pub tasks_started: Arc<AtomicBool>,
}

async fn bot(config: Config, db: Database, s: ShutdownManager<&'static str>) -> anyhow::Result<()> {
    let framework_shutdown = s.clone();
    let token = config.main.token.clone();
    let client = Client::builder(
        &token,
        GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT,
    )
    .framework(Framework::new(
        FrameworkOptions {
            commands: commands::commands(),
            event_handler: |ctx, evt, framework, _| {
                Box::pin(async move {
                    if let Err(e) = event::handle(ctx, evt, framework).await {
                        tracing::error!("Error handling event ({:?}): {:?}", evt, e);
                        return Err(e);
                    }
                    Ok(())
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    if let FrameworkError::Command { ctx, error, .. } = error {
                        tracing::error!(
                            "Error in command {}: {:?}",
                            ctx.command().qualified_name,
                            error
                        );
                        if let Err(e) = ctx
                            .send(
                                CreateReply::default()
                                    .content("Something went wrong, please try again later.")
                                    .ephemeral(true),
                            )
                            .await
                        {
                            tracing::error!("Error while handling error: {}", e);
                        }
                    } else if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        },
        |ctx, _ready, framework: &Framework<ModReporter, anyhow::Error>| {
            Box::pin(async move {
                #[cfg(debug_assertions)]
                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    config
                        .discord
                        .debug_guild
                        .context("No debug guild in debug mode!")?,
                )
                .await?;
                #[cfg(not(debug_assertions))]
                poise::builtins::register_globally(ctx, &framework.options().commands)
                    .await
                    .context("failed to register commands")?;
                Ok(ModReporter {
                    config,
                    db: Arc::new(db),
                    shutdown: framework_shutdown,
                    tasks_started: Arc::new(AtomicBool::new(false)),
                })
            })
        },
    ))
    .await?;
    let client_shutdowner = s.clone();
    let shard_man = client.shard_manager.clone();
    let delay = s
        .wrap_delay_shutdown(async move {
            let _ = client_shutdowner.wait_shutdown_triggered().await;
            info!("Shutting down client");
            shard_man.shutdown_all().await;
            info!("Client shut down");
        })
        .map_err(|_| anyhow::anyhow!("already shutting down"))?;
    tokio::task::spawn(delay);
    tokio::task::spawn(async move {
        let mut client = client;

        if let Err(e) = client.start_autosharded().await {
            tracing::error!("Client error: {:?}", e);
        }
        let _ = s.trigger_shutdown("Client shutdown");
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use poise::serenity_prelude::ChannelId;

    use crate::{Config, DEFAULT_CONFIG};

    fn default_config() -> Config {
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }

    #[test]
    fn default_config_parses() {
        let c = default_config();
        assert!(c.discord.moderators.is_none());
        assert_eq!(c.report.modal_timeout_secs, 300);
        assert!(c.spam.sweep_after_report);
        assert_eq!(c.spam.scan_limit(), 100);
    }

    #[test]
    fn env_overrides_config() {
        let env: HashMap<&str, &str> = [("DISCORD_TOKEN", "abc"), ("MOD_CHANNEL_ID", " 1234 ")]
            .into_iter()
            .collect();
        let c = default_config()
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.main.token, "abc");
        assert_eq!(c.discord.moderators, Some(ChannelId::new(1234)));
    }

    #[test]
    fn bad_channel_env_is_an_error() {
        assert!(default_config()
            .apply_env(|k| (k == "MOD_CHANNEL_ID").then(|| "general".to_string()))
            .is_err());
        assert!(default_config()
            .apply_env(|k| (k == "MOD_CHANNEL_ID").then(|| "0".to_string()))
            .is_err());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let c: Config = toml::from_str(
            r#"
            [main]
            token = "t"
            [discord]
            moderators = 42
            "#,
        )
        .unwrap();
        assert_eq!(c.discord.moderators, Some(ChannelId::new(42)));
        assert_eq!(c.main.database.to_str(), Some("mod_reporter.db"));
        assert_eq!(c.spam.scan_limit(), 100);
    }
}
