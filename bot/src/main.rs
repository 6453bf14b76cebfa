mod scheduler;

use anyhow::{Context, Result};
use droper::{Config, Credentials, DiscordNotifier, HttpClient, Poller, Repricer, StateStore};
use scheduler::Scheduler;
use std::env;
use tokio::signal;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();

    let config_path = env::var("DROPER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = Config::load(&config_path)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;
    let credentials = Credentials::from_env(&config)?;

    let poller = build_poller(&config, &credentials)?;
    log::info!(
        "Tracking {} item(s), checking every {}s",
        config.items.len(),
        config.schedule.check_interval_secs
    );

    let scheduler = Scheduler::new(poller).await?;
    scheduler.start(config.schedule.check_interval()).await?;
    signal::ctrl_c().await?;
    log::info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}

fn build_poller(config: &Config, credentials: &Credentials) -> Result<scheduler::DroperPoller> {
    let schedule = &config.schedule;
    let repricer = Repricer::new(
        HttpClient::new(config, credentials)?,
        schedule.min_interval(),
        config.fee_rate,
    );
    let notifier = DiscordNotifier::new(
        credentials.webhook_url.clone(),
        config.fee_rate,
        config.currency.clone(),
        schedule.request_timeout(),
    )?;
    let item_delay = std::time::Duration::from_millis(schedule.item_delay_min_ms)
        ..=std::time::Duration::from_millis(schedule.item_delay_max_ms);

    Ok(Poller::new(
        repricer,
        notifier,
        config.tracked_items()?,
        StateStore::new(&config.state_file),
        item_delay,
    ))
}
