use anyhow::Result;
use droper::{DiscordNotifier, HttpClient, Poller};
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

pub(crate) type DroperPoller = Poller<HttpClient, DiscordNotifier>;

pub(crate) struct Scheduler {
    poller: Arc<Mutex<DroperPoller>>,
    scheduler: JobScheduler,
}

impl Scheduler {
    pub(crate) async fn new(poller: DroperPoller) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            poller: Arc::new(Mutex::new(poller)),
            scheduler,
        })
    }

    /// Initializes prices, runs a first cycle right away and then one every `interval`.
    pub(crate) async fn start(&self, interval: Duration) -> Result<()> {
        {
            let mut poller = self.poller.lock().await;
            poller.initialize().await?;
            poller.run_cycle().await;
        }

        let poller = self.poller.clone();
        let job = Job::new_repeated_async(interval, move |_uuid, _l| {
            let poller = poller.clone();
            Box::pin(async move {
                tick(&poller).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        Ok(())
    }

    pub(crate) async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

/// Runs a cycle unless one is already in progress. Ticks are dropped, never
/// queued. Returns whether a cycle ran.
async fn tick(poller: &Mutex<DroperPoller>) -> bool {
    match poller.try_lock() {
        Ok(mut poller) => {
            poller.run_cycle().await;
            true
        }
        Err(_) => {
            warn!("Previous cycle still running, skipping this tick");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droper::{Config, Credentials, Repricer, StateStore};

    const CONFIG: &str = r#"
        [[items]]
        name = "40"
        drop_id = 21251
        listing_id = 15
        product_id = 12345
        floor_price = 12.00
    "#;

    // No tracked items, so a cycle touches neither the network nor the state file.
    fn idle_poller() -> DroperPoller {
        let config: Config = CONFIG.parse().unwrap();
        let credentials = Credentials {
            auth_token: "token".into(),
            cookie_header: None,
            webhook_url: None,
        };
        let timeout = config.schedule.request_timeout();
        Poller::new(
            Repricer::new(HttpClient::new(&config, &credentials).unwrap(), timeout, 0.13),
            DiscordNotifier::new(None, 0.13, "R$", timeout).unwrap(),
            Vec::new(),
            StateStore::new("state.json"),
            Duration::ZERO..=Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn tick_is_skipped_while_a_cycle_runs() {
        let poller = Mutex::new(idle_poller());

        let running = poller.lock().await;
        assert!(!tick(&poller).await);
        drop(running);

        assert!(tick(&poller).await);
    }
}
