use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use velo_stations::jcdecaux::{JcDecauxClient, JcDecauxConfig, JcDecauxError};
use velo_stations::preferences::FileStore;
use velo_stations::resource::Resource;
use velo_stations::state::{StationStateManager, StationViews, StationsConfig, ViewsWatcher};

/// How many stations to log per update.
const LOGGED_STATIONS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), JcDecauxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("velo_stations=info")),
        )
        .init();

    // Runtime key wins over the one baked in at build time
    let config = match std::env::var("JCDECAUX_API_KEY") {
        Ok(key) if !key.is_empty() => JcDecauxConfig::new(key),
        _ => JcDecauxConfig::from_build_env().unwrap_or_else(|| {
            warn!("JCDECAUX_API_KEY not set. API calls will fail.");
            JcDecauxConfig::new("")
        }),
    };
    let config = match std::env::var("VELO_CONTRACT") {
        Ok(contract) if !contract.is_empty() => config.with_contract(contract),
        _ => config,
    };
    let client = JcDecauxClient::new(config)?;

    let store = match std::env::var("VELO_PREFS_PATH") {
        Ok(path) if !path.is_empty() => FileStore::open(path),
        _ => FileStore::open_default(),
    };
    info!(contract = client.contract(), prefs = %store.path().display(), "Starting");

    let manager = StationStateManager::new(client, store, StationsConfig::default());
    manager.initialize();
    info!(screen = %manager.last_screen(), "Restored last screen");

    let mut watcher = manager.subscribe();
    manager.load_stations().await;
    log_views(&watcher.borrow_and_update());
    manager.start_auto_refresh();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
        }
    };
    log_until(watcher, shutdown).await;
    info!("Shutting down");

    manager.stop_auto_refresh();
    Ok(())
}

/// Log every change of the views until `shutdown` completes or the
/// publisher is gone. Returns the number of changes logged.
async fn log_until(mut watcher: ViewsWatcher, shutdown: impl Future<Output = ()>) -> usize {
    tokio::pin!(shutdown);
    let mut logged = 0;

    loop {
        tokio::select! {
            changed = watcher.changed() => {
                if changed.is_err() {
                    break;
                }
                let views = watcher.borrow_and_update().clone();
                log_views(&views);
                logged += 1;
            }
            _ = &mut shutdown => break,
        }
    }
    logged
}

fn log_views(views: &StationViews) {
    match &views.status {
        Resource::Loading => info!("Refreshing stations..."),
        Resource::Error(message) => warn!(error = %message, "Station refresh failed"),
        Resource::Success(snapshot) => {
            info!(
                stations = snapshot.len(),
                shown = views.filtered.len(),
                favorites = views.favorites.len(),
                sort = %views.sort_field,
                order = %views.sort_order,
                data_updated_at = ?views.data_updated_at(),
                "Stations updated"
            );
            for station in views.filtered.iter().take(LOGGED_STATIONS) {
                let counts = station.availabilities();
                info!(
                    number = %station.number,
                    name = %station.name,
                    status = %station.status,
                    bikes = counts.bikes,
                    mechanical = counts.mechanical_bikes,
                    electrical = counts.electrical_bikes,
                    stands = counts.stands,
                    favorite = views.is_favorite(station.number),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::watch;

    #[tokio::test(start_paused = true)]
    async fn shutdown_fires_while_views_keep_changing() {
        let (sender, watcher) = watch::channel(StationViews::default());
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                sender.send_modify(|v| v.search_query.push('x'));
            }
        });

        let logged = log_until(watcher, tokio::time::sleep(Duration::from_millis(5_500))).await;
        assert_eq!(logged, 5);
    }

    #[tokio::test]
    async fn stops_when_publisher_is_gone() {
        let (sender, watcher) = watch::channel(StationViews::default());
        drop(sender);

        let logged = log_until(watcher, std::future::pending()).await;
        assert_eq!(logged, 0);
    }
}
