use std::future::Future;

use anyhow::Result;
use futures::StreamExt;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, ResourceExt};
use tracing::{debug, error, info};

use crate::core::client::kube_resources::Service;

/// Streams Service deletions and hands each deleted object to `handler`.
///
/// Only `Delete` events are forwarded; the initial listing and updates are
/// handled by the controller.
pub async fn watch_service_deletions<F, Fut>(api: Api<Service>, mut handler: F) -> Result<()>
where
    F: FnMut(Service) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    info!("Starting Service deletion watcher...");

    let mut stream = watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed();

    while let Some(result) = stream.next().await {
        match result {
            Ok(watcher::Event::Delete(service)) => {
                debug!(
                    "Service deleted: {}/{}",
                    service.namespace().unwrap_or_default(),
                    service.name_any()
                );

                if let Err(e) = handler(service).await {
                    error!("Error handling service deletion: {:?}", e);
                }
            }
            Ok(_) => {}
            Err(e) => {
                // The backoff wrapper re-establishes the watch
                error!("Service watcher error: {:?}", e);
            }
        }
    }

    Ok(())
}
