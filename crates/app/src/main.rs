//! Composition root (§9 "process topology"): wires every component in
//! dependency order — reference data and persistence first, then the
//! versioned caches, the always-on server collector, the dynamic per-server
//! collector fleet, and finally the dispatch surfaces — and runs until
//! `ctrl_c` or a dispatcher/grpc failure cancels the shared shutdown token.

mod config;
mod region;
mod supervisor;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use cache::{ObjectStoreMirror, VersionedCache};
use collector::{
    dispatch_post::DispatchPostCacheEntry,
    server::{ServerCacheEntry, ServerCollector},
    signal_resolver::ReferenceDataSignalResolver,
};
use config::Settings;
use dispatcher::{broker::BrokerPublisher, service::UpdateDispatcherService, Dispatcher};
use object_store::aws::AmazonS3Builder;
use reconciler::JourneyRegistry;
use reference_data::ReferenceDataProvider;
use supervisor::{ServerSupervisor, SharedDeps};
use tokio_cron_scheduler::JobScheduler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use upstream::client::{UpstreamBaseUrls, UpstreamClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    let shutdown = CancellationToken::new();

    let points_json = std::fs::read_to_string(&settings.reference_data.points_path)?;
    let signals_json = std::fs::read_to_string(&settings.reference_data.signals_path)?;
    let railcars_json = std::fs::read_to_string(&settings.reference_data.railcars_path)?;
    let reference_data = ReferenceDataProvider::load_from_json(&points_json, &signals_json, &railcars_json)?;
    let points = Arc::new(reference_data.points);
    let signals = Arc::new(reference_data.signals);
    let railcars = Arc::new(reference_data.railcars);

    let database = Arc::new(database::PgDatabase::connect(&settings.database.postgres_url()).await?);
    tracing::info!("connected to database");

    let remote_mirror: Option<Arc<dyn cache::RemoteMirror>> = match &settings.remote_cache.bucket_url {
        Some(url) => {
            let store = AmazonS3Builder::from_env().with_url(url.as_str()).build()?;
            Some(Arc::new(ObjectStoreMirror::new(Arc::new(store))))
        }
        None => None,
    };

    let server_cache = Arc::new(VersionedCache::<ServerCacheEntry>::new("servers", cache::DEFAULT_TTL, remote_mirror.clone()));
    let dispatch_post_cache = Arc::new(VersionedCache::<DispatchPostCacheEntry>::new("dispatch-posts", cache::DEFAULT_TTL, remote_mirror));
    server_cache.pull().await.ok();
    dispatch_post_cache.pull().await.ok();
    let _server_sweeper = cache::spawn_sweeper(server_cache.clone(), shutdown.child_token());
    let _dispatch_post_sweeper = cache::spawn_sweeper(dispatch_post_cache.clone(), shutdown.child_token());

    let client = Arc::new(UpstreamClient::new(UpstreamBaseUrls {
        panel: settings.upstream.panel_url.clone(),
        aws: settings.upstream.aws_url.clone(),
        routing: settings.upstream.routing_url.clone(),
        profile: settings.upstream.profile_url.clone(),
    }));

    let journey_registry = Arc::new(JourneyRegistry::new(Arc::new(ReferenceDataSignalResolver::new(signals))));

    let broker = match &settings.broker.url {
        Some(url) => Some(BrokerPublisher::connect(url).await?),
        None => None,
    };
    let dispatcher = Arc::new(Dispatcher::new(broker));

    let grpc_addr: SocketAddr = "0.0.0.0:50051".parse().expect("fixed address always parses");
    let grpc_service = UpdateDispatcherService::new(dispatcher.clone());
    let grpc_shutdown = shutdown.clone();
    let grpc_handle = tokio::spawn(async move {
        if let Err(err) = tonic::transport::Server::builder()
            .add_service(dispatcher::frame::proto::update_dispatcher_server::UpdateDispatcherServer::new(grpc_service))
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled())
            .await
        {
            tracing::error!(error = %err, "grpc server exited with an error");
        }
    });

    let (_server_health, server_handle) = collector::scheduler::spawn(
        ServerCollector::new(client.clone(), server_cache.clone(), database.clone(), region::region_for),
        shutdown.child_token(),
    );

    let scheduler = JobScheduler::new().await?;
    housekeeping::schedule(
        &scheduler,
        &settings.housekeeping.cron,
        database.clone(),
        settings.housekeeping.retention_days,
        settings.housekeeping.batch_limit,
    )
    .await
    .map_err(|err| format!("failed to schedule housekeeping job: {err:?}"))?;
    scheduler.start().await?;

    let deps = SharedDeps {
        client,
        points,
        railcars,
        dispatch_post_cache,
        journey_registry,
        dispatcher,
        database,
        gone_threshold: settings.active_train.gone_threshold,
    };
    let supervisor = ServerSupervisor::new(deps, server_cache);
    let supervisor_shutdown = shutdown.child_token();
    let supervisor_handle = tokio::spawn(supervisor.run(supervisor_shutdown));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    shutdown.cancel();

    let _ = tokio::time::timeout(Duration::from_secs(10), async {
        let _ = server_handle.await;
        let _ = supervisor_handle.await;
        let _ = grpc_handle.await;
    })
    .await;

    Ok(())
}
