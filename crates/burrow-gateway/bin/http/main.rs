mod cli;

use crate::cli::{CacheBackendArg, GeneratorArg, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_cache::{LayeredCache, MokaUrlCache, RedisUrlCache};
use burrow_core::{Repository, Shortener, UrlCache};
use burrow_gateway::{App, AppState};
use burrow_generator::{Generator, RandomGenerator, SequentialGenerator};
use burrow_shortener::{ShortenerService, ShortenerSettings};
use burrow_storage::{
    schema, InMemoryRepository, InMemorySequenceCounter, MySqlRepository, MySqlSequenceCounter,
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    burrow_telemetry::init(config.log_format.into())?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        generator = %config.generator,
        cache_backend = %config.cache,
        "starting gateway server"
    );

    let cache = build_cache(&config).await?;
    let shortener = build_shortener(&config, cache).await?;
    let state = AppState::new(shortener, config.redirect_base_url.clone());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn build_cache(config: &CLI) -> anyhow::Result<Option<Arc<dyn UrlCache>>> {
    let local = || -> MokaUrlCache {
        MokaUrlCache::builder()
            .max_capacity(config.cache_capacity)
            .default_ttl(config.cache_ttl())
            .build()
            .into()
    };
    let redis_url = || {
        config
            .redis_url
            .as_deref()
            .context("redis url is required for the redis and layered caches")
    };

    let cache: Option<Arc<dyn UrlCache>> = match config.cache {
        CacheBackendArg::Disabled => None,
        CacheBackendArg::Moka => Some(Arc::new(local())),
        CacheBackendArg::Redis => Some(Arc::new(RedisUrlCache::connect(redis_url()?).await?)),
        CacheBackendArg::Layered => Some(Arc::new(LayeredCache::new(
            local(),
            RedisUrlCache::connect(redis_url()?).await?,
        ))),
    };
    Ok(cache)
}

async fn build_shortener(
    config: &CLI,
    cache: Option<Arc<dyn UrlCache>>,
) -> anyhow::Result<Arc<dyn Shortener>> {
    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .dedup(config.dedup.into())
        .cache_ttl(config.cache_ttl())
        .negative_cache_ttl(config.negative_cache_ttl())
        .store_timeout(config.store_timeout())
        .cache_timeout(config.cache_timeout())
        .build();

    match config.storage {
        StorageBackendArg::InMemory => {
            let generator: Arc<dyn Generator> = match config.generator {
                GeneratorArg::Random => Arc::new(RandomGenerator::with_length(config.code_length)?),
                GeneratorArg::Sequential => {
                    Arc::new(SequentialGenerator::new(InMemorySequenceCounter::new()))
                }
            };
            Ok(assemble(Arc::new(InMemoryRepository::new()), generator, cache, settings))
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn).await?;
            schema::ensure(repository.pool()).await?;

            let generator: Arc<dyn Generator> = match config.generator {
                GeneratorArg::Random => Arc::new(RandomGenerator::with_length(config.code_length)?),
                GeneratorArg::Sequential => Arc::new(SequentialGenerator::new(
                    MySqlSequenceCounter::init(
                        repository.pool().clone(),
                        MySqlSequenceCounter::DEFAULT_NAME,
                    )
                    .await?,
                )),
            };
            Ok(assemble(Arc::new(repository), generator, cache, settings))
        }
    }
}

fn assemble<R: Repository>(
    repository: Arc<R>,
    generator: Arc<dyn Generator>,
    cache: Option<Arc<dyn UrlCache>>,
    settings: ShortenerSettings,
) -> Arc<dyn Shortener> {
    let service = ShortenerService::new(repository, generator, settings);
    match cache {
        Some(cache) => Arc::new(service.with_cache(cache)),
        None => Arc::new(service),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
