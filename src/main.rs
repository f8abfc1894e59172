use std::sync::Arc;

use mimalloc::MiMalloc;
use strata::{
    AsyncChainedLookup, AsyncDataSource, Config, DiskStore, KeyedTier, MemoryCache,
    MemoryCacheHandle, cache_key,
};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: strata get <key>... | strata put <key> <value> | strata --health-check";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        storage_path = %config.storage_path.display(),
        l1_capacity = config.l1_capacity,
        refresh_policy = %config.refresh_policy,
        "Strata starting"
    );

    match args.split_first() {
        Some((cmd, keys)) if cmd == "get" && !keys.is_empty() => run_get(&config, keys).await,
        Some((cmd, rest)) if cmd == "put" && rest.len() == 2 => run_put(&config, &rest[0], &rest[1]),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn build_chain(config: &Config) -> anyhow::Result<AsyncChainedLookup<String, String>> {
    let memory: MemoryCacheHandle<String, String> = match config.l1_ttl {
        Some(ttl) => MemoryCacheHandle::from_cache(MemoryCache::with_ttl(config.l1_capacity, ttl)),
        None => MemoryCacheHandle::from_cache(MemoryCache::with_capacity(config.l1_capacity)),
    };
    let disk: DiskStore<String> = DiskStore::open(&config.storage_path)?;

    let chain = AsyncChainedLookup::with_policy(
        vec![
            AsyncDataSource::shared(Arc::new(KeyedTier::new(&config.key_prefix, memory)))
                .named("memory"),
            AsyncDataSource::new(KeyedTier::new(&config.key_prefix, disk)).named("disk"),
        ],
        config.refresh_policy,
    )?;
    Ok(chain)
}

async fn run_get(config: &Config, keys: &[String]) -> anyhow::Result<()> {
    let chain = build_chain(config)?;

    for key in keys {
        let result = chain.lookup(key).await?;
        match (result.tier(), result.value()) {
            (Some(tier), Some(value)) => {
                println!("HIT tier={} {} = {}", tier, key, value);
            }
            _ => println!("MISS {}", key),
        }
    }
    Ok(())
}

fn run_put(config: &Config, key: &str, value: &str) -> anyhow::Result<()> {
    let disk: DiskStore<String> = DiskStore::open(&config.storage_path)?;
    let path = disk.put(&cache_key(&config.key_prefix, key), &value.to_string())?;

    tracing::debug!(key = %key, path = %path.display(), "Stored value");
    println!("STORED {}", key);
    Ok(())
}

fn run_health_check() -> i32 {
    let Ok(config) = Config::from_env() else {
        return 1;
    };
    if config.validate().is_err() {
        return 1;
    }

    match DiskStore::<String>::open(&config.storage_path) {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
