//! Facebook Downloader - CLI entry point.

use std::collections::HashSet;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use facebook_downloader::{
    api::{GraphApi, ProxyPool},
    cancel::install_signal_handler,
    cli::Args,
    config::{parse_album_id, validate_config, Config, SyncMode},
    download::{run_batch, GlobalState},
    error::{exit_codes, Error, Result},
    output::{
        create_spinner, print_banner, print_batch_summary, print_config_summary, print_error,
        print_global_stats, print_info, print_pool_health, print_success, print_warning,
    },
    store::MediaStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Api(_) | Error::Graph { .. } | Error::TargetNotFound(_) => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Download(_) | Error::TooManyRedirects(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    let config_path = args.config.clone();
    let check_proxies = args.check_proxies;
    let remove_dead = args.remove_dead;

    // Load configuration
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            config_path.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config {
            targets: Default::default(),
            account: Default::default(),
            options: Default::default(),
            proxy: Default::default(),
            store: Default::default(),
        }
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Proxy maintenance is self-contained: probe, report, optionally
    // prune, then exit without touching the API.
    if check_proxies {
        return check_proxy_health(&config, &config_path, remove_dead).await;
    }

    // Normalize the album argument (accepts raw IDs and album URLs)
    if let Some(raw) = config.options.album_id.clone() {
        config.options.album_id = Some(parse_album_id(&raw)?);
    }

    // Validate configuration
    validate_config(&config)?;

    // Print configuration summary
    let targets: Vec<String> = match config.options.sync_mode {
        SyncMode::Album => config.options.album_id.iter().cloned().collect(),
        _ => config.targets.ids.clone(),
    };
    let proxies = if config.proxy.enabled {
        config.proxy_list()?
    } else {
        Vec::new()
    };
    print_config_summary(&config, &targets, proxies.len());

    // Open the local state store
    let store = MediaStore::open(&config.state_db_path())?;
    tracing::debug!("State store: {}", store.path().display());

    // Initialize the API client
    let pool = ProxyPool::new(proxies, &config.account.user_agent);
    if !pool.is_empty() {
        warm_proxy_pool(&pool, &config).await;
    }

    let api = GraphApi::new(
        &config.account,
        Duration::from_millis(config.options.min_request_delay_ms),
        config.options.max_retries,
        pool,
    )?;

    // Validate the token by fetching the authenticated node
    print_info("Connecting to the Graph API...");
    let me = api
        .get_node_metadata("me")
        .await?
        .ok_or_else(|| Error::Api("Could not validate the access token".to_string()))?;
    print_info(&format!(
        "Authenticated as: {}",
        me.name.as_deref().unwrap_or(&me.id)
    ));

    // First Ctrl+C finishes the current item, a second force-exits
    let cancel = install_signal_handler();

    // Run the batch
    let mut global = GlobalState::default();
    let summary = run_batch(&api, &config, &store, &mut global, &cancel).await?;

    print_batch_summary(&summary);
    print_global_stats(&global);

    if summary.cancelled {
        return Ok(exit_codes::ABORT);
    }

    if summary.failed_count() > 0 {
        return Ok(exit_codes::SOME_TARGETS_FAILED);
    }

    print_success("All targets synced");
    Ok(exit_codes::SUCCESS)
}

/// Probe every configured proxy, print the report, and with
/// `remove_dead` rewrite the inline proxy list in the config file.
async fn check_proxy_health(
    config: &Config,
    config_path: &Path,
    remove_dead: bool,
) -> Result<i32> {
    let proxies = config.proxy_list()?;
    if proxies.is_empty() {
        print_warning("No proxies configured, nothing to check");
        return Ok(exit_codes::SUCCESS);
    }

    let pool = ProxyPool::new(proxies, &config.account.user_agent);

    let spinner = create_spinner(&format!("Probing {} proxies...", pool.len()));
    let health = pool
        .health_check_all(
            &config.proxy.health_check_url,
            Duration::from_secs(config.proxy.probe_timeout_seconds),
            remove_dead,
        )
        .await;
    spinner.finish_and_clear();

    print_pool_health(&health);

    if remove_dead && health.dead_count() > 0 {
        if config.proxy.proxy_file.is_some() {
            print_warning("Entries from proxy_file are not rewritten; edit that file directly");
        }

        if config_path.exists() {
            // Prune the inline list only; file entries are not ours to edit.
            let survivors: HashSet<String> = pool.entries().into_iter().collect();
            let mut updated = config.clone();
            updated.proxy.proxies.retain(|spec| survivors.contains(spec));
            updated.save(config_path)?;
            print_info(&format!(
                "Kept {} of {} inline proxies in {}",
                updated.proxy.proxies.len(),
                config.proxy.proxies.len(),
                config_path.display()
            ));
        } else {
            print_warning("No config file to update");
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Probe the pool before the run and keep only healthy entries,
/// fastest first. With nothing healthy the run falls back to direct
/// connections.
async fn warm_proxy_pool(pool: &ProxyPool, config: &Config) {
    let spinner = create_spinner("Checking proxy health...");
    let health = pool
        .health_check_all(
            &config.proxy.health_check_url,
            Duration::from_secs(config.proxy.probe_timeout_seconds),
            false,
        )
        .await;
    spinner.finish_and_clear();

    if health.healthy_count() == 0 {
        print_warning("All proxies failed their health probe, continuing with direct connections");
    } else {
        print_info(&format!(
            "{} of {} proxies healthy",
            health.healthy_count(),
            pool.len()
        ));
    }

    pool.reorder_by_latency(&health);
}
