use clap::Parser;
use pitcher_rating::app::presenter::{ChartRenderer, Exporter};
use pitcher_rating::core::engine::file_timestamp;
use pitcher_rating::utils::{logger, validation::Validate};
use pitcher_rating::{
    Cli, FanGraphsProvider, LocalStorage, ProviderOptions, QueryService, RatingEngine,
    ResponseCache, Settings,
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    logger::init_cli_logger(cli.verbose, &settings.logging).map_err(|e| {
        anyhow::anyhow!(
            "could not open log file in {}: {}",
            settings.logging.directory,
            e
        )
    })?;
    tracing::debug!("CLI arguments: {:?}", cli);

    settings.validate()?;

    let cache = if settings.cache.enabled && !cli.no_cache {
        tracing::debug!("Response cache enabled in {}", settings.cache.directory);
        Some(ResponseCache::new(
            LocalStorage::new(settings.cache.directory.clone()),
            settings.cache_max_age(),
        ))
    } else {
        tracing::debug!("Response cache disabled");
        None
    };

    let provider = FanGraphsProvider::new(
        ProviderOptions {
            base_url: settings.provider.base_url.clone(),
            timeout: settings.timeout(),
            user_agent: settings.provider.user_agent.clone(),
        },
        cache,
    )?;

    if cli.monitor {
        tracing::info!("System monitoring enabled");
    }

    let engine = RatingEngine::new_with_monitoring(
        QueryService::new(provider),
        Exporter::new(
            LocalStorage::new(settings.output.directory.clone()),
            settings.output.formats.clone(),
        ),
        ChartRenderer::new(LocalStorage::new(settings.output.figures_directory.clone())),
        cli.monitor,
    );

    let request = cli.command.into_request();
    engine.run(&request, &file_timestamp()).await?;

    Ok(())
}
