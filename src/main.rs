use clap::Parser;
use swapi_rank::app::{build_cache_store, build_pipeline};
use swapi_rank::core::health::{health_check, AppInfo};
use swapi_rank::domain::ports::ConfigProvider;
use swapi_rank::utils::error::{ErrorCategory, RankError};
use swapi_rank::utils::logger::{init_logger, LogFormat};
use swapi_rank::utils::validation::Validate;
use swapi_rank::{CliConfig, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_logger(cli.verbose, format);

    let (config, app_info): (Box<dyn ConfigProvider>, AppInfo) = match &cli.config {
        Some(path) => {
            let toml_config = TomlConfig::from_file(path)?;
            if let Err(e) = toml_config.validate() {
                fail(&e);
            }
            let info = toml_config.app_info();
            (Box::new(toml_config), info)
        }
        None => {
            if let Err(e) = cli.validate() {
                fail(&e);
            }
            (Box::new(cli.clone()), AppInfo::default())
        }
    };

    tracing::info!("Starting {}", app_info.banner(config.as_ref()));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let store = match build_cache_store(config.as_ref()).await {
        Ok(store) => store,
        Err(e) => fail(&e),
    };

    if cli.health_check {
        let report = health_check(store.as_ref()).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_healthy() {
            std::process::exit(3);
        }
        return Ok(());
    }

    let pipeline = match build_pipeline(config.as_ref(), store) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(&e),
    };

    match pipeline.compute_top_characters(!cli.no_cache).await {
        Ok(summaries) => {
            tracing::info!("✅ Ranked {} characters", summaries.len());
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

fn fail(e: &RankError) -> ! {
    tracing::error!(
        "❌ Request failed: {} (status: {}, category: {:?})",
        e,
        e.status_code(),
        e.category()
    );
    eprintln!("❌ {}", e.user_friendly_message());

    let exit_code = match e.category() {
        ErrorCategory::Configuration => 2,
        _ if e.is_service_unavailable() => 3,
        _ => 1,
    };
    std::process::exit(exit_code);
}
