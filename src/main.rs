use clap::Parser;
use nyc311_etl::config::{Cli, Command};
use nyc311_etl::core::ConfigProvider;
use nyc311_etl::utils::{logger, validation::Validate};
use nyc311_etl::{
    fetch_raw, transform_location, CliConfig, ComplaintsPipeline, EtlEngine, EtlError,
    LocalStorage, Result, TomlConfig,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --config 指定時先載入 TOML，才知道要不要用 JSON 日誌
    let toml_config = match &cli.command {
        Command::Run(CliConfig {
            config: Some(path), ..
        }) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                logger::init_cli_logger(cli.verbose);
                exit_with(e);
            }
        },
        _ => None,
    };

    let json_logs = cli.json_logs || toml_config.as_ref().is_some_and(TomlConfig::json_logs);
    if json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting nyc311-etl CLI");
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    let result = match cli.command {
        Command::Fetch(args) => execute_fetch(args).await,
        Command::Transform(args) => execute_transform(args).await,
        Command::Upload(args) => execute_upload(args).await,
        Command::Run(config) => match toml_config {
            Some(toml_config) => execute_toml_run(toml_config).await,
            None => execute_run(config).await,
        },
    };

    match result {
        Ok(()) => {
            tracing::info!("✅ ETL process completed successfully!");
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: EtlError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.exit_code());
}

async fn execute_fetch(args: nyc311_etl::config::cli::FetchArgs) -> Result<()> {
    args.validate()?;
    let count = fetch_raw(&args.endpoint, &args.raw, args.timeout_seconds).await?;
    println!("📥 Fetched {} records into {}", count, args.raw);
    Ok(())
}

async fn execute_transform(args: nyc311_etl::config::cli::TransformArgs) -> Result<()> {
    args.validate()?;
    let report = transform_location(&args.input, &args.output, args.output_format(), args.cleaning())
        .await?;
    println!(
        "🔄 {} -> {} rows, {} columns written to {}",
        report.input_rows,
        report.output_rows,
        report.output_columns.len(),
        args.output
    );
    Ok(())
}

#[cfg(feature = "s3")]
async fn execute_upload(args: nyc311_etl::config::cli::UploadArgs) -> Result<()> {
    args.validate()?;
    nyc311_etl::upload_file(&args.file, &args.bucket, &args.key, args.region.as_deref()).await?;
    println!("☁️ Uploaded {} to s3://{}/{}", args.file, args.bucket, args.key);
    Ok(())
}

#[cfg(not(feature = "s3"))]
async fn execute_upload(args: nyc311_etl::config::cli::UploadArgs) -> Result<()> {
    args.validate()?;
    Err(EtlError::ConfigError {
        message: "upload requires a build with the `s3` feature".to_string(),
    })
}

async fn execute_run(config: CliConfig) -> Result<()> {
    config.validate()?;
    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let monitor = config.monitor;
    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = ComplaintsPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    let outcome = engine.run().await?;
    println!("📁 Output saved to: {}", outcome.output_location);
    Ok(())
}

async fn execute_toml_run(config: TomlConfig) -> Result<()> {
    config.validate()?;
    tracing::info!(
        "📋 Running pipeline '{}' ({} -> {})",
        config.pipeline.name,
        config.api_endpoint(),
        config.output_location()
    );

    let upload = config.upload.clone();
    let output_location = config.output_location();
    let monitor = config.monitoring_enabled();

    let storage = LocalStorage::new(config.load.output_path.clone());
    let pipeline = ComplaintsPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    let outcome = engine.run().await?;
    println!("📁 Output saved to: {}", outcome.output_location);

    match upload {
        #[cfg(feature = "s3")]
        Some(upload) => {
            nyc311_etl::upload_file(
                &output_location,
                &upload.bucket,
                &upload.key,
                upload.region.as_deref(),
            )
            .await?;
            println!("☁️ Uploaded to s3://{}/{}", upload.bucket, upload.key);
        }
        #[cfg(not(feature = "s3"))]
        Some(_) => {
            return Err(EtlError::ConfigError {
                message: format!(
                    "[upload] is set but this build has no `s3` feature; {} was not uploaded",
                    output_location
                ),
            });
        }
        None => {}
    }

    Ok(())
}
