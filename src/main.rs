use clap::Parser;
use layers_check::config::cli::LogFormat;
use layers_check::utils::error::{ErrorSeverity, LayersError};
use layers_check::utils::{logger, validation::Validate};
use layers_check::{CheckConfig, CliConfig, LayersCheck, ProcessLauncher, RunReport};

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_fatal(e: &LayersError) -> i32 {
    let headline = if e.is_fatal() { "Run aborted" } else { "Check failed" };
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        headline,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    exit_code(e.severity())
}

fn summarize(report: &RunReport) -> i32 {
    let failures = report.failures();
    if failures.is_empty() {
        tracing::info!("✅ All {} checks passed", report.checks_run());
        println!("✅ All {} checks passed", report.checks_run());
        return 0;
    }

    for failure in &failures {
        tracing::error!("❌ {}", failure);
        tracing::error!("💡 {}", failure.recovery_suggestion());
        eprintln!("❌ {}", failure.user_friendly_message());
    }
    eprintln!("{} of {} checks failed", failures.len(), report.checks_run());

    failures
        .iter()
        .map(LayersError::severity)
        .max()
        .map(exit_code)
        .unwrap_or(1)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting layers-check");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match CheckConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        std::process::exit(report_fatal(&e));
    }

    let expectations = match config.expectations.resolve(cli.variant.as_deref()) {
        Ok(expectations) => expectations,
        Err(e) => std::process::exit(report_fatal(&e)),
    };
    tracing::info!(
        "Expecting {} unreferenced and {} unused-in-all-layers modules",
        expectations.expected_unreferenced.len(),
        expectations.expected_unused_in_all_layers.len()
    );

    let launcher = ProcessLauncher::from_config(&config.boot);
    let check = LayersCheck::new(config, expectations, launcher);
    let delete_installations =
        cli.delete_installations || check.config().cleanup.delete_installations;

    let outcome = check.run(&cli.selected_checks()).await;

    if delete_installations {
        if let Err(e) = check.cleanup() {
            tracing::warn!("Cleanup failed: {}", e);
        }
    }

    let code = match outcome {
        Ok(report) => {
            if let Some(path) = &cli.report {
                std::fs::write(path, report.to_json()?)?;
                tracing::info!("📁 Report saved to: {}", path);
            }
            summarize(&report)
        }
        Err(e) => report_fatal(&e),
    };

    if code > 0 {
        std::process::exit(code);
    }

    Ok(())
}
