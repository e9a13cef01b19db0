mod bootstrap;

use anyhow::Result;
use chrono::Utc;
use views_core::settings::Settings;
use views_data::client::{ClientConfig, WikimediaClient};
use views_runtime::orchestrator::{ReportConfig, ReportOrchestrator};
use views_ui::app::{App, ChartOptions, FlagGate, PromptGate};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("wikiviews v{} starting", env!("CARGO_PKG_VERSION"));

    let report_config = ReportConfig::from_settings(&settings)?;
    tracing::info!(
        "User: {}, Project: {}, Agent: {}, Excluded: {}",
        report_config.user,
        settings.project,
        settings.agent,
        report_config.exclusions.len()
    );

    let client = WikimediaClient::new(ClientConfig::from_settings(&settings))?;
    let orchestrator = ReportOrchestrator::new(client, report_config);
    let now = Utc::now();

    // Ctrl+C while requests are in flight stops the run before anything
    // is written.
    let outcome = tokio::select! {
        result = orchestrator.run(now) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; stopping before the report was written");
            return Ok(());
        }
    };

    let options = ChartOptions::from_settings(&settings);
    let stdout = std::io::stdout();

    if settings.interactive {
        App::new(PromptGate::stdio(), stdout.lock(), options).present(&outcome, now)?;
    } else {
        let gate = FlagGate {
            bar_chart: settings.bar_chart,
            line_chart: settings.line_chart,
        };
        App::new(gate, stdout.lock(), options).present(&outcome, now)?;
    }

    Ok(())
}
