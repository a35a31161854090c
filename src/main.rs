use std::sync::Arc;

use session_booking::booking::NotificationLog;
use session_booking::cli::{SessionEnd, TerminalWizard};
use session_booking::config::{AvailabilityMode, BookingConfig};
use session_booking::services::SystemMailClient;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = BookingConfig::from_env()?;

    let transport = if config.smtp.is_some() { "smtp" } else { "http relay" };
    let calendar = match &config.availability {
        AvailabilityMode::Weekdays => "weekdays".to_string(),
        AvailabilityMode::Blocked(dates) => format!("weekdays, {} blocked", dates.len()),
        AvailabilityMode::Provider(p) => format!("provider at {}", p.base_url),
    };

    eprintln!("📅 Session Booking v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Submission: {}", transport);
    eprintln!("   Availability: {}", calendar);
    eprintln!("   Answer each question and press Enter. :next, :back, :quit to navigate.\n");

    let notifications = Arc::new(NotificationLog::new());
    let wizard = config.build_wizard(Arc::new(SystemMailClient::new()), notifications.clone())?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut terminal = TerminalWizard::new(wizard, notifications, stdin, tokio::io::stdout());

    match terminal.run().await? {
        SessionEnd::Submitted => tracing::info!("Booking session finished"),
        SessionEnd::Quit => tracing::info!("Booking session abandoned"),
    }
    Ok(())
}
