use anyhow::Result;
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

mod ui;
mod utils;

use crate::ui::{FormUI, UiEvent};
use outreach::{
    controller::{FormController, SubmitOutcome},
    gateway::{FormEndpoint, HttpGateway, DEFAULT_TIMEOUT_SECS},
    models::{Severity, ToastMessage},
    storage::BackupStore,
    theme::ThemeManager,
};

/// Command line arguments for Outreach
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Outreach: a terminal contact form client.",
    long_about = "Outreach is a terminal client for a contact form: it validates your \
    name, email and message, posts them to the configured form-collection endpoint, \
    keeps a local backup of every submission, and retries unconfirmed submissions on \
    the next start.\n\n\
    Optional parameters:\n\
    --data-dir <PATH>      Override the directory for the backup store, preferences and log file\n\
    --endpoint <URL>       Override the form-collection endpoint URL\n\
    Use -h or --help to see all options."
)]
struct Args {
    /// Directory for the backup store, preferences and log file
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Form-collection endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Seconds before a submission attempt is abandoned
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

/// Completions reported back to the UI loop from spawned tasks.
enum AppEvent {
    SubmissionFinished(SubmitOutcome),
    NewsletterFinished { email: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine the log file path based on --data-dir
    let log_file_path = match &args.data_dir {
        Some(dir) => {
            if !dir.exists() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    eprintln!(
                        "Warning: Failed to create data directory {}: {}. Log file might not be created.",
                        dir.display(),
                        e
                    );
                    PathBuf::from("outreach.log")
                } else {
                    dir.join("outreach.log")
                }
            } else {
                dir.join("outreach.log")
            }
        }
        None => PathBuf::from("outreach.log"),
    };

    utils::setup_logging(log_file_path.to_str(), LevelFilter::Debug)?;

    info!("Outreach contact form client starting up");
    info!(
        "System information: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    info!("Logging to file: {}", log_file_path.display());

    // Wire the dependencies explicitly; everything downstream receives its
    // collaborators through constructors.
    let store = match &args.data_dir {
        Some(dir) => BackupStore::in_dir(dir)?,
        None => BackupStore::new(None)?,
    };
    info!("Backup store at {}", store.path().display());

    let theme_manager = match &args.data_dir {
        Some(dir) => ThemeManager::in_dir(dir)?,
        None => ThemeManager::new(None)?,
    };

    let endpoint = match &args.endpoint {
        Some(url) => FormEndpoint::with_url(url),
        None => FormEndpoint::default(),
    };
    info!("Form endpoint: {}", endpoint.url);

    let gateway = Arc::new(HttpGateway::new(endpoint, args.timeout_secs));
    let controller = Arc::new(FormController::new(gateway, store));

    // Retry pass over unconfirmed submissions from earlier sessions, before
    // the terminal is taken over.
    println!("Checking for unconfirmed submissions... please wait...\n");
    let report = controller.retry_unconfirmed().await;
    let startup_toast = if report.attempted > 0 {
        info!(
            "Startup retry: {} of {} unconfirmed submission(s) delivered",
            report.delivered, report.attempted
        );
        if report.delivered == report.attempted {
            Some(ToastMessage::new(
                &format!(
                    "Recovered {} unsent submission(s) from a previous session",
                    report.delivered
                ),
                Severity::Success,
            ))
        } else {
            Some(ToastMessage::new(
                &format!(
                    "{} of {} unsent submission(s) recovered; the rest will be retried next time",
                    report.delivered, report.attempted
                ),
                Severity::Warning,
            ))
        }
    } else {
        None
    };

    let theme = theme_manager.load().unwrap_or_else(|e| {
        error!("Could not load theme preference: {}", e);
        outreach::theme::Theme::Light
    });

    let mut terminal = ui::setup_terminal()?;
    let mut form_ui = FormUI::new(theme);

    if let Some(toast) = startup_toast {
        form_ui.show_toast(toast);
    }

    // Draw UI early
    terminal.draw(|f| form_ui.draw(f))?;

    run_main_loop(&mut form_ui, &mut terminal, controller, theme_manager).await?;

    ui::restore_terminal(terminal)?;

    println!("Contact form session ended.");
    Ok(())
}

/// Run the main event loop
async fn run_main_loop(
    form_ui: &mut FormUI,
    terminal: &mut ui::Terminal<ui::CrosstermBackend<io::Stdout>>,
    controller: Arc<FormController>,
    theme_manager: ThemeManager,
) -> Result<()> {
    // Channel for completions coming back from spawned tasks
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    loop {
        // Draw the UI
        terminal.draw(|f| form_ui.draw(f))?;

        // Expire toasts and the success banner, advance confetti
        form_ui.tick();

        // Handle user input
        let input_result = form_ui.handle_input()?;

        match input_result {
            Some(UiEvent::Quit) => break,
            Some(UiEvent::ToggleTheme) => match theme_manager.toggle() {
                Ok(theme) => {
                    form_ui.set_theme(theme);
                    form_ui.show_toast(ToastMessage::new(
                        &format!("Switched to {} mode", theme.name()),
                        Severity::Info,
                    ));
                }
                Err(e) => {
                    error!("Failed to persist theme change: {}", e);
                    form_ui.show_toast(ToastMessage::new(
                        "Could not save theme preference",
                        Severity::Error,
                    ));
                }
            },
            Some(UiEvent::Submit {
                name,
                email,
                message,
            }) => {
                if form_ui.is_submitting() {
                    // The control is disabled; a queued Enter changes nothing
                    debug!("Ignoring submit while a submission is in flight");
                } else {
                    form_ui.set_submitting(true);

                    let controller = Arc::clone(&controller);
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = controller.submit(&name, &email, &message).await;
                        if let Err(e) = tx.send(AppEvent::SubmissionFinished(outcome)).await {
                            error!("Failed to report submission completion: {}", e);
                        }
                    });
                }
            }
            Some(UiEvent::SubscribeNewsletter { email }) => {
                info!("Newsletter signup requested for {}", email);
                let tx = tx.clone();
                tokio::spawn(async move {
                    // There is no newsletter backend; simulate the call
                    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
                    if let Err(e) = tx.send(AppEvent::NewsletterFinished { email }).await {
                        error!("Failed to report newsletter completion: {}", e);
                    }
                });
            }
            None => {}
        }

        // Check for completions from spawned tasks
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::SubmissionFinished(outcome) => {
                    form_ui.set_submitting(false);
                    match outcome {
                        SubmitOutcome::Delivered(submission) => {
                            info!("Submission {} confirmed in the UI", submission.id);
                            form_ui.submission_succeeded();
                            form_ui.show_toast(ToastMessage::new(
                                "Message sent successfully! I'll respond within 24 hours.",
                                Severity::Success,
                            ));
                        }
                        SubmitOutcome::Failed { submission, reason } => {
                            error!("Submission {} failed: {}", submission.id, reason);
                            // Keep the entered values for a manual retry
                            form_ui.show_toast(ToastMessage::new(
                                "Failed to send message. Please try again.",
                                Severity::Error,
                            ));
                        }
                        SubmitOutcome::Rejected(errors) => {
                            form_ui.apply_field_errors(&errors);
                            form_ui.show_toast(ToastMessage::new(
                                "Please correct the errors in the form.",
                                Severity::Error,
                            ));
                        }
                        SubmitOutcome::AlreadyInFlight => {
                            // The UI guard should make this unreachable
                            debug!("Controller reported an already in-flight submission");
                        }
                    }
                }
                AppEvent::NewsletterFinished { email } => {
                    info!("Newsletter signup completed for {}", email);
                    form_ui.newsletter_finished();
                    form_ui.show_toast(ToastMessage::new(
                        "Successfully subscribed to newsletter!",
                        Severity::Success,
                    ));
                }
            }
        }
    }

    Ok(())
}
