//! Vega - an unattended Gmail auto-responder
//!
//! Authorizes once against Gmail via the OAuth2 consent flow, then
//! polls forever: reply to every unread message with a fixed template
//! and mark it read, sleeping a randomized 45-120 second interval
//! between passes.

use anyhow::Result;
use log::{error, info, warn};
use mail::{GmailAuth, GmailClient, GmailCredentials, ResponderSettings, run_loop};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

mod bootstrap;
mod starter;

use bootstrap::CallbackServer;
use starter::SchedulerStarter;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = ResponderSettings::load()?;

    // Load Gmail credentials from config file or environment
    let creds = match GmailCredentials::load() {
        Ok(creds) => creds,
        Err(e) => {
            if let Some(path) = GmailCredentials::default_credentials_path() {
                warn!(
                    "To configure Gmail access, either:\n\
                     1. Place your Google OAuth credentials at: {}\n\
                     2. Or set environment variables: GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET",
                    path.display()
                );
            }
            return Err(e);
        }
    };

    let auth = Arc::new(GmailAuth::new(
        creds.client_id,
        creds.client_secret,
        settings.redirect_uri(),
    ));

    // The operator-facing instruction to begin authorization
    let auth_url = auth.authorization_url();
    info!("Open this URL in your browser to sign in: {auth_url}");
    if let Err(e) = open::that(&auth_url) {
        warn!("Failed to open browser: {}. Please open the URL manually.", e);
    }

    let server = CallbackServer::bind(settings.listen_port)?;
    info!("App listening at http://localhost:{}", settings.listen_port);

    // Held for the life of the process so the scheduler thread keeps
    // running; dropping the sender would stop the poll loop
    let (_shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    // A duplicate browser callback must never spawn a second loop
    let starter = SchedulerStarter::new(shutdown_rx);

    server.run(&auth, || {
        starter.start_once(|shutdown| {
            start_scheduler(auth.clone(), settings.reply_body.clone(), shutdown)
        });
    });

    Ok(())
}

/// Spawn the poll scheduler on its own thread
fn start_scheduler(auth: Arc<GmailAuth>, reply_body: String, shutdown: Receiver<()>) {
    std::thread::spawn(move || {
        info!("Starting email processing loop");
        let client = GmailClient::new(auth);
        run_loop(&client, &reply_body, &shutdown);
    });
}
