//! Browser-delegated device authorization flow.
//!
//! One login attempt requests a device grant, shows the verification URL
//! and user code (interactive mode only), then polls the token endpoint
//! until the user approves the sign-in or the grant's window elapses. The
//! expected "authorization pending" responses back off exponentially;
//! unexpected poll failures are warned about and retried at the current
//! interval. A successful poll persists the session before returning.

use crate::api::DeviceAuthApi;
use crate::api::types::{DeviceGrant, TokenGrant};
use crate::auth::session::SessionStore;
use crate::error::AuthError;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Poll interval ceiling once backoff kicks in.
const MAX_POLL_INTERVAL_SECS: f64 = 30.0;

/// Backoff multiplier applied on each authorization-pending response.
const BACKOFF_FACTOR: f64 = 1.5;

/// Interval used when the server does not suggest one.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// How a login attempt announces itself.
///
/// `Interactive` prints the verification URL, copies the user code to the
/// clipboard, opens the browser, and shows a spinner while polling.
/// `Background` runs the same handshake with no output at all; used by the
/// session guard for pre-request refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Interactive,
    Background,
}

impl LoginMode {
    fn interactive(self) -> bool {
        matches!(self, LoginMode::Interactive)
    }
}

fn next_interval(current: f64) -> f64 {
    (current * BACKOFF_FACTOR).min(MAX_POLL_INTERVAL_SECS)
}

/// Spinner shown while waiting for the user to approve the sign-in.
///
/// Holding the bar in a guard means every exit path out of the polling
/// loop, including error returns, stops the steady-tick timer.
struct PollSpinner(Option<ProgressBar>);

impl PollSpinner {
    fn start(mode: LoginMode) -> Self {
        if !mode.interactive() {
            return Self(None);
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner());
        bar.set_message("Waiting for sign-in to complete...");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self(Some(bar))
    }

    fn warn(&self, msg: String) {
        match &self.0 {
            Some(bar) => bar.suspend(|| eprintln!("{}", msg)),
            None => eprintln!("{}", msg),
        }
    }
}

impl Drop for PollSpinner {
    fn drop(&mut self) {
        if let Some(bar) = self.0.take() {
            bar.finish_and_clear();
        }
    }
}

/// Show the verification URL and user code, copy the code to the clipboard
/// and open the browser. Clipboard and browser failures are cosmetic and
/// never alter the flow.
fn announce(grant: &DeviceGrant) {
    println!();
    println!("To sign in, visit:\n\n  {}\n", grant.verification_uri);
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(grant.user_code.clone())) {
        Ok(()) => println!("and enter the code: {}  (copied to clipboard)", grant.user_code),
        Err(e) => {
            tracing::debug!("Clipboard unavailable: {}", e);
            println!("and enter the code: {}", grant.user_code);
        }
    }
    println!();

    if let Err(e) = webbrowser::open(&grant.verification_uri) {
        tracing::warn!(
            "Failed to open browser automatically: {}. Use the link above.",
            e
        );
    }
}

enum PollOutcome {
    Token(TokenGrant),
    TimedOut,
}

/// Run the device login flow to completion.
///
/// Interactive mode returns `Ok(false)` on timeout after printing a
/// message; only the initial grant request surfaces as an error. Background
/// mode surfaces every failure as an error so the caller decides how loudly
/// to report it.
pub async fn run_login<G: DeviceAuthApi>(
    gateway: &G,
    store: &SessionStore,
    mode: LoginMode,
) -> Result<bool, AuthError> {
    let grant = gateway.request_device_grant().await?;
    tracing::debug!(
        "Device grant obtained, window {}s, suggested interval {:?}s",
        grant.expires_in,
        grant.interval
    );

    if mode.interactive() {
        announce(&grant);
    }

    let deadline = Instant::now() + Duration::from_secs(grant.expires_in);
    let mut interval = grant.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS) as f64;
    let mut attempt: u32 = 0;

    let spinner = PollSpinner::start(mode);

    let outcome = loop {
        sleep(Duration::from_secs_f64(interval)).await;
        // The grant may have lapsed during the sleep; never poll a dead one.
        if Instant::now() >= deadline {
            break PollOutcome::TimedOut;
        }

        attempt += 1;
        match gateway.poll_for_token(&grant.device_code).await {
            Ok(token) => break PollOutcome::Token(token),
            Err(AuthError::AuthorizationPending) => {
                // The expected steady state while the user finishes in the
                // browser. Back off silently.
                interval = next_interval(interval);
                tracing::trace!("Authorization pending, next poll in {:.1}s", interval);
            }
            Err(e) => {
                // Unexpected, but worth retrying at the current interval.
                if mode.interactive() {
                    spinner.warn(format!("Poll attempt {} failed: {}; retrying", attempt, e));
                } else {
                    tracing::debug!(
                        "Poll attempt {} failed during background refresh: {}",
                        attempt,
                        e
                    );
                }
            }
        }
    };
    drop(spinner);

    match outcome {
        PollOutcome::Token(token) => {
            store.store_session(&token.token, token.user)?;
            tracing::info!("Signed in successfully");
            Ok(true)
        }
        PollOutcome::TimedOut => match mode {
            LoginMode::Interactive => {
                eprintln!("Sign-in timed out before it was approved. Run 'taskhub login' to try again.");
                Ok(false)
            }
            LoginMode::Background => Err(AuthError::TimedOut),
        },
    }
}
