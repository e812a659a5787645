//! Watching an environment until it reaches a terminal state.
//!
//! The watcher only observes remote state: the action being watched was submitted before the
//! watch started, so stopping the watch (interrupt, timeout, failed poll) never affects it.
use std::time::Duration;

use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::{
    dependencies::{ApiError, Clock, EnvironmentStatusGetter},
    error::CommandError,
    interaction::{StateObservation, WatchReporter},
    models::EnvironmentState,
};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct WatchOptions {
    /// Time between two status polls.
    #[builder(default = DEFAULT_WATCH_INTERVAL)]
    pub interval: Duration,
    /// Give up once the time spent waiting between polls reaches this duration.
    #[builder(default, setter(strip_option(fallback = timeout_opt)))]
    pub timeout: Option<Duration>,
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to get the state of environment '{environment_id}' while watching: {source}")]
    Status {
        environment_id: String,
        #[source]
        source: ApiError,
    },
    #[error(
        "stopped watching environment '{environment_id}', the deploy request was already submitted"
    )]
    Interrupted { environment_id: String },
    #[error("environment '{environment_id}' did not reach a terminal state within {timeout:?}")]
    TimedOut {
        environment_id: String,
        timeout: Duration,
    },
}

/// Result of a watch that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOutcome {
    /// The terminal state.
    pub state: EnvironmentState,
    /// Every polled state, in order. The last one is `state`.
    pub observed: Vec<EnvironmentState>,
}

/// Polls an environment until it settles.
pub struct DeployWatcher<'a, S: ?Sized, C: ?Sized, R: ?Sized> {
    status_getter: &'a S,
    clock: &'a C,
    reporter: &'a R,
    options: WatchOptions,
}

impl<'a, S, C, R> DeployWatcher<'a, S, C, R>
where
    S: EnvironmentStatusGetter + Sync + ?Sized,
    C: Clock + Sync + ?Sized,
    R: WatchReporter + Sync + ?Sized,
{
    pub fn new(status_getter: &'a S, clock: &'a C, reporter: &'a R, options: WatchOptions) -> Self {
        Self {
            status_getter,
            clock,
            reporter,
            options,
        }
    }

    /// Poll until the environment is in a terminal state and return that state.
    ///
    /// A failed poll ends the watch, it is not retried. An interrupt ends it at any point,
    /// including while a status request is in flight.
    pub async fn watch(
        &self,
        resource_id: &str,
        environment_id: &str,
    ) -> Result<WatchOutcome, WatchError> {
        let interrupted = self.clock.interrupted();

        tokio::select! {
            biased;
            () = interrupted => {
                info!(resource_id, environment_id, "watch interrupted");
                Err(WatchError::Interrupted {
                    environment_id: environment_id.to_string(),
                })
            }
            outcome = self.poll_until_terminal(resource_id, environment_id) => outcome,
        }
    }

    async fn poll_until_terminal(
        &self,
        resource_id: &str,
        environment_id: &str,
    ) -> Result<WatchOutcome, WatchError> {
        let mut observed: Vec<EnvironmentState> = Vec::new();
        let mut waited = Duration::ZERO;

        loop {
            let state = self
                .status_getter
                .get_environment_state(environment_id)
                .await
                .map_err(|source| WatchError::Status {
                    environment_id: environment_id.to_string(),
                    source,
                })?;

            let changed = observed.last() != Some(&state);
            observed.push(state.clone());

            debug!(resource_id, environment_id, %state, poll = observed.len(), "polled environment state");

            self.reporter.report(&StateObservation {
                poll: observed.len(),
                resource_id: resource_id.to_string(),
                environment_id: environment_id.to_string(),
                state: state.clone(),
                changed,
            });

            if state.is_terminal() {
                info!(resource_id, environment_id, %state, "environment reached a terminal state");
                return Ok(WatchOutcome { state, observed });
            }

            if let Some(timeout) = self.options.timeout {
                if waited >= timeout {
                    return Err(WatchError::TimedOut {
                        environment_id: environment_id.to_string(),
                        timeout,
                    });
                }
            }

            self.clock.sleep(self.options.interval).await;
            waited += self.options.interval;
        }
    }
}

/// Fail with [`CommandError::Busy`] unless the environment is in a terminal state.
///
/// This is a check-then-act guard: another request can still be queued between this check and
/// the caller's action.
pub async fn assert_terminal<S>(
    status_getter: &S,
    environment_id: &str,
) -> Result<EnvironmentState, CommandError>
where
    S: EnvironmentStatusGetter + Sync + ?Sized,
{
    let state = status_getter
        .get_environment_state(environment_id)
        .await
        .map_err(|e| CommandError::Network(e.into()))?;

    debug!(environment_id, %state, "checked environment state");

    if !state.is_terminal() {
        return Err(CommandError::Busy {
            environment_id: environment_id.to_string(),
        });
    }

    Ok(state)
}
