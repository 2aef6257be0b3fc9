//! Watch session actor - owns the timers and listener for one payment reference

use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::WatchConfig;
use crate::deeplink::{LinkClassifier, LinkSignal};
use crate::messages::{CheckTrigger, LifecycleEvent, Outcome, TimeoutInfo, TimeoutReason};
use crate::models::StatusReport;
use crate::network::StatusSource;
use crate::platform::LifecycleSubscription;
use crate::watcher::callbacks::CallbackSlot;
use crate::watcher::state::{Progress, WatchState};

/// How the poll loop ended
enum Exit {
    Finished(Outcome),
    Stopped,
}

/// What a lifecycle event asks the session to do
enum Reaction {
    Check(CheckTrigger),
    Fail(StatusReport),
    Ignore,
}

/// One watch session, run as a spawned task
pub(crate) struct WatchSession {
    pub(crate) reference: String,
    pub(crate) config: WatchConfig,
    pub(crate) source: Arc<dyn StatusSource>,
    pub(crate) classifier: LinkClassifier,
    pub(crate) progress: Arc<watch::Sender<Progress>>,
}

impl WatchSession {
    /// Run until an outcome or cancellation. The subscription is released
    /// before the state is published and before the callback runs. The
    /// terminal state and the callback are skipped if `stop` revoked them.
    pub(crate) async fn run(
        self,
        subscription: Option<LifecycleSubscription>,
        cancel_rx: oneshot::Receiver<()>,
        callbacks: CallbackSlot,
    ) {
        let started = Instant::now();
        let exit = self.poll(subscription, cancel_rx, started).await;

        match exit {
            Exit::Stopped => {
                tracing::info!(reference = %self.reference, "Payment watch stopped");
                self.progress.send_modify(|p| {
                    if !p.state.is_terminal() {
                        p.state = WatchState::Idle;
                    }
                });
            }
            Exit::Finished(outcome) => {
                let state = WatchState::from(&outcome);
                tracing::info!(
                    reference = %self.reference,
                    state = ?state,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Payment watch finished"
                );
                let progress = &self.progress;
                let delivered = callbacks.deliver(outcome, || {
                    progress.send_modify(|p| p.state = state);
                });
                if !delivered {
                    tracing::debug!(reference = %self.reference, "Outcome dropped after stop");
                }
            }
        }
    }

    async fn poll(
        &self,
        mut subscription: Option<LifecycleSubscription>,
        mut cancel_rx: oneshot::Receiver<()>,
        started: Instant,
    ) -> Exit {
        let deadline = tokio::time::sleep(self.config.timeout);
        tokio::pin!(deadline);

        let period = self.config.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut attempts = 0u32;
        let mut trigger = Some(CheckTrigger::Initial);

        loop {
            if let Some(cause) = trigger.take() {
                attempts += 1;
                self.progress.send_modify(|p| p.attempts = attempts);
                tracing::debug!(
                    reference = %self.reference,
                    attempt = attempts,
                    trigger = cause.as_str(),
                    "Checking payment status"
                );

                let result = tokio::select! {
                    biased;

                    _ = &mut cancel_rx => return Exit::Stopped,
                    _ = &mut deadline => {
                        return self.timed_out(attempts, started, TimeoutReason::DeadlineElapsed);
                    }
                    result = self.source.check(&self.reference) => result,
                };

                match result {
                    Ok(report) if report.status.is_success() => {
                        return Exit::Finished(Outcome::Succeeded(report));
                    }
                    Ok(report) if report.status.is_failure() => {
                        return Exit::Finished(Outcome::Failed(report));
                    }
                    Ok(report) => {
                        tracing::debug!(
                            reference = %self.reference,
                            status = report.status.as_str(),
                            "Payment not settled yet"
                        );
                    }
                    Err(e) if e.is_transient() => {
                        tracing::debug!(
                            reference = %self.reference,
                            error = %e,
                            "Status check failed"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            reference = %self.reference,
                            error = %e,
                            "Status check failed"
                        );
                    }
                }

                if attempts >= self.config.max_attempts {
                    return self.timed_out(attempts, started, TimeoutReason::AttemptsExhausted);
                }

                // out-of-band checks push the next scheduled one back
                if matches!(cause, CheckTrigger::Resumed | CheckTrigger::UrlOpened) {
                    ticker.reset();
                }
            }

            trigger = tokio::select! {
                biased;

                _ = &mut cancel_rx => return Exit::Stopped,
                _ = &mut deadline => {
                    return self.timed_out(attempts, started, TimeoutReason::DeadlineElapsed);
                }
                _ = ticker.tick() => Some(CheckTrigger::Interval),
                event = next_event(&mut subscription) => match self.react(event) {
                    Reaction::Check(cause) => Some(cause),
                    Reaction::Fail(report) => {
                        tracing::info!(
                            reference = %self.reference,
                            "Deep link reported payment failure"
                        );
                        return Exit::Finished(Outcome::Failed(report));
                    }
                    Reaction::Ignore => None,
                },
            };
        }
    }

    fn react(&self, event: LifecycleEvent) -> Reaction {
        let cause = match event {
            LifecycleEvent::Resumed { .. } => CheckTrigger::Resumed,
            LifecycleEvent::UrlOpened { .. } => CheckTrigger::UrlOpened,
        };
        let Some(url) = event.url() else {
            return Reaction::Check(cause);
        };

        match self.classifier.classify(url, &self.reference) {
            LinkSignal::Fail(report) => Reaction::Fail(report),
            LinkSignal::CheckNow => Reaction::Check(cause),
            // being back in the foreground is reason enough to look
            LinkSignal::Ignore if cause == CheckTrigger::Resumed => Reaction::Check(cause),
            LinkSignal::Ignore => {
                tracing::debug!(reference = %self.reference, %url, "Ignoring unrelated deep link");
                Reaction::Ignore
            }
        }
    }

    fn timed_out(&self, attempts: u32, started: Instant, reason: TimeoutReason) -> Exit {
        Exit::Finished(Outcome::TimedOut(TimeoutInfo {
            reference: self.reference.clone(),
            attempts,
            elapsed: started.elapsed(),
            reason,
        }))
    }
}

/// Next lifecycle event; never resolves when there is no listener
async fn next_event(subscription: &mut Option<LifecycleSubscription>) -> LifecycleEvent {
    if let Some(sub) = subscription.as_mut() {
        if let Some(event) = sub.recv().await {
            return event;
        }
    }
    std::future::pending().await
}
