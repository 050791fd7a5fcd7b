use std::future::Future;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

pub type Generation = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate<T> {
    pub generation: Generation,
    pub result: Result<T, String>,
}

pub struct PollTask {
    generation: Generation,
    _guard: DropGuard,
}

impl PollTask {
    pub fn spawn<T, F, Fut>(
        generation: Generation,
        period: Option<Duration>,
        tx: mpsc::UnboundedSender<PollUpdate<T>>,
        fetch: F,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut ticker = period.map(|period| {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });

            loop {
                if let Some(ticker) = ticker.as_mut() {
                    tokio::select! {
                        _ = cancelled.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                }

                let result = tokio::select! {
                    _ = cancelled.cancelled() => break,
                    result = fetch() => result,
                };
                if tx.send(PollUpdate { generation, result }).is_err() {
                    break;
                }
                if ticker.is_none() {
                    break;
                }
            }
            debug!(generation, "poll task finished");
        });

        Self {
            generation,
            _guard: token.drop_guard(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}
