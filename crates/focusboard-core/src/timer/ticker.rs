//! Background driver that calls [`TimerEngine::tick`] once per second.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use super::engine::{Completion, TimerEngine};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Tick `engine` every `interval` until `shutdown` flips to `true` or its
/// sender is dropped. Each completion is passed to `on_completion`.
pub async fn run<F>(
    engine: Arc<Mutex<TimerEngine>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut on_completion: F,
) where
    F: FnMut(&Completion) + Send,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let completions = drain(&engine);
                for completion in &completions {
                    on_completion(completion);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::debug!("ticker stopped");
                    return;
                }
            }
        }
    }
}

/// Lock the shared engine and tick it until nothing more completes.
pub fn drain(engine: &Mutex<TimerEngine>) -> Vec<Completion> {
    engine
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .tick_until_idle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Item, MemoryBoardStore};
    use crate::clock::ManualClock;
    use crate::session::TimerMode;
    use crate::storage::Settings;

    fn engine(clock: &ManualClock) -> TimerEngine {
        let store = MemoryBoardStore::new(vec![Board::new(
            "b.md",
            "B",
            vec![Item::new("card", "Card")],
        )]);
        TimerEngine::new(store, Settings::default()).with_clock(clock.clone())
    }

    #[test]
    fn drain_closes_pomodoro_and_break() {
        let clock = ManualClock::new(0);
        let engine = Mutex::new(engine(&clock));
        engine
            .lock()
            .unwrap()
            .start(TimerMode::Pomodoro, Some("card".into()))
            .unwrap();
        clock.advance_ms(40 * 60_000);
        let done = drain(&engine);
        assert_eq!(done.len(), 2);
        assert!(matches!(done[1], Completion::Break { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_shutdown() {
        let clock = ManualClock::new(0);
        let engine = Arc::new(Mutex::new(engine(&clock)));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run(engine, TICK_INTERVAL, rx, |_| {}));
        tokio::time::sleep(Duration::from_secs(3)).await;
        tx.send(true).unwrap();
        task.await.unwrap();
    }
}
