//! Runs a [`CountdownTimer`] on the tokio clock.
//!
//! The countdown is owned by a spawned task. Callers get a [`TimerHandle`]
//! for control messages and state snapshots, and a [`TimerEvents`] stream.

use std::time::Duration;

use exam_core::timer::{CountdownTimer, TimerEvent, TimerState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Requests the session side may send to a running countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerControl {
    Pause,
    Resume,
    Stop,
}

/// Control side of a running countdown.
#[derive(Debug)]
pub struct TimerHandle {
    control: mpsc::UnboundedSender<TimerControl>,
    state: watch::Receiver<TimerState>,
    task: JoinHandle<()>,
}

/// Event side of a running countdown. Ends after `Expired` or a stop.
///
/// Dropping it does not stop the countdown; only the events are lost.
#[derive(Debug)]
#[must_use = "expiry and warnings are only delivered through the event stream"]
pub struct TimerEvents {
    rx: mpsc::UnboundedReceiver<TimerEvent>,
}

impl TimerEvents {
    pub async fn recv(&mut self) -> Option<TimerEvent> {
        self.rx.recv().await
    }
}

/// Start ticking `timer` once per second on the current runtime.
#[must_use]
pub fn spawn(timer: CountdownTimer) -> (TimerHandle, TimerEvents) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(timer.state());

    let task = tokio::spawn(run(timer, control_rx, event_tx, state_tx));
    (
        TimerHandle {
            control: control_tx,
            state: state_rx,
            task,
        },
        TimerEvents { rx: event_rx },
    )
}

impl TimerHandle {
    pub fn pause(&self) {
        self.send(TimerControl::Pause);
    }

    pub fn resume(&self) {
        self.send(TimerControl::Resume);
    }

    pub fn stop(&self) {
        self.send(TimerControl::Stop);
    }

    /// Latest snapshot published by the countdown.
    #[must_use]
    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    /// True until the countdown task has exited.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the countdown and wait for its task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Err(err) = (&mut self.task).await {
            if !err.is_cancelled() {
                tracing::warn!("timer task ended abnormally: {err}");
            }
        }
    }

    fn send(&self, control: TimerControl) {
        // The task is gone once the countdown expired; late requests are moot.
        let _ = self.control.send(control);
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut timer: CountdownTimer,
    mut control: mpsc::UnboundedReceiver<TimerControl>,
    events: mpsc::UnboundedSender<TimerEvent>,
    state: watch::Sender<TimerState>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    for event in timer.begin() {
        publish(&events, event);
    }

    loop {
        tokio::select! {
            _ = interval.tick(), if !timer.is_paused() => {
                let fired = timer.tick();
                state.send_replace(timer.state());
                for event in fired {
                    publish(&events, event);
                }
                if timer.is_expired() {
                    tracing::debug!("countdown expired");
                    return;
                }
            }
            request = control.recv() => match request {
                Some(TimerControl::Pause) => {
                    timer.pause();
                    state.send_replace(timer.state());
                }
                Some(TimerControl::Resume) => {
                    if timer.is_paused() {
                        timer.resume();
                        interval.reset();
                        state.send_replace(timer.state());
                    }
                }
                Some(TimerControl::Stop) | None => {
                    timer.stop();
                    state.send_replace(timer.state());
                    tracing::debug!(remaining = timer.remaining_secs(), "countdown stopped");
                    return;
                }
            },
        }
    }
}

/// The countdown keeps running without a listener.
fn publish(events: &mpsc::UnboundedSender<TimerEvent>, event: TimerEvent) {
    if let Err(mpsc::error::SendError(event)) = events.send(event) {
        tracing::trace!(?event, "timer event dropped, no receiver");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(events: &mut TimerEvents) -> Vec<TimerEvent> {
        let mut out = Vec::new();
        while let Some(event) = events.recv().await {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn one_minute_countdown_expires_once() {
        let timer = CountdownTimer::new(1, &[30]).unwrap();
        let (handle, mut events) = spawn(timer);

        let all = drain(&mut events).await;
        let ticks = all
            .iter()
            .filter(|e| matches!(e, TimerEvent::Tick(_)))
            .count();
        assert_eq!(ticks, 60);
        assert_eq!(
            all.iter().filter(|e| **e == TimerEvent::Expired).count(),
            1
        );
        assert!(all.contains(&TimerEvent::Warning { mark: 30 }));
        assert_eq!(all.last(), Some(&TimerEvent::Expired));
        assert_eq!(handle.state().remaining_secs, 0);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_remaining_time() {
        let timer = CountdownTimer::new(1, &[]).unwrap();
        let (handle, mut events) = spawn(timer);

        for _ in 0..10 {
            events.recv().await;
        }
        handle.pause();
        tokio::time::sleep(Duration::from_secs(30)).await;
        let paused = handle.state();
        assert!(paused.is_paused);
        assert_eq!(paused.remaining_secs, 50);

        handle.resume();
        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(handle.state().remaining_secs, 45);
        assert!(!handle.state().is_paused);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_survives_a_dropped_event_stream() {
        let timer = CountdownTimer::new(1, &[30]).unwrap();
        let (handle, events) = spawn(timer);
        drop(events);

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert!(handle.is_running());
        assert_eq!(handle.state().remaining_secs, 30);

        tokio::time::sleep(Duration::from_secs(40)).await;
        assert_eq!(handle.state().remaining_secs, 0);
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn full_duration_mark_is_announced_before_the_first_tick() {
        let timer = CountdownTimer::new(5, &[300, 120]).unwrap();
        let (handle, mut events) = spawn(timer);

        assert_eq!(events.recv().await, Some(TimerEvent::Warning { mark: 300 }));
        assert!(matches!(events.recv().await, Some(TimerEvent::Tick(state)) if state.remaining_secs == 299));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_the_task() {
        let timer = CountdownTimer::new(5, &[]).unwrap();
        let (handle, mut events) = spawn(timer);
        events.recv().await;

        handle.stop();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!handle.is_running());
        assert_eq!(handle.state().remaining_secs, 299);
        assert!(events.recv().await.is_none());
    }
}
