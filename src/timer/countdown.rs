use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver},
    task::JoinHandle,
    time::{self, Duration},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Stopped,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Expired => "expired",
            TimerState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// One decrement per elapsed second, carrying the seconds left.
    Tick(u32),
    /// Fired exactly once when the count reaches zero.
    Expired,
}

/// One-second countdown clock. At most one clock runs at a time; `start`
/// while running is a no-op and `stop` is idempotent. Once stopped, the
/// spawned task may not deliver any further event.
pub struct CountdownTimer {
    state: Arc<Mutex<TimerState>>,
    cancelled: Option<Arc<AtomicBool>>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::Idle)),
            cancelled: None,
            task: None,
        }
    }

    pub fn state(&self) -> TimerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start(&mut self, initial_seconds: u32) -> Option<UnboundedReceiver<TimerEvent>> {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state == TimerState::Running {
                debug!("Countdown already running, ignoring start");
                return None;
            }
            *state = TimerState::Running;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.cancelled = Some(Arc::clone(&cancelled));
        let state = Arc::clone(&self.state);

        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            // The first tick completes immediately, consume it.
            interval.tick().await;

            let mut remaining = initial_seconds;
            while remaining > 0 {
                interval.tick().await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                remaining -= 1;
                if tx.send(TimerEvent::Tick(remaining)).is_err() {
                    return;
                }
            }

            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            *state.lock().unwrap_or_else(|e| e.into_inner()) = TimerState::Expired;
            let _ = tx.send(TimerEvent::Expired);
        }));

        Some(rx)
    }

    pub fn stop(&mut self) {
        if let Some(cancelled) = self.cancelled.take() {
            cancelled.store(true, Ordering::SeqCst);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == TimerState::Running {
            *state = TimerState::Stopped;
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CountdownTimer {
    // Teardown must not leave a clock running.
    fn drop(&mut self) {
        self.stop();
    }
}
