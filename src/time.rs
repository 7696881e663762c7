//! Frame clock.
//!
//! [`Clock`] tracks the delta and elapsed time between external frame ticks.
//! It is a plain value: whatever drives the frame loop owns it, calls
//! [`Clock::tick`] once per frame and hands it to
//! [`World::advance`](crate::World::advance).
//!
//! # Examples
//!
//! ```
//! use sparse_ecs::time::Clock;
//! use std::time::Duration;
//!
//! let mut clock = Clock::new();
//! clock.start();
//!
//! // In your frame loop:
//! clock.tick_with(Duration::from_millis(16));
//! assert_eq!(clock.delta(), Duration::from_millis(16));
//! ```

use std::time::{Duration, Instant};

use crate::event::{ClockEvent, ClockEventKind};
use crate::event_bus::{EventRegistry, Listener, ListenerId};

/// Delta/elapsed time source for the world tick
#[derive(Debug)]
pub struct Clock {
    running: bool,
    /// Time between the last two ticks (zero while stopped)
    delta: Duration,
    /// Sum of deltas since `start`
    elapsed: Duration,
    frame_count: u64,
    last_tick: Option<Instant>,
    events: EventRegistry<ClockEvent>,
}

impl Clock {
    /// Create a stopped clock
    pub fn new() -> Self {
        Self {
            running: false,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            last_tick: None,
            events: EventRegistry::new(),
        }
    }

    /// Reset delta/elapsed and start measuring
    pub fn start(&mut self) {
        self.last_tick = Some(Instant::now());
        self.delta = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.running = true;
    }

    /// Stop measuring. Later ticks report a zero delta.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    /// Advance one frame using the wall clock and emit `update`
    pub fn tick(&mut self) -> Duration {
        let delta = match (self.running, self.last_tick) {
            (true, Some(last)) => {
                let now = Instant::now();
                self.last_tick = Some(now);
                now.duration_since(last)
            }
            _ => Duration::ZERO,
        };
        self.advance(delta)
    }

    /// Advance one frame by a fixed `delta` (ignored while stopped)
    pub fn tick_with(&mut self, delta: Duration) -> Duration {
        let delta = if self.running { delta } else { Duration::ZERO };
        self.advance(delta)
    }

    fn advance(&mut self, delta: Duration) -> Duration {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.events.emit(&ClockEvent::Update {
            delta,
            elapsed: self.elapsed,
        });
        delta
    }

    /// Get delta time (time since last frame)
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time since `start`
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Ticks since creation, running or not
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on(&mut self, kind: ClockEventKind, callback: Listener<ClockEvent>) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(&mut self, kind: ClockEventKind, callback: Listener<ClockEvent>) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&mut self, kind: ClockEventKind, callback: &Listener<ClockEvent>) -> bool {
        self.events.off(kind, callback)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
