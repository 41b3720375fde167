//! One-shot timers for the start-up debounce barrier
//!
//! The engine never owns a clock. It asks a scheduler for a timer and the
//! host hands the resulting [`TimerEvent`] back on the engine's thread.

use crossbeam_channel::{after, Receiver};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Timer events delivered back to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    StartupElapsed,
}

/// Requests one-shot timers
pub trait StartupScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent);
}

/// A requested timer: `fires` yields once when the delay has passed
#[derive(Debug)]
pub struct ArmedTimer {
    pub fires: Receiver<Instant>,
    pub event: TimerEvent,
}

/// Arms `crossbeam_channel::after` timers for a host that selects on them
pub struct ChannelScheduler {
    armed: Rc<RefCell<VecDeque<ArmedTimer>>>,
}

/// Host side of a [`ChannelScheduler`], in request order
#[derive(Clone)]
pub struct TimerQueue {
    armed: Rc<RefCell<VecDeque<ArmedTimer>>>,
}

impl ChannelScheduler {
    /// Scheduler plus the queue the host should poll
    pub fn channel() -> (Self, TimerQueue) {
        let armed = Rc::new(RefCell::new(VecDeque::new()));
        (
            Self { armed: Rc::clone(&armed) },
            TimerQueue { armed },
        )
    }
}

impl StartupScheduler for ChannelScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) {
        tracing::debug!("Timer {:?} armed for {:?}", event, delay);
        self.armed.borrow_mut().push_back(ArmedTimer {
            fires: after(delay),
            event,
        });
    }
}

impl TimerQueue {
    /// Oldest timer not yet handed out
    pub fn pop(&self) -> Option<ArmedTimer> {
        self.armed.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.armed.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.borrow().is_empty()
    }
}

/// Records requests; the owner fires them explicitly
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    pending: Rc<RefCell<Vec<(Duration, TimerEvent)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain requested timers
    pub fn take_pending(&self) -> Vec<(Duration, TimerEvent)> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl StartupScheduler for ManualScheduler {
    fn schedule_once(&mut self, delay: Duration, event: TimerEvent) {
        self.pending.borrow_mut().push((delay, event));
    }
}
