#![allow(dead_code)]

use drokit_core::{
    CommandChannel, CommandError, FeedError, FeedSnapshot, PositionFeed, TaskMode,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Controller state shared between a mock feed and a mock channel
pub struct MockMachine {
    pub snapshot: FeedSnapshot,
    pub sent: Vec<String>,
    pub mode_requests: Vec<TaskMode>,
    pub enable_requests: Vec<bool>,
    pub polls: usize,
    pub reject_with: Option<String>,
    pub feed_lost: bool,
}

pub type Shared = Arc<Mutex<MockMachine>>;

pub fn machine(raw: Vec<f64>) -> Shared {
    Arc::new(Mutex::new(MockMachine {
        snapshot: FeedSnapshot::ready(raw),
        sent: Vec::new(),
        mode_requests: Vec::new(),
        enable_requests: Vec::new(),
        polls: 0,
        reject_with: None,
        feed_lost: false,
    }))
}

pub struct MockFeed(pub Shared);

impl PositionFeed for MockFeed {
    fn poll(&mut self) -> Result<FeedSnapshot, FeedError> {
        let mut m = self.0.lock();
        if m.feed_lost {
            return Err(FeedError::Unavailable {
                reason: "mock feed lost".to_string(),
            });
        }
        m.polls += 1;
        Ok(m.snapshot.clone())
    }
}

pub struct MockChannel(pub Shared);

impl CommandChannel for MockChannel {
    fn submit(&mut self, command: &str) -> Result<(), CommandError> {
        let mut m = self.0.lock();
        if let Some(reason) = m.reject_with.clone() {
            return Err(CommandError::Rejected {
                command: command.to_string(),
                reason,
            });
        }
        m.sent.push(command.to_string());
        Ok(())
    }

    fn ensure_mode(&mut self, mode: TaskMode) -> Result<(), CommandError> {
        let mut m = self.0.lock();
        m.mode_requests.push(mode);
        m.snapshot.task_mode = mode;
        Ok(())
    }

    fn set_enabled(&mut self, on: bool) -> Result<(), CommandError> {
        let mut m = self.0.lock();
        m.enable_requests.push(on);
        m.snapshot.enabled = on;
        Ok(())
    }
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
