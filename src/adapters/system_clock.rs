//! Wall clock backed by the operating system.

use chrono::{DateTime, Utc};

use crate::ports::clock_port::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
