// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::app::ports::ClockPort;

#[derive(Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClockPort for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_sleep_returns() {
        let clock = SystemClock::new();
        let before = clock.now_utc();
        clock.sleep(Duration::ZERO).await;
        assert!(clock.now_utc() >= before);
    }
}
