// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

#[async_trait]
/// Time source boundary for UTC timestamps and poll pacing.
/// Makes time-dependent logic deterministic and testable.
pub trait ClockPort: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
    async fn sleep(&self, duration: Duration);
}
