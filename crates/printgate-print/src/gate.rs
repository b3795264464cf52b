// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-printer gate: one session at a time per address.
//
// A receipt printer interleaves bytes from concurrent connections, so two
// jobs for the same address are serialised. Distinct addresses never block
// each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct PrinterGate {
    slots: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl PrinterGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`. Exclusivity lasts until the
    /// returned guard is dropped.
    pub async fn acquire(&self, address: &str) -> OwnedMutexGuard<()> {
        let slot = self.slot(address);
        let guard = slot.lock_owned().await;
        debug!(address, "printer gate acquired");
        guard
    }

    /// Number of addresses currently tracked.
    pub fn tracked_printers(&self) -> usize {
        match self.slots.lock() {
            Ok(slots) => slots.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn slot(&self, address: &str) -> Arc<AsyncMutex<()>> {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => {
                warn!("printer gate map poisoned; recovering");
                poisoned.into_inner()
            }
        };
        // Entries only the map holds are idle.
        slots.retain(|addr, slot| addr == address || Arc::strong_count(slot) > 1);
        slots
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
