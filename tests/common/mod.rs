//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use qa_engine::{ErrorKind, RetryPolicy, TestOperationId};

pub fn op(name: &str) -> TestOperationId {
    TestOperationId::new(name).unwrap()
}

/// A policy with millisecond delays so retry tests stay fast.
#[allow(dead_code)]
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
        .backoff_multiplier(2.0)
        .max_delay(Duration::from_millis(5))
        .build()
        .unwrap()
}

/// Operation that fails with `kind` for the first `failures` calls.
#[allow(dead_code)]
pub struct Flaky {
    calls: AtomicU32,
    failures: u32,
    kind: ErrorKind,
}

#[allow(dead_code)]
impl Flaky {
    pub fn new(failures: u32, kind: ErrorKind) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
            kind,
        }
    }

    pub fn always(kind: ErrorKind) -> Self {
        Self::new(u32::MAX, kind)
    }

    pub fn call(&self) -> Result<u32, ErrorKind> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(self.kind.clone())
        } else {
            Ok(n)
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}
