//! Paced chunk delivery.
//!
//! Replays a finished text as a stream: fixed-size batches with a delay
//! in between, cancellable at any point. Chunks already delivered stay
//! delivered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// Batch size in characters and delay between batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub batch_size: usize,
    pub rate: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            rate: Duration::from_millis(30),
        }
    }
}

/// Stops a running [`ChunkFeeder::feed`]. Cloneable and `Send`.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn rearm(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// How a feed ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Completed { delivered: usize },
    Cancelled { delivered: usize },
}

/// Splits text into batches and delivers them on a schedule.
#[derive(Debug, Clone)]
pub struct ChunkFeeder {
    config: FeedConfig,
    cancel: CancelHandle,
}

impl ChunkFeeder {
    pub fn new(config: FeedConfig) -> Result<Self, ConfigError> {
        if config.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        Ok(Self {
            config,
            cancel: CancelHandle::default(),
        })
    }

    #[inline]
    pub fn config(&self) -> FeedConfig {
        self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Batches of `text` without pacing.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            rest: text,
            batch_size: self.config.batch_size,
        }
    }

    /// Deliver `text` batch by batch to `deliver(chunk, has_more)`.
    ///
    /// Starting a feed clears an earlier cancellation. Cancelling stops
    /// before the next batch; a pending delay is not interrupted.
    pub fn feed<F>(&self, text: &str, mut deliver: F) -> FeedOutcome
    where
        F: FnMut(&str, bool),
    {
        self.cancel.rearm();
        let mut delivered = 0;

        for (chunk, has_more) in self.chunks(text) {
            if self.cancel.is_cancelled() {
                debug!(delivered, "feed cancelled");
                return FeedOutcome::Cancelled { delivered };
            }
            deliver(chunk, has_more);
            delivered += 1;
            if has_more && !self.config.rate.is_zero() {
                thread::sleep(self.config.rate);
            }
        }

        FeedOutcome::Completed { delivered }
    }
}

/// Iterator over `(chunk, has_more)` pairs. Never splits a character.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    batch_size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = (&'a str, bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let split = self
            .rest
            .char_indices()
            .nth(self.batch_size)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, rest) = self.rest.split_at(split);
        self.rest = rest;
        Some((chunk, !rest.is_empty()))
    }
}
