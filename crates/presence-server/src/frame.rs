//! Rate-limited camera frame cache.
//!
//! Camera pulls are answered from a local cache refreshed from the robot at
//! most ~30 times per second; a client polling faster than that just sees
//! the same frame again. Before the first frame arrives, a placeholder
//! image is served so the UI always has something to draw.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::debug;

use presence_core::ControlSession;

/// Maximum robot-side frame refreshes per second.
const MAX_REFRESH_PER_SEC: NonZeroU32 = NonZeroU32::new(30).unwrap();

/// Single-cell bucket: no burst allowance, so pulls inside one ~33 ms
/// period always see the same cached bytes.
const NO_BURST: NonZeroU32 = NonZeroU32::new(1).unwrap();

/// Served until the robot delivers its first camera frame.
const PLACEHOLDER_PNG: &[u8] = include_bytes!("placeholder.png");

/// Caches the latest camera frame and throttles robot-side refreshes.
pub struct FrameCache {
    limiter: DefaultDirectRateLimiter,
    cached: Option<Vec<u8>>,
}

impl FrameCache {
    /// The built-in placeholder image, also served when no robot session
    /// is attached yet.
    pub fn placeholder() -> &'static [u8] {
        PLACEHOLDER_PNG
    }

    pub fn new() -> Self {
        Self {
            limiter: RateLimiter::direct(
                Quota::per_second(MAX_REFRESH_PER_SEC).allow_burst(NO_BURST),
            ),
            cached: None,
        }
    }

    /// The frame to serve right now.
    ///
    /// Refreshes from the robot only when the rate limiter allows it and
    /// the robot actually has a frame; otherwise the cached bytes (or the
    /// placeholder) are returned unchanged.
    pub fn get(&mut self, session: &mut ControlSession) -> Vec<u8> {
        if self.limiter.check().is_ok() {
            if let Some(frame) = session.latest_frame() {
                self.cached = Some(frame);
            }
        } else {
            debug!("frame pull throttled; serving cached frame");
        }
        self.cached
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_PNG.to_vec())
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new()
    }
}
