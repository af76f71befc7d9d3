//! Per-client, per-route sliding-window admission control.
//!
//! Each configured route prefix has its own `(max_requests, window)` pair.
//! For every `(client, route)` key the limiter keeps the timestamps of
//! admitted requests inside the trailing window. A request is admitted when
//! fewer than `max_requests` timestamps remain after pruning, and only
//! admitted requests are recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Limit applied to every path starting with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteLimit {
    pub prefix: String,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RouteLimit {
    pub fn new(prefix: impl Into<String>, max_requests: u32, window_secs: u64) -> Self {
        Self {
            prefix: prefix.into(),
            max_requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Outcome of [`RateLimiter::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted and recorded.
    Allowed,
    /// No configured route covers the path. Not recorded.
    Exempt,
    /// Window is full. `retry_after` is the time until the oldest recorded
    /// request leaves the window.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_denied(&self) -> bool {
        matches!(self, Admission::Denied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    client: String,
    route: usize,
}

/// Sliding-window limiter shared by all request handlers.
///
/// Admission for one key runs under that key's map shard lock, so the
/// prune, check and record steps cannot interleave with another admission
/// for the same key.
#[derive(Debug)]
pub struct RateLimiter {
    routes: Vec<RouteLimit>,
    windows: DashMap<WindowKey, VecDeque<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Builds a limiter over `routes`.
    ///
    /// Matching picks the longest prefix, so the order of `routes` does not
    /// matter.
    pub fn new(mut routes: Vec<RouteLimit>, clock: Arc<dyn Clock>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self {
            routes,
            windows: DashMap::new(),
            clock,
        }
    }

    /// Returns the limit governing `path`, if any.
    pub fn route_for(&self, path: &str) -> Option<&RouteLimit> {
        self.match_route(path).map(|(_, route)| route)
    }

    fn match_route(&self, path: &str) -> Option<(usize, &RouteLimit)> {
        self.routes
            .iter()
            .enumerate()
            .find(|(_, route)| path.starts_with(route.prefix.as_str()))
    }

    /// Decides whether `client_id` may make a request to `path` now.
    pub fn admit(&self, client_id: &str, path: &str) -> Admission {
        let Some((index, route)) = self.match_route(path) else {
            return Admission::Exempt;
        };
        let window = route.window();

        let mut stamps = self
            .windows
            .entry(WindowKey {
                client: client_id.to_string(),
                route: index,
            })
            .or_default();

        // Read the clock under the lock so stamps stay ordered.
        let now = self.clock.now();
        prune(&mut stamps, now, window);

        if stamps.len() >= route.max_requests as usize {
            let retry_after = stamps
                .front()
                .map(|oldest| (*oldest + window).saturating_duration_since(now))
                .unwrap_or(window);
            tracing::warn!(
                client = client_id,
                route = %route.prefix,
                retry_after_secs = retry_after.as_secs(),
                "rate limit exceeded"
            );
            return Admission::Denied { retry_after };
        }

        stamps.push_back(now);
        Admission::Allowed
    }

    /// Drops windows whose timestamps have all aged out and returns how many
    /// were removed.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|key, stamps| {
            let window = self.routes[key.route].window();
            prune(stamps, now, window);
            !stamps.is_empty()
        });
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.windows.len(), "purged idle rate windows");
        }
        removed
    }

    /// Number of `(client, route)` windows currently held.
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }
}

fn prune(stamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = stamps.front() {
        if now.saturating_duration_since(*oldest) < window {
            break;
        }
        stamps.pop_front();
    }
}
