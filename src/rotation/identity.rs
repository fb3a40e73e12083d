//! Browser identity pool
//!
//! Each browser session presents one identity string drawn uniformly from
//! a fixed set spanning desktop and mobile browsers.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// Common desktop and mobile browser identity strings
pub const DEFAULT_IDENTITIES: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
    // Safari on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    // Firefox on Linux
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
    // Safari on iPhone
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    // Chrome on Android
    "Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Mobile Safari/537.36",
];

/// Uniform random choice over a fixed set of identity strings
#[derive(Debug)]
pub struct IdentityPool {
    rng: StdRng,
}

impl IdentityPool {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Returns a random identity; never empty
    pub fn next(&mut self) -> &'static str {
        DEFAULT_IDENTITIES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(DEFAULT_IDENTITIES[0])
    }
}
