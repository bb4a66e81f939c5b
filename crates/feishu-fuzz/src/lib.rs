//! Fuzzing library for feishu-oauth-proxy.
//!
//! Targets cover the parts that read untrusted JSON: provider token
//! responses and browser request bodies.
//!
//! # Usage
//!
//! ```bash
//! cd crates/feishu-fuzz
//! cargo +nightly fuzz run fuzz_token_response -- -max_total_time=60
//! ```

pub use feishu_oauth_proxy::{credential, models};
