#![no_main]

use feishu_oauth_proxy::models::{TokenResponse, TokenResult};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let decoded = TokenResponse::classify(&json);
        if let Ok(token) = decoded.into_result() {
            assert!(!token.access_token.is_empty());
            assert!(token.expires_in > 0);
        }

        if let Ok(token) = TokenResult::from_refresh(&json, "fuzz-refresh") {
            assert!(!token.refresh_token.is_empty());
        }
    }
});
