#![no_main]

use feishu_oauth_proxy::credential::TenantCredential;
use feishu_oauth_proxy::models::{
    CallbackQuery, TokenExchangeRequest, TokenRefreshRequest, ValidateCredentialsRequest,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = serde_json::from_value::<TokenExchangeRequest>(json.clone());
        let _ = serde_json::from_value::<TokenRefreshRequest>(json.clone());
        let _ = serde_json::from_value::<CallbackQuery>(json.clone());

        if let Ok(req) = serde_json::from_value::<ValidateCredentialsRequest>(json) {
            let credential = TenantCredential::new(
                req.app_id.unwrap_or_default(),
                req.app_secret.unwrap_or_default(),
            );
            let _ = credential.validate_format();
            let _ = credential.masked_app_id();
        }
    }
});
