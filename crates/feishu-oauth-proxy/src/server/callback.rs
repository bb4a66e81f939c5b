//! HTML pages served at the OAuth redirect target.
//!
//! The success page hands the code to the opener window in two ways: it
//! writes `localStorage` keys for clients that poll, and it posts a message
//! to `window.opener` for popup flows.

use std::time::Duration;

use crate::credential::masked;

/// Characters of the code shown on the success page.
const CODE_DISPLAY_PREFIX: usize = 20;

/// `localStorage` key holding the authorization code.
pub const STORAGE_CODE_KEY: &str = "feishu_oauth_code";
/// `localStorage` key holding the OAuth state.
pub const STORAGE_STATE_KEY: &str = "feishu_oauth_state";
/// `localStorage` key holding the receive time in epoch millis.
pub const STORAGE_TIMESTAMP_KEY: &str = "feishu_oauth_timestamp";
/// `type` of the message posted to `window.opener`.
pub const CALLBACK_MESSAGE_TYPE: &str = "FEISHU_OAUTH_CALLBACK";

/// Render the page shown while no code has arrived yet. It reloads itself
/// every two seconds so redirect flows that attach the code late still land.
#[must_use]
pub fn render_waiting_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Processing authorization</title>
<style>
body { font-family: Arial, sans-serif; text-align: center; padding: 50px; }
.loading { color: #2196F3; }
</style>
</head>
<body>
<h1 class="loading">Processing authorization...</h1>
<p>Please wait while your authorization request is handled.</p>
<script>
setTimeout(() => { window.location.reload(); }, 2000);
</script>
</body>
</html>"#
        .to_string()
}

/// Render the success page for a received authorization code.
///
/// With `close_delay` set the window closes itself after that delay;
/// otherwise the user is asked to close it.
#[must_use]
pub fn render_success_page(code: &str, state: Option<&str>, close_delay: Option<Duration>) -> String {
    let state = state.unwrap_or_default();
    let state_display = if state.is_empty() { "none" } else { state };

    let (close_notice, close_script) = match close_delay {
        Some(delay) => (
            format!("<p>This window will close in {} seconds.</p>", delay.as_secs()),
            format!("setTimeout(() => {{ window.close(); }}, {});", delay.as_millis()),
        ),
        None => (
            "<p><strong>You can close this window now.</strong></p>".to_string(),
            String::new(),
        ),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Authorization successful</title>
<style>
body {{ font-family: Arial, sans-serif; text-align: center; padding: 50px; }}
.success {{ color: #4CAF50; }}
.info {{ background: #f5f5f5; padding: 20px; border-radius: 5px; margin: 20px 0; }}
.code {{ font-family: monospace; background: #e8e8e8; padding: 10px; border-radius: 3px; }}
</style>
</head>
<body>
<h1 class="success">Authorization successful</h1>
<div class="info">
<p><strong>Authorization code received</strong></p>
<p>State: <span class="code">{state_html}</span></p>
<p>Code: <span class="code">{code_html}</span></p>
</div>
{close_notice}
<script>
const code = {code_js};
const state = {state_js};
try {{
  localStorage.setItem("{code_key}", code);
  localStorage.setItem("{state_key}", state);
  localStorage.setItem("{timestamp_key}", Date.now().toString());
  if (window.opener) {{
    window.opener.postMessage({{ type: "{message_type}", code: code, state: state, success: true }}, "*");
  }}
}} catch (error) {{
  console.error("Failed to store authorization code:", error);
}}
{close_script}
</script>
</body>
</html>"#,
        state_html = html_escape(state_display),
        code_html = html_escape(&masked(code, CODE_DISPLAY_PREFIX)),
        close_notice = close_notice,
        code_js = script_string(code),
        state_js = script_string(state),
        code_key = STORAGE_CODE_KEY,
        state_key = STORAGE_STATE_KEY,
        timestamp_key = STORAGE_TIMESTAMP_KEY,
        message_type = CALLBACK_MESSAGE_TYPE,
        close_script = close_script,
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Encode a string as a JavaScript literal that cannot close the `<script>` element.
fn script_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
