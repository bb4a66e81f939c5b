//! Data models for Feishu token payloads and proxy request/response bodies.

mod requests;
mod token;

pub use requests::{
    CallbackQuery, TokenExchangeRequest, TokenRefreshRequest, TokenResponseBody, UserInfoRequest,
    UserInfoResponseBody, ValidateCredentialsRequest, ValidationResponseBody,
};
pub use token::{TokenResponse, TokenResult, UNKNOWN_ERROR};
pub(crate) use token::message_of;
