pub mod gate;
pub mod token;

pub use gate::{GateDecision, LOGIN_PATH, RedirectReason, RouteClass, classify, decide};
pub use token::{COOKIE_MAX_AGE, TOKEN_COOKIE, TOKEN_TTL, TokenError, issue_token, verify_token};
