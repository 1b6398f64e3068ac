use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// Path traversal, the most common open-redirect trick
static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\.").expect("path traversal pattern is valid")
});

// Control characters, encoded CR/LF/NUL, backslashes and invisible separators
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[ad]|09|5c)|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]")
        .expect("suspicious pattern is valid")
});

const MAX_REDIRECT_LENGTH: usize = 2048;

/// Why a redirect target was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedirectError {
    #[error("redirect must be a same-origin path")]
    NotRelative,
    #[error("redirect contains a path traversal sequence")]
    PathTraversal,
    #[error("redirect contains suspicious characters")]
    Suspicious,
    #[error("redirect is {0} characters long")]
    TooLong(usize),
}

/// Validate a post-authentication redirect target.
///
/// Only same-origin relative paths are accepted; screens never navigate to
/// another host after sign-in.
///
/// # Errors
///
/// Returns a [`RedirectError`] describing the first check the target failed.
pub fn validate_post_auth_redirect(redirect: &str) -> Result<String, RedirectError> {
    debug!("Validating post-authentication redirect: {redirect}");

    if redirect.len() > MAX_REDIRECT_LENGTH {
        warn!("Excessively long redirect target: {} characters", redirect.len());
        return Err(RedirectError::TooLong(redirect.len()));
    }

    if !is_relative_path(redirect) {
        warn!("Refusing non-relative redirect target: {redirect}");
        return Err(RedirectError::NotRelative);
    }

    if PATH_TRAVERSAL_PATTERN.is_match(redirect) {
        warn!("Path traversal attempt in redirect target: {redirect}");
        return Err(RedirectError::PathTraversal);
    }

    if SUSPICIOUS_PATTERN.is_match(redirect) {
        warn!("Suspicious characters in redirect target: {redirect:?}");
        return Err(RedirectError::Suspicious);
    }

    Ok(redirect.to_string())
}

/// Starts with a single `/` and carries no scheme
fn is_relative_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.contains("://")
}
