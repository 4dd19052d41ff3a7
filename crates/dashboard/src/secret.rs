// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization check for externally-triggered cron endpoints
//!
//! Platform-emitted HTTP cron routes call [`verify_cron_request`] with the
//! incoming `Authorization` header. The shared secret lives in the
//! `CRON_SECRET` environment variable; `NODE_ENV=development` bypasses the
//! check so local dashboards can poke routes freely.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronVerification {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CronVerification {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Check an incoming request's `Authorization` header against `CRON_SECRET`
pub fn verify_cron_request(authorization: Option<&str>) -> CronVerification {
    verify(
        std::env::var("NODE_ENV").ok().as_deref(),
        std::env::var("CRON_SECRET").ok().as_deref(),
        authorization,
    )
}

fn verify(
    node_env: Option<&str>,
    secret: Option<&str>,
    authorization: Option<&str>,
) -> CronVerification {
    if node_env == Some("development") {
        return CronVerification::ok();
    }

    let Some(secret) = secret else {
        return CronVerification::rejected("CRON_SECRET environment variable not set");
    };

    let Some(header) = authorization else {
        return CronVerification::rejected("Missing Authorization header");
    };

    if header == format!("Bearer {}", secret) {
        CronVerification::ok()
    } else {
        CronVerification::rejected("Invalid Authorization header")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_mode_always_passes() {
        let result = verify(Some("development"), None, None);
        assert!(result.ok);
        assert!(result.error.is_none());
    }

    #[test]
    fn missing_secret_is_reported() {
        let result = verify(Some("production"), None, Some("Bearer anything"));
        assert!(!result.ok);
        assert_eq!(
            result.error.as_deref(),
            Some("CRON_SECRET environment variable not set")
        );
    }

    #[test]
    fn missing_header_is_reported() {
        let result = verify(None, Some("s3cret"), None);
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("Missing Authorization header"));
    }

    #[test]
    fn header_must_match_exactly() {
        assert!(verify(None, Some("s3cret"), Some("Bearer s3cret")).ok);

        for bad in ["Bearer wrong", "bearer s3cret", "s3cret", "Bearer s3cret "] {
            let result = verify(None, Some("s3cret"), Some(bad));
            assert!(!result.ok, "header {:?} should be rejected", bad);
            assert_eq!(result.error.as_deref(), Some("Invalid Authorization header"));
        }
    }
}
