// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule compiler: builder DSL lowering to canonical cron expressions
//!
//! The five constructors (`every`, `daily`, `weekly`, `monthly`, `cron`)
//! each produce an immutable [`ScheduleDescriptor`]: the canonical cron
//! string, a human-readable rendering, and the original builder inputs.
//! A descriptor is a value; `with_timezone` returns a refined copy.

mod builder;
mod human;

pub use builder::{cron, daily, every, monthly, weekly, MonthlyDay};

use crate::cron::CronExpr;
use crate::error::InputError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which constructor produced a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Interval,
    Daily,
    Weekly,
    Monthly,
    Cron,
}

/// The immutable compiled form of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDescriptor {
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    /// Canonical cron expression, 5 or 6 whitespace-separated fields
    pub cron: String,
    /// IANA zone name; absent means worker default or UTC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub human_readable: String,
    /// Builder inputs, preserved for debugging and platform validation
    pub original_params: BTreeMap<String, String>,
}

impl ScheduleDescriptor {
    pub(crate) fn new(
        kind: ScheduleKind,
        cron: String,
        human_readable: String,
        original_params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            kind,
            cron,
            timezone: None,
            human_readable,
            original_params,
        }
    }

    /// Return a copy of this descriptor pinned to an IANA timezone.
    /// The original descriptor is not modified.
    pub fn with_timezone(&self, timezone: &str) -> Result<Self, InputError> {
        let _: Tz = timezone
            .parse()
            .map_err(|_| InputError::UnknownTimezone(timezone.to_string()))?;
        let mut refined = self.clone();
        refined.timezone = Some(timezone.to_string());
        Ok(refined)
    }

    /// Resolve this descriptor's timezone, falling back to the given default
    pub fn resolve_timezone(&self, default: Tz) -> Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or(default)
    }

    /// Parse the canonical cron under the evaluator
    pub fn compiled(&self) -> Result<CronExpr, InputError> {
        CronExpr::parse(&self.cron)
    }

    /// Check that the descriptor still evaluates (used by platform adapters)
    pub fn validate(&self) -> Result<(), InputError> {
        self.compiled().map(|_| ())
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
