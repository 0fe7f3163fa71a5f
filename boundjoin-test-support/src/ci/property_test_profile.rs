//! Property-test run profile parsing for CI and local overrides.
//!
//! Every property suite in the workspace reads its case count and fork
//! setting through [`ProptestRunProfile`], so one pair of variables tunes
//! them all.

use std::env;

use thiserror::Error;

/// Environment variable controlling proptest case counts.
pub const BOUNDJOIN_PBT_CASES_ENV_KEY: &str = "BOUNDJOIN_PBT_CASES";
/// Environment variable controlling proptest process forking.
pub const BOUNDJOIN_PBT_FORK_ENV_KEY: &str = "BOUNDJOIN_PBT_FORK";

/// Reasons an override was ignored.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProfileOverrideError {
    /// The case count was not an unsigned integer.
    #[error("`{raw}` is not a case count")]
    InvalidCases {
        /// The rejected value.
        raw: String,
    },
    /// The case count was zero.
    #[error("case count must be greater than zero")]
    ZeroCases,
    /// The fork flag was not a recognised boolean spelling.
    #[error("`{raw}` is not one of true/false/1/0/yes/no/on/off")]
    InvalidFlag {
        /// The rejected value.
        raw: String,
    },
}

/// Runtime profile for property-test execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Load a profile from environment variables with provided defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use boundjoin_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(64, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self::from_lookup(|key| env::var(key).ok(), default_cases, default_fork)
    }

    /// Load a profile through `lookup`, falling back to the defaults for
    /// missing or invalid values. Invalid values are logged at `warn`.
    ///
    /// # Examples
    ///
    /// ```
    /// use boundjoin_test_support::ci::property_test_profile::{
    ///     BOUNDJOIN_PBT_CASES_ENV_KEY, ProptestRunProfile,
    /// };
    ///
    /// let profile = ProptestRunProfile::from_lookup(
    ///     |key| (key == BOUNDJOIN_PBT_CASES_ENV_KEY).then(|| "512".to_owned()),
    ///     64,
    ///     false,
    /// );
    /// assert_eq!(profile.cases(), 512);
    /// assert!(!profile.fork());
    /// ```
    #[must_use]
    pub fn from_lookup<F>(lookup: F, default_cases: u32, default_fork: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let cases = override_or_default(
            BOUNDJOIN_PBT_CASES_ENV_KEY,
            lookup(BOUNDJOIN_PBT_CASES_ENV_KEY),
            default_cases,
            parse_cases,
        );
        let fork = override_or_default(
            BOUNDJOIN_PBT_FORK_ENV_KEY,
            lookup(BOUNDJOIN_PBT_FORK_ENV_KEY),
            default_fork,
            parse_flag,
        );
        Self { cases, fork }
    }

    /// Number of cases to run per property.
    #[must_use]
    pub fn cases(&self) -> u32 {
        self.cases
    }

    /// Whether to run proptest cases in forked subprocesses.
    #[must_use]
    pub fn fork(&self) -> bool {
        self.fork
    }
}

fn override_or_default<T>(
    key: &'static str,
    raw: Option<String>,
    default: T,
    parse: fn(&str) -> Result<T, ProfileOverrideError>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    parse(&raw).unwrap_or_else(|reason| {
        tracing::warn!(
            env = key,
            raw = %raw,
            reason = %reason,
            "invalid property-test profile override; using default",
        );
        default
    })
}

fn parse_cases(raw: &str) -> Result<u32, ProfileOverrideError> {
    let parsed = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| ProfileOverrideError::InvalidCases {
            raw: raw.to_owned(),
        })?;
    if parsed == 0 {
        return Err(ProfileOverrideError::ZeroCases);
    }
    Ok(parsed)
}

fn parse_flag(raw: &str) -> Result<bool, ProfileOverrideError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ProfileOverrideError::InvalidFlag {
            raw: raw.to_owned(),
        }),
    }
}
