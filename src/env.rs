/// Environment variable names used by this crate for convenient
/// configuration of the sink from microservices.
///
/// These are purely helpers; the core formatter types remain decoupled
/// from environment access.

/// Dynatrace log ingest URL, e.g.
/// `https://abc123.live.dynatrace.com/api/v2/logs/ingest`.
pub const DT_LOG_INGEST_URL_ENV: &str = "DT_LOG_INGEST_URL";

/// Dynatrace API token used for the `Api-Token` authorization header.
pub const DT_LOG_ACCESS_TOKEN_ENV: &str = "DT_LOG_ACCESS_TOKEN";

/// Deployment environment name, checked first when resolving the `env`
/// record field.
pub const DT_LOG_ENVIRONMENT_ENV: &str = "DT_LOG_ENVIRONMENT";

/// Generic fallbacks for the environment name, in priority order after
/// [`DT_LOG_ENVIRONMENT_ENV`].
pub const ENVIRONMENT_FALLBACK_ENVS: &[&str] = &["APP_ENVIRONMENT", "ENVIRONMENT"];

/// Resolve the deployment environment name: first non-empty value among
/// the known variables wins, `None` when all are unset or empty.
pub fn resolve_environment() -> Option<String> {
    std::iter::once(DT_LOG_ENVIRONMENT_ENV)
        .chain(ENVIRONMENT_FALLBACK_ENVS.iter().copied())
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
