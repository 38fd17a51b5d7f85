use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin without trailing `/` or `/api`.
    pub api_url: String,
    /// Inclusive radius around a campus that counts as "on campus".
    /// Set via SOCIO_MAX_CAMPUS_DISTANCE_KM. Default: 2.
    pub max_campus_distance_km: f64,
    /// Feed polling period. Set via SOCIO_POLL_INTERVAL_SECS. Default: 60.
    pub poll_interval: Duration,
    /// Page size for the notification feed. Default: 30.
    pub notification_limit: u32,
    /// Durable key/value file (dismissal records).
    pub state_file: PathBuf,
    pub http_timeout: Duration,
    /// Pause between the success state and the completion callback.
    pub success_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".into(),
            max_campus_distance_km: 2.0,
            poll_interval: Duration::from_secs(60),
            notification_limit: 30,
            state_file: PathBuf::from(".socio-state.json"),
            http_timeout: Duration::from_secs(15),
            success_delay: Duration::from_millis(1200),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let defaults = Config::default();

    let max_campus_distance_km = env_parse("SOCIO_MAX_CAMPUS_DISTANCE_KM")
        .unwrap_or(defaults.max_campus_distance_km);
    if !max_campus_distance_km.is_finite() || max_campus_distance_km < 0.0 {
        anyhow::bail!(
            "SOCIO_MAX_CAMPUS_DISTANCE_KM must be a non-negative number, got {}",
            max_campus_distance_km
        );
    }

    Ok(Config {
        api_url: normalize_api_url(
            &std::env::var("SOCIO_API_URL").unwrap_or_else(|_| defaults.api_url.clone()),
        ),
        max_campus_distance_km,
        poll_interval: env_parse("SOCIO_POLL_INTERVAL_SECS")
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval),
        notification_limit: env_parse("SOCIO_NOTIFICATION_LIMIT")
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults.notification_limit),
        state_file: std::env::var("SOCIO_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_file),
        http_timeout: env_parse("SOCIO_HTTP_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout),
        success_delay: env_parse("SOCIO_SUCCESS_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.success_delay),
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Strips a trailing `/` and a trailing `/api` so paths can always be
/// joined as `{api_url}/api/...`.
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/api")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}
