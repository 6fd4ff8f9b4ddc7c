//! Process configuration loaded from environment variables.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
}

/// Bot configuration.
///
/// | Env Var              | Required | Default          |
/// |----------------------|----------|------------------|
/// | `TELEGRAM_BOT_TOKEN` | yes      | --               |
/// | `DEFAULT_TZ`         | no       | `Africa/Nairobi` |
/// | `WEB_APP_URL`        | no       | --               |
/// | `PROJECTS`           | no       | `default`        |
///
/// The monitoring intervals and feature flags are compiled in; see
/// [`crate::monitor::MonitorConfig`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// IANA zone name applied when an employee has none.
    pub default_timezone: String,
    /// Base URL of the attendance web app, linked from `/app`.
    pub web_app_url: Option<String>,
    /// Comma-separated project names to register databases for.
    pub projects: Vec<String>,
}

impl BotConfig {
    /// Load configuration from the environment. A missing bot token is a
    /// fatal start-up error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingVar("TELEGRAM_BOT_TOKEN"))?;

        let default_timezone =
            std::env::var("DEFAULT_TZ").unwrap_or_else(|_| "Africa/Nairobi".to_string());

        let web_app_url = std::env::var("WEB_APP_URL").ok().filter(|url| !url.is_empty());

        let projects: Vec<String> = std::env::var("PROJECTS")
            .unwrap_or_else(|_| "default".to_string())
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(BotConfig {
            bot_token,
            default_timezone,
            web_app_url,
            projects,
        })
    }
}
