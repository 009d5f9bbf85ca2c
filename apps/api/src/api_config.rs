use std::env;

use rayerp_core::AppError;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub session_ttl_hours: i64,
    pub session_limit: usize,
    pub cleanup_interval_secs: u64,
    pub root_admin_email: Option<String>,
    pub root_admin_password: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(rayerp_application::DEFAULT_SESSION_TTL_HOURS);
        if session_ttl_hours <= 0 {
            return Err(AppError::Validation(
                "SESSION_TTL_HOURS must be positive".to_owned(),
            ));
        }

        let session_limit = env::var("SESSION_LIMIT_PER_USER")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(rayerp_application::DEFAULT_SESSION_LIMIT);
        if session_limit == 0 {
            return Err(AppError::Validation(
                "SESSION_LIMIT_PER_USER must be at least 1".to_owned(),
            ));
        }

        // Hourly sweep unless overridden.
        let cleanup_interval_secs = env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(3600);

        let root_admin_email = optional_env("ROOT_ADMIN_EMAIL");
        let root_admin_password = optional_env("ROOT_ADMIN_PASSWORD");
        if root_admin_email.is_some() != root_admin_password.is_some() {
            return Err(AppError::Validation(
                "ROOT_ADMIN_EMAIL and ROOT_ADMIN_PASSWORD must be set together".to_owned(),
            ));
        }

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            session_ttl_hours,
            session_limit,
            cleanup_interval_secs,
            root_admin_email,
            root_admin_password,
        })
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
