use std::time::Duration;

use anyhow::Result;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_HTTP_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
    pub http: HttpConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: std::env::var("DATABASE_HOST")?,
            port: std::env::var("DATABASE_PORT")?.parse::<u16>()?,
            username: std::env::var("DATABASE_USERNAME")?,
            password: std::env::var("DATABASE_PASSWORD")?,
            database: std::env::var("DATABASE_NAME")?,
        };
        // 任意項目は未設定ならデフォルト値を使う
        let booking = BookingConfig {
            lock_timeout: Duration::from_millis(optional_var(
                "BOOKING_LOCK_TIMEOUT_MS",
                DEFAULT_LOCK_TIMEOUT_MS,
            )?),
        };
        let http = HttpConfig {
            port: optional_var("HTTP_PORT", DEFAULT_HTTP_PORT)?,
        };
        Ok(Self {
            database,
            booking,
            http,
        })
    }
}

fn optional_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => Ok(v.parse::<T>()?),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct BookingConfig {
    // 資源ロックの取得を待つ上限。超えた場合は Busy を返す
    pub lock_timeout: Duration,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub port: u16,
}
