use std::env;
use std::path::PathBuf;

use crate::pagination::PaginationDefaults;

pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Application configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub oauth: OAuthConfig,
    pub api_base: String,
    pub pagination: PaginationDefaults,
}

/// Credentials and endpoints of the OAuth2 provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub accounts_base: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            accounts_base: SPOTIFY_ACCOUNTS_BASE.to_string(),
            scopes: [
                "user-read-private",
                "user-read-email",
                "user-top-read",
                "user-library-read",
                "playlist-read-private",
                "playlist-read-collaborative",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("no .env file found, using process environment only");
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".into()).into();
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()).into();

        let client_id = required("SPOTIFY_CLIENT_ID")?;
        let client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let redirect_uri = required("REDIRECT_URI")?;

        Ok(Self {
            port,
            data_dir,
            static_dir,
            oauth: OAuthConfig::new(client_id, client_secret, redirect_uri),
            api_base: SPOTIFY_API_BASE.to_string(),
            pagination: PaginationDefaults::default(),
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} is required", name))
}
