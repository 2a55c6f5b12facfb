#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or};

/// Where the cache lives. KeyDB speaks the same protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// `redis://[:password@]host:port`
    pub fn from_parts(host: &str, port: u16, password: Option<&str>) -> Self {
        let auth = password.map(|p| format!(":{}@", p)).unwrap_or_default();
        Self::new(format!("redis://{}{}:{}", auth, host, port))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any password masked, for logs.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}***{}", &self.url[..scheme_end + 3], &self.url[at..])
            }
            _ => self.url.clone(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::from_parts("127.0.0.1", 6379, None)
    }
}

/// `REDIS_URL` wins; otherwise `KEYDB_HOST` (127.0.0.1), `KEYDB_PORT` (6379) and the optional
/// `KEYDB_PASSWORD` are assembled into a URL.
#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        if let Some(url) = env_optional("REDIS_URL") {
            return Ok(Self::new(url));
        }

        let host = env_or_default("KEYDB_HOST", "127.0.0.1");
        let port = env_parse_or("KEYDB_PORT", 6379u16)?;
        Ok(Self::from_parts(&host, port, env_optional("KEYDB_PASSWORD").as_deref()))
    }
}
