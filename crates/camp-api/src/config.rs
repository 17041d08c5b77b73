use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        max: i64,
    },

    #[error("public url must use http or https: {0}")]
    PublicUrl(Url),
}

/// Runtime settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "camp-api", about = "Bootcamp directory REST API")]
pub struct Config {
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// HMAC secret used to sign session tokens.
    #[arg(long, env = "CAMP_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "CAMP_JWT_EXPIRE_DAYS", default_value_t = 30)]
    pub jwt_expire_days: i64,

    #[arg(long, env = "CAMP_COOKIE_EXPIRE_DAYS", default_value_t = 30)]
    pub cookie_expire_days: i64,

    #[arg(long, env = "CAMP_UPLOAD_DIR", default_value = "./public/uploads")]
    pub upload_dir: PathBuf,

    #[arg(long, env = "CAMP_MAX_UPLOAD_BYTES", default_value_t = 1_000_000)]
    pub max_upload_bytes: usize,

    /// Directory holding users.json, bootcamps.json, courses.json and reviews.json.
    #[arg(long, env = "CAMP_SEED_DIR")]
    pub seed_dir: Option<PathBuf>,

    /// JSON file mapping addresses and zipcodes to locations.
    #[arg(long, env = "CAMP_GEOCODER_TABLE")]
    pub geocoder_table: Option<PathBuf>,

    /// Base URL used in password reset links.
    #[arg(long, env = "CAMP_PUBLIC_URL", default_value = "http://localhost:5000")]
    pub public_url: Url,
}

const MAX_EXPIRE_DAYS: i64 = 3650;

impl Config {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Empty("jwt secret"));
        }
        for (name, value) in [
            ("jwt expire days", self.jwt_expire_days),
            ("cookie expire days", self.cookie_expire_days),
        ] {
            if !(1..=MAX_EXPIRE_DAYS).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    max: MAX_EXPIRE_DAYS,
                });
            }
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Empty("max upload bytes"));
        }
        if !matches!(self.public_url.scheme(), "http" | "https") {
            return Err(ConfigError::PublicUrl(self.public_url));
        }
        Ok(self)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Link a user follows to reset their password.
    pub fn reset_url(&self, token: &str) -> String {
        let base = self.public_url.as_str().trim_end_matches('/');
        format!("{base}/api/v1/auth/resetpassword/{token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["camp-api"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["--jwt-secret", "s3cret"]).validate().unwrap();
        assert_eq!(config.listen_addr().port(), config.port);
        assert!(config.listen_addr().ip().is_unspecified());
        assert!(config.max_upload_bytes > 0);
    }

    #[test]
    fn rejects_blank_secret() {
        let err = parse(&["--jwt-secret", "  "]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Empty(_)));
    }

    #[test]
    fn rejects_zero_expiry() {
        let err = parse(&["--jwt-secret", "x", "--jwt-expire-days", "0"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_non_http_public_url() {
        let err = parse(&["--jwt-secret", "x", "--public-url", "ftp://example.com"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::PublicUrl(_)));
    }

    #[test]
    fn reset_url_joins_path() {
        let config = parse(&["--jwt-secret", "x", "--public-url", "https://camps.dev/"]);
        assert_eq!(
            config.reset_url("abc"),
            "https://camps.dev/api/v1/auth/resetpassword/abc"
        );
    }
}
