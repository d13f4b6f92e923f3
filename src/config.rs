//! Server configuration.
//!
//! Every field has a default, so an empty TOML document (or
//! `Config::default()`) is a working configuration:
//!
//! ```toml
//! bind_address      = "0.0.0.0:8080"
//! router            = "simple"   # or "fast"
//! health_check      = "simple"   # or "custom"
//! health_check_path = "/status"
//! ```
//!
//! Middleware and custom health handlers are code, not data; attach them with
//! [`Config::with_middleware`] and [`Config::with_health_handler`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::health::{self, HealthCheckKind};
use crate::middleware::Middleware;
use crate::router::RouterKind;

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Address the listener binds to (e.g. `"0.0.0.0:8080"`).
    pub bind_address: String,

    pub router: RouterKind,

    pub health_check: HealthCheckKind,

    pub health_check_path: String,

    /// Certificate paths. TLS is terminated by the fronting proxy; a server
    /// configured with this set refuses to start.
    pub tls: Option<TlsConfig>,

    /// Wraps every service route and the not-found fallback.
    #[serde(skip)]
    pub middleware: Option<Middleware>,

    #[serde(skip)]
    pub health_handler: Option<BoxedHandler>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_owned(),
            router: RouterKind::default(),
            health_check: HealthCheckKind::default(),
            health_check_path: health::DEFAULT_PATH.to_owned(),
            tls: None,
            middleware: None,
            health_handler: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn with_router(mut self, router: RouterKind) -> Self {
        self.router = router;
        self
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Installs `handler` as the health check and selects [`HealthCheckKind::Custom`].
    pub fn with_health_handler(mut self, handler: BoxedHandler) -> Self {
        self.health_check = HealthCheckKind::Custom;
        self.health_handler = Some(handler);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if !self.health_check_path.starts_with('/') {
            return Err(Error::Config(format!(
                "health_check_path `{}` must start with `/`",
                self.health_check_path
            )));
        }
        if self.health_check == HealthCheckKind::Custom && self.health_handler.is_none() {
            return Err(Error::Config(
                "health_check = \"custom\" needs a handler from Config::with_health_handler".to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("router", &self.router)
            .field("health_check", &self.health_check)
            .field("health_check_path", &self.health_check_path)
            .field("tls", &self.tls)
            .field("middleware", &self.middleware.is_some())
            .field("health_handler", &self.health_handler.is_some())
            .finish()
    }
}
