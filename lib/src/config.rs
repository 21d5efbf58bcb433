use serde::de::DeserializeOwned;

use crate::email::discount::DiscountCode;
use crate::Result;

pub static CONFIG_FILE: &'static str = "pulse.toml";

/// Application configuration.
///
/// # Sensible defaults
///
/// `Config::default()` gives a working local setup: templates are stored in
/// `./db`, logs are formatted for the terminal and drafting points at a
/// local functions endpoint.
///
/// Using the *struct update syntax* one can initialize a new `Config`, making
/// a few changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     store: Store {
///         temporary: true,
///         ..Default::default()
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    pub tracing: Tracing,
    pub store: Store,
    pub drafting: Drafting,
    pub payments: Payments,

    /// Discount codes offered without consulting the payment provider.
    pub discounts: Vec<DiscountCode>,

    pub init: Init,
    /// Development mode configuration.
    pub dev: DevMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tracing: Tracing::default(),
            store: Store::default(),
            drafting: Drafting::default(),
            payments: Payments::default(),
            discounts: vec![],
            init: Init::default(),
            dev: DevMode::default(),
        }
    }
}

/// Loads application config from toml file at default location.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from toml file at standard path using provided
/// name.
///
/// For example for `name` == `pulse.toml` we will load both `pulse.toml`
/// and `secret.pulse.toml` from the main project directory.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
    pub loki_token: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
            loki_token: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Store {
    /// Path to the template database directory, relative to the current
    /// working directory.
    pub path: String,
    /// Open a throwaway database that is removed on drop. Useful for tests
    /// and demos.
    pub temporary: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            path: "db".to_string(),
            temporary: false,
        }
    }
}

/// Text-generation service used for drafting emails.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Drafting {
    /// Base address of the service, optionally with a path prefix. The
    /// generation path is appended to it.
    pub endpoint: String,
    /// Bearer key sent with each request. Keep it in `secret.pulse.toml`.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for Drafting {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:54321".to_string(),
            api_key: "".to_string(),
            timeout: 60,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Payments {
    pub stripe: Stripe,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Stripe {
    /// Production secret, used with release builds
    pub secret: String,
    /// Test secret, used with debug builds
    pub test_secret: String,
}

impl Stripe {
    /// Picks the secret matching the build profile.
    pub fn active_secret(&self) -> &str {
        if cfg!(debug_assertions) {
            &self.test_secret
        } else {
            &self.secret
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Init {
    pub enabled: bool,
    /// Directory holding email documents to be loaded as templates on
    /// startup.
    pub templates: String,
}

impl Default for Init {
    fn default() -> Self {
        Self {
            enabled: true,
            templates: "content/templates".to_string(),
        }
    }
}

/// NOTE: make sure to disable on production.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevMode {
    /// Global switch for all dev mode items.
    pub enabled: bool,
    /// Mocking flag for all the mocking behavior performed by this library.
    pub mock: bool,
    /// Regenerative mocking behavior controls whether to regenerate mocks
    /// that are already present in the database.
    pub mock_regen: bool,
}
