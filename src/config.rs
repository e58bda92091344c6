pub mod error;
pub mod load;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_settings, load_settings_with};
pub use settings::{
    ClientSettings, ScriptSettings, ServerSettings, Settings, API_KEY_ENV, BIND_ENV,
    PROXY_URL_ENV, SERVER_API_KEY_ENV,
};
