use super::{ConfigError, Settings};
use crate::runtime::StatePaths;

pub fn load_settings(paths: &StatePaths) -> Result<Settings, ConfigError> {
    load_settings_with(paths, |key| std::env::var(key).ok())
}

pub fn load_settings_with<F>(paths: &StatePaths, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::from_path_or_default(&paths.settings_file())?;
    settings.apply_env_overrides(lookup);
    settings.validate()?;
    Ok(settings)
}
