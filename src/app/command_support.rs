use crate::config::{load_settings as config_load_settings, Settings};
use crate::runtime::{bootstrap_state_root, default_state_root_path, StatePaths};

pub fn ensure_runtime_root() -> Result<StatePaths, String> {
    let root = default_state_root_path().map_err(|e| e.to_string())?;
    let paths = StatePaths::new(root);
    bootstrap_state_root(&paths).map_err(|e| e.to_string())?;
    Ok(paths)
}

pub fn load_settings(paths: &StatePaths) -> Result<Settings, String> {
    config_load_settings(paths).map_err(|e| e.to_string())
}

/// Pulls `--flag value` out of `args`, returning the remaining positionals.
pub fn take_flag(args: &[String], flag: &str) -> Result<(Option<String>, Vec<String>), String> {
    let mut value = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            let next = iter
                .next()
                .ok_or_else(|| format!("`{flag}` requires a value"))?;
            value = Some(next.clone());
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((value, rest))
}
