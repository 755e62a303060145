use thiserror::Error;

use std::{fs, io, path::PathBuf};

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
    #[error("Unable to determine home directory")]
    NoHome,
}

const CONFIG_DIRECTORY: &str = "config";
const DATA_DIRECTORY: &str = "data";

pub const ENV_VAR_HOME: &str = "SPLITVPN_HOME";
pub const DEFAULT_STATE_DIR_MACOS: &str = "Library/Application Support/SplitVPN";
pub const DEFAULT_STATE_DIR_OTHER: &str = ".local/share/splitvpn";

pub fn data_dir(file: &str) -> Result<PathBuf, Error> {
    let data_path = get_home()?.join(DATA_DIRECTORY);
    let data_file = data_path.join(file);
    tracing::debug!("Using data file: {}", data_file.display());
    fs::create_dir_all(&data_path)?;
    Ok(data_file)
}

pub fn config_dir(file: &str) -> Result<PathBuf, Error> {
    let config_path = get_home()?.join(CONFIG_DIRECTORY);
    let config_file = config_path.join(file);
    tracing::debug!("Using config file: {}", config_file.display());
    fs::create_dir_all(&config_path)?;
    Ok(config_file)
}

fn get_home() -> Result<PathBuf, Error> {
    if let Ok(home) = std::env::var(ENV_VAR_HOME) {
        return Ok(PathBuf::from(home));
    }

    let user_home = std::env::var("HOME").map(PathBuf::from).map_err(|_| Error::NoHome)?;

    #[cfg(target_os = "macos")]
    {
        Ok(user_home.join(DEFAULT_STATE_DIR_MACOS))
    }
    #[cfg(not(target_os = "macos"))]
    {
        Ok(user_home.join(DEFAULT_STATE_DIR_OTHER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn with_env_var<F>(key: &str, value: Option<&str>, test: F)
    where
        F: FnOnce(),
    {
        let _guard = ENV_MUTEX.lock().unwrap();
        let original_value = env::var(key).ok();

        match value {
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test));

        match original_value {
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }

        if let Err(err) = result {
            std::panic::resume_unwind(err);
        }
    }

    #[test]
    fn custom_home_holds_data_and_config() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let temp_path_str = temp_path.to_str().unwrap();

        with_env_var(ENV_VAR_HOME, Some(temp_path_str), || {
            let data = data_dir("splitvpn.db").unwrap();
            assert_eq!(data, temp_path.join(DATA_DIRECTORY).join("splitvpn.db"));

            let config = config_dir("config.toml").unwrap();
            assert!(config.starts_with(&temp_path), "config dir should be under custom home");

            assert!(temp_path.join(DATA_DIRECTORY).is_dir());
            assert!(temp_path.join(CONFIG_DIRECTORY).is_dir());
        });
    }

    #[test]
    fn default_home_is_below_user_home() {
        with_env_var(ENV_VAR_HOME, None, || {
            let Ok(user_home) = env::var("HOME") else {
                return;
            };
            let home = get_home().unwrap();

            #[cfg(target_os = "macos")]
            assert_eq!(home, PathBuf::from(user_home).join(DEFAULT_STATE_DIR_MACOS));

            #[cfg(not(target_os = "macos"))]
            assert_eq!(home, PathBuf::from(user_home).join(DEFAULT_STATE_DIR_OTHER));
        });
    }
}
