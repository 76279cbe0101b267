use std::env::{current_exe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use directories_next::{ProjectDirs};
use tokio::fs::{File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use serde_json;
use fd_lock::{RwLock, RwLockWriteGuard};
use log::{info, warn};
use std::fs::OpenOptions;
use std::str;

use crate::config::types::Config;
use crate::error::ConfigError;

// F:\ble-explorer.exe => F:\ble-explorer.json, useful for usb sticks
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            if !path.set_extension("json") {
                warn!("current exe has no filename: {}", path.to_string_lossy());
                return None
            }

            Some(path)
        },
        Err(err) => {
            warn!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// ble-explorer.json in an os dependent standard directory, such as %AppData% on windows.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "ble-explorer", "ble-explorer").map(|dirs| {
        dirs.config_dir().join("ble-explorer.json")
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        match std::fs::metadata(&path) {
            Ok(attr) => {
                if attr.is_file() {
                    return Ok(path);
                }
            }
            Err(err) => {
                info!("No portable config at {}; Using local path instead. ({})", path.to_string_lossy(), err);
            },
        }
    }

    get_local_config_path().ok_or(ConfigError::NoConfigPath)
}

pub struct ConfigIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl ConfigIOLocker {
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<std::fs::File>, ConfigError> {
        self.rw_lock.try_write().map_err(|source| ConfigError::CanNotLock { source })
    }
}

struct ConfigIOInner {
    file: std::fs::File,
}

#[derive(Clone)]
pub struct ConfigIO {
    inner: Arc<Mutex<ConfigIOInner>>,
}

impl ConfigIO {
    /// Opens the config file at `path`, or at the default location if `path` is `None`.
    pub fn new_sync(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None => get_config_path()?,
        };
        Self::open_sync(&path)
    }

    pub fn open_sync(path: &Path) -> Result<Self, ConfigError> {
        info!("Using config file {}", path.to_string_lossy());

        if let Some(directory) = path.parent() {
            std::fs::create_dir_all(directory)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .append(false)
            .create(true)
            .open(path)?;

        let inner = ConfigIOInner {
            file,
        };
        Ok(ConfigIO { inner: Arc::new(Mutex::new(inner)) })
    }

    /// The returned locker hands out an exclusive lock so that only one instance of this
    /// application uses the config file.
    pub fn locker(&mut self) -> Result<ConfigIOLocker, ConfigError> {
        let inner = self.inner.lock().expect("Failed to lock ConfigIO inner");

        Ok(ConfigIOLocker {
            rw_lock: RwLock::new(inner.file.try_clone()?),
        })
    }

    // The File returned from here should never be closed!
    fn get_file(&self) -> Result<File, ConfigError> {
        let inner = self.inner.lock().expect("Failed to lock ConfigIO inner");
        let file = inner.file.try_clone()?; // std File
        Ok(File::from_std(file)) // tokio File
    }

    pub async fn read(&self) -> Result<Config, ConfigError> {
        let mut file = self.get_file()?;
        info!("Reading config file");

        let mut content = vec![];
        file.rewind().await?;
        file.read_to_end(&mut content).await?;

        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Config::default());
        }

        let content = str::from_utf8(&content)?;
        Ok(serde_json::from_str(content)?)
    }

    pub async fn save(&self, config: Config) -> Result<(), ConfigError> {
        let mut file = self.get_file()?;
        info!("Saving config");

        let content = serde_json::to_string_pretty(&config)?;
        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ValueEncoding;

    fn temp_config_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ble-explorer-test-{}", std::process::id()));
        let path = dir.join(format!("{}.json", name));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn empty_file_reads_as_defaults() {
        let path = temp_config_path("empty");
        let config_io = ConfigIO::open_sync(&path).unwrap();

        assert_eq!(config_io.read().await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn save_then_read_returns_saved_config() {
        let path = temp_config_path("save");
        let config_io = ConfigIO::open_sync(&path).unwrap();

        let long = Config {
            device_name: "A much longer device name than the next one".to_string(),
            ..Config::default()
        };
        config_io.save(long).await.unwrap();

        // a shorter document must not leave trailing bytes of the previous one behind
        let short = Config {
            device_name: "Short".to_string(),
            encoding: ValueEncoding::Base64,
            ..Config::default()
        };
        config_io.save(short.clone()).await.unwrap();

        assert_eq!(config_io.read().await.unwrap(), short);
    }

    #[tokio::test]
    async fn garbage_is_a_json_error() {
        let path = temp_config_path("garbage");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ nope").unwrap();
        let config_io = ConfigIO::open_sync(&path).unwrap();

        let err = config_io.read().await.unwrap_err();
        assert!(matches!(err, ConfigError::JsonError { .. }));
        assert!(!err.is_file_not_found_error());
    }

    #[test]
    fn second_lock_fails() {
        let path = temp_config_path("lock");
        let mut first = ConfigIO::open_sync(&path).unwrap();
        let mut second = ConfigIO::open_sync(&path).unwrap();

        let mut first_locker = first.locker().unwrap();
        let _guard = first_locker.lock().unwrap();

        let mut second_locker = second.locker().unwrap();
        assert!(matches!(second_locker.lock(), Err(ConfigError::CanNotLock { .. })));
    }
}
