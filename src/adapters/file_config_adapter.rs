//! INI file configuration adapter.

use crate::domain::error::SignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SignalError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SignalError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}
