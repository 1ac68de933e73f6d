//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// INI-backed configuration.
///
/// Keys can be overridden after loading, so command-line flags and
/// `RECTRACK_<SECTION>_<KEY>` environment variables take precedence over
/// the file.
#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

pub const ENV_PREFIX: &str = "RECTRACK_";

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.config.set(section, key, Some(value.to_string()));
    }

    /// Apply `RECTRACK_<SECTION>_<KEY>` overrides for the given keys.
    pub fn apply_env_overrides<I>(&mut self, keys: &[(&str, &str)], vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        for (section, key) in keys {
            let name = format!("{}{}_{}", ENV_PREFIX, section, key).to_uppercase();
            if let Some((_, value)) = vars.iter().find(|(k, _)| *k == name) {
                self.set(section, key, value);
            }
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
