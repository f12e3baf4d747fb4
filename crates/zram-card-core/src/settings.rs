//! Persisted plugin settings.
//!
//! The settings file is a flat list of `key="value"` lines as written by the
//! host's settings page and read there with INI rules: values may be bare or
//! quoted, `;` and `#` start comments, `[section]` headers are ignored.
//! Rewrites are rendered as TOML, which reads back the same way. A missing
//! file yields the defaults. Writes go through a temporary file in the same
//! directory and an atomic rename, and never replace a file that could not be
//! read.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Location of the settings file on the host.
pub const DEFAULT_SETTINGS_PATH: &str = "/boot/config/plugins/unraid-zram-card/settings.ini";

/// Default dashboard poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

const KEY_ENABLED: &str = "enabled";
const KEY_REFRESH: &str = "refresh_interval";
const KEY_DEVICES: &str = "zram_devices";
const KEY_DEVICE_NAMES: &str = "zram_device_names";
const KEY_SWAP_SIZE: &str = "swap_size";

/// A device size requested through this tool, with the device it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedDevice {
    /// Size spec as requested (e.g. `1G`).
    pub size: String,
    /// Device allocated for the request; `None` for entries written before
    /// names were recorded.
    pub name: Option<String>,
}

impl RequestedDevice {
    /// Entry for a device created with a known name.
    #[must_use]
    pub fn named(size: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            name: Some(name.into()),
        }
    }
}

/// Plugin configuration as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConfig {
    /// Whether the dashboard card is shown.
    pub enabled: bool,
    /// Dashboard poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Devices created through this tool, in creation order.
    pub requested_devices: Vec<RequestedDevice>,
    /// Size offered by default for new devices.
    pub swap_size: String,
    /// Keys this crate does not interpret, preserved on rewrite.
    extra: BTreeMap<String, String>,
}

impl Default for PersistedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            requested_devices: Vec::new(),
            swap_size: crate::zram::DEFAULT_SIZE_SPEC.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl PersistedConfig {
    /// Parse settings text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a line that is not a comment, a section
    /// header, or `key=value`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with(';')
                || line.starts_with('#')
                || (line.starts_with('[') && line.ends_with(']'))
            {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .map(|(k, v)| (k.trim(), v))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!("settings line {}: expected key=value", number + 1))
                })?;
            values.insert(key.to_string(), ini_value(value));
        }
        Ok(Self::from_values(values))
    }

    fn from_values(mut values: BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let enabled = values
            .remove(KEY_ENABLED)
            .map_or(defaults.enabled, |v| {
                ["yes", "true", "on", "1"]
                    .iter()
                    .any(|t| v.trim().eq_ignore_ascii_case(t))
            });

        let poll_interval_ms = values
            .remove(KEY_REFRESH)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or(defaults.poll_interval_ms);

        let sizes = values.remove(KEY_DEVICES).unwrap_or_default();
        let names = values.remove(KEY_DEVICE_NAMES).unwrap_or_default();
        let requested_devices = decode_devices(&sizes, &names);

        let swap_size = values
            .remove(KEY_SWAP_SIZE)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.swap_size);

        Self {
            enabled,
            poll_interval_ms,
            requested_devices,
            swap_size,
            extra: values,
        }
    }

    /// Render settings text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn render(&self) -> Result<String> {
        let mut values = self.extra.clone();
        values.insert(
            KEY_ENABLED.to_string(),
            if self.enabled { "yes" } else { "no" }.to_string(),
        );
        values.insert(KEY_REFRESH.to_string(), self.poll_interval_ms.to_string());
        values.insert(KEY_SWAP_SIZE.to_string(), self.swap_size.clone());

        let (sizes, names) = encode_devices(&self.requested_devices);
        values.insert(KEY_DEVICES.to_string(), sizes);
        match names {
            Some(names) => {
                values.insert(KEY_DEVICE_NAMES.to_string(), names);
            }
            None => {
                values.remove(KEY_DEVICE_NAMES);
            }
        }

        toml::to_string(&values).map_err(|e| Error::Config(format!("settings render: {e}")))
    }

    /// Size specs of the requested devices, in creation order.
    #[must_use]
    pub fn requested_sizes(&self) -> Vec<&str> {
        self.requested_devices
            .iter()
            .map(|d| d.size.as_str())
            .collect()
    }

    /// Record a newly created device.
    pub fn record_created(&mut self, size: &str, device: &str) {
        self.requested_devices
            .push(RequestedDevice::named(size, device));
    }

    /// Drop the entry for a removed device.
    ///
    /// Matches by device name. Entries without a recorded name are only
    /// touched when nothing matches, in which case the newest of them goes.
    pub fn forget_device(&mut self, device: &str) -> Option<RequestedDevice> {
        let wanted = crate::zram::device_path(device);
        let position = self
            .requested_devices
            .iter()
            .position(|d| {
                d.name
                    .as_deref()
                    .is_some_and(|n| crate::zram::device_path(n) == wanted)
            })
            .or_else(|| self.requested_devices.iter().rposition(|d| d.name.is_none()));
        position.map(|i| self.requested_devices.remove(i))
    }

    /// Forget every requested device.
    pub fn clear_devices(&mut self) {
        self.requested_devices.clear();
    }
}

/// Value part of an INI line: quoted strings keep their content (with TOML
/// escapes), bare values end at a `;` comment.
fn ini_value(raw: &str) -> String {
    let raw = raw.trim();
    let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return raw.split(';').next().unwrap_or_default().trim().to_string();
    };

    if let Ok(mut table) = toml::from_str::<toml::Table>(&format!("v = {raw}")) {
        if let Some(toml::Value::String(s)) = table.remove("v") {
            return s;
        }
    }
    let inner = &raw[quote.len_utf8()..];
    inner.find(quote).map_or(inner, |end| &inner[..end]).to_string()
}

fn decode_devices(sizes: &str, names: &str) -> Vec<RequestedDevice> {
    let names: Vec<&str> = names.split(',').map(str::trim).collect();
    sizes
        .split(',')
        .map(str::trim)
        .enumerate()
        .filter(|(_, size)| !size.is_empty())
        .map(|(i, size)| RequestedDevice {
            size: size.to_string(),
            name: names
                .get(i)
                .filter(|n| !n.is_empty())
                .map(|n| (*n).to_string()),
        })
        .collect()
}

fn encode_devices(devices: &[RequestedDevice]) -> (String, Option<String>) {
    let sizes = devices
        .iter()
        .map(|d| d.size.as_str())
        .collect::<Vec<_>>()
        .join(",");
    if devices.iter().all(|d| d.name.is_none()) {
        return (sizes, None);
    }
    let names = devices
        .iter()
        .map(|d| d.name.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");
    (sizes, Some(names))
}

/// Reads and writes the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_PATH)
    }
}

impl SettingsStore {
    /// Store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults on any problem.
    #[must_use]
    pub fn load(&self) -> PersistedConfig {
        self.read().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "unusable settings file, using defaults");
            PersistedConfig::default()
        })
    }

    /// Read settings; a missing file reads as the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the file exists but cannot be read, or
    /// [`Error::Config`] if it cannot be parsed.
    pub fn read(&self) -> Result<PersistedConfig> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => PersistedConfig::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                Ok(PersistedConfig::default())
            }
            Err(e) => Err(Error::IoError(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Atomically replace the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoError`] if the file cannot be written.
    pub fn save(&self, config: &PersistedConfig) -> Result<()> {
        let text = config.render()?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::IoError(format!("failed to create {}: {e}", dir.display())))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::IoError(format!("failed to create temp file: {e}")))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::IoError(format!("failed to write settings: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            Error::IoError(format!("failed to replace {}: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), devices = config.requested_devices.len(), "settings saved");
        Ok(())
    }

    /// Read, modify, and save in one step.
    ///
    /// An existing file that cannot be read or parsed is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or saving fails.
    pub fn update<F>(&self, f: F) -> Result<PersistedConfig>
    where
        F: FnOnce(&mut PersistedConfig),
    {
        let mut config = self.read()?;
        f(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PersistedConfig::default();
        assert!(config.enabled);
        assert_eq!(config.poll_interval_ms, 3000);
        assert!(config.requested_devices.is_empty());
        assert_eq!(config.swap_size, "1G");
    }

    #[test]
    fn test_parse_plugin_file() {
        let text = "enabled=\"yes\"\nrefresh_interval=\"5000\"\nzram_devices=\"1G,,2G\"\nswap_size=\"4G\"\n";
        let config = PersistedConfig::parse(text).unwrap();
        assert!(config.enabled);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.requested_sizes(), ["1G", "2G"]);
        assert!(config.requested_devices.iter().all(|d| d.name.is_none()));
        assert_eq!(config.swap_size, "4G");
    }

    #[test]
    fn test_parse_bare_values() {
        let config = PersistedConfig::parse("enabled = false\nrefresh_interval = 1500\n").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.poll_interval_ms, 1500);
    }

    #[test]
    fn test_parse_ini_lines() {
        let text = "[plugin]\n; written by hand\nenabled=no\nrefresh_interval=5000 ; ms\n\
                    swap_size='2G'\nzram_devices = \"1G\" ; first boot\n# done\n";
        let config = PersistedConfig::parse(text).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.swap_size, "2G");
        assert_eq!(config.requested_sizes(), ["1G"]);
    }

    #[test]
    fn test_parse_enabled_spellings() {
        for on in ["yes", "\"true\"", "On", "1"] {
            let config = PersistedConfig::parse(&format!("enabled={on}\n")).unwrap();
            assert!(config.enabled, "{on}");
        }
        for off in ["no", "\"false\"", "off", "0", "\"\""] {
            let config = PersistedConfig::parse(&format!("enabled={off}\n")).unwrap();
            assert!(!config.enabled, "{off}");
        }
    }

    #[test]
    fn test_parse_disabled_and_bad_interval() {
        let config = PersistedConfig::parse("enabled=\"no\"\nrefresh_interval=\"soon\"\n").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);

        let config = PersistedConfig::parse("refresh_interval=\"0\"\n").unwrap();
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_parse_names_aligned_with_sizes() {
        let text = "zram_devices=\"1G,2G,512M\"\nzram_device_names=\"/dev/zram0,,/dev/zram2\"\n";
        let config = PersistedConfig::parse(text).unwrap();
        assert_eq!(
            config.requested_devices,
            [
                RequestedDevice::named("1G", "/dev/zram0"),
                RequestedDevice {
                    size: "2G".to_string(),
                    name: None
                },
                RequestedDevice::named("512M", "/dev/zram2"),
            ]
        );
    }

    #[test]
    fn test_parse_corrupt() {
        assert!(PersistedConfig::parse("this is [not valid").is_err());
    }

    #[test]
    fn test_render_then_parse_keeps_unknown_keys() {
        let mut config = PersistedConfig::parse("custom_key=\"kept\"\nenabled=\"yes\"\n").unwrap();
        config.record_created("1G", "/dev/zram0");
        let text = config.render().unwrap();

        assert!(text.contains("custom_key = \"kept\""));
        assert!(text.contains("zram_devices = \"1G\""));
        assert!(text.contains("zram_device_names = \"/dev/zram0\""));
        assert_eq!(PersistedConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_render_legacy_entries_omit_names() {
        let config = PersistedConfig::parse("zram_devices=\"1G,2G\"\n").unwrap();
        let text = config.render().unwrap();
        assert!(text.contains("zram_devices = \"1G,2G\""));
        assert!(!text.contains("zram_device_names"));
    }

    #[test]
    fn test_forget_device_by_name() {
        let mut config = PersistedConfig::default();
        config.record_created("1G", "/dev/zram0");
        config.record_created("2G", "/dev/zram1");
        config.record_created("4G", "/dev/zram2");

        let removed = config.forget_device("zram1").unwrap();
        assert_eq!(removed.size, "2G");
        assert_eq!(config.requested_sizes(), ["1G", "4G"]);
    }

    #[test]
    fn test_forget_device_falls_back_to_newest_legacy_entry() {
        let mut config = PersistedConfig::parse("zram_devices=\"1G,2G\"\n").unwrap();
        config.record_created("4G", "/dev/zram2");

        let removed = config.forget_device("/dev/zram0").unwrap();
        assert_eq!(removed.size, "2G");
        assert_eq!(config.requested_sizes(), ["1G", "4G"]);
    }

    #[test]
    fn test_forget_unknown_device_leaves_named_entries() {
        let mut config = PersistedConfig::default();
        config.record_created("1G", "/dev/zram0");
        assert!(config.forget_device("/dev/zram7").is_none());
        assert_eq!(config.requested_sizes(), ["1G"]);
    }

    #[test]
    fn test_store_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.ini"));
        assert_eq!(store.load(), PersistedConfig::default());
    }

    #[test]
    fn test_store_corrupt_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "; ini comment\n[[[").unwrap();
        assert_eq!(SettingsStore::new(&path).load(), PersistedConfig::default());
    }

    #[test]
    fn test_store_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.ini"));

        let saved = store
            .update(|c| {
                c.poll_interval_ms = 1000;
                c.record_created("2G", "/dev/zram0");
            })
            .unwrap();

        assert_eq!(store.load(), saved);
        assert_eq!(store.load().requested_sizes(), ["2G"]);
    }

    #[test]
    fn test_update_keeps_unquoted_ini_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "enabled=no\nrefresh_interval=5000\nzram_devices=\"1G\"\n").unwrap();
        let store = SettingsStore::new(&path);

        let saved = store.update(|c| c.record_created("2G", "/dev/zram1")).unwrap();

        assert!(!saved.enabled);
        assert_eq!(saved.poll_interval_ms, 5000);
        assert_eq!(saved.requested_sizes(), ["1G", "2G"]);
        assert_eq!(store.load(), saved);
    }

    #[test]
    fn test_update_leaves_unreadable_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        let original = "enabled=no\nnot a setting\n";
        std::fs::write(&path, original).unwrap();
        let store = SettingsStore::new(&path);

        let result = store.update(|c| c.record_created("2G", "/dev/zram1"));

        assert!(matches!(result, Err(Error::Config(_))), "{result:?}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        assert_eq!(store.load(), PersistedConfig::default());
    }

    #[test]
    fn test_read_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.ini"));
        assert_eq!(store.read().unwrap(), PersistedConfig::default());
    }
}
