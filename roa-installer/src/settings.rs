//! Persisted installation location.
//!
//! Two settings namespaces exist: the legacy one written by the first client
//! release, and the current launcher namespace. Both store a single
//! `installLocation` value, with `none` meaning unset. The files use the
//! INI layout the launcher also reads.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ini::Ini;

use crate::error::{InstallerError, InstallerResult};

/// Key holding the installation root.
pub const INSTALL_LOCATION_KEY: &str = "installLocation";

/// Value stored when no location is known.
pub const UNSET: &str = "none";

/// Organization and product of the legacy namespace.
const LEGACY_ORGANIZATION: &str = "Quantum Bytes GmbH";
const LEGACY_PRODUCT: &str = "Relics of Annorath";

/// Organization and product of the current launcher namespace.
pub const ORGANIZATION: &str = "QuantumBytes inc.";
pub const LAUNCHER_PRODUCT: &str = "Relics of Annorath Launcher";

/// Storage for the installation root.
pub trait SettingsStore: Send + Sync {
    /// Stored installation root, `None` when unset.
    fn install_location(&self) -> InstallerResult<Option<PathBuf>>;

    /// Store (or clear with `None`) the installation root.
    fn set_install_location(&self, location: Option<&Path>) -> InstallerResult<()>;
}

/// Normalize an installation root: forward slashes and a trailing `/`.
///
/// Returns `None` for an empty path, which never names a valid root.
pub fn normalize_root(path: &Path) -> Option<PathBuf> {
    let mut text = path.to_string_lossy().replace('\\', "/");
    if text.trim().is_empty() {
        return None;
    }
    if !text.ends_with('/') {
        text.push('/');
    }
    Some(PathBuf::from(text))
}

fn parse_location(value: Option<&str>) -> Option<PathBuf> {
    match value.map(str::trim) {
        None | Some("") => None,
        Some(v) if v == UNSET => None,
        Some(v) => normalize_root(Path::new(v)),
    }
}

/// Escape a group name the way the launcher's settings backend writes it.
///
/// Everything outside `[A-Za-z0-9_.-]` becomes `%XX`, or `%UXXXX` above
/// U+00FF, so `Relics of Annorath` is stored as `Relics%20of%20Annorath`.
pub fn escape_group(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' | '.' => escaped.push(ch),
            _ => {
                let code = u32::from(ch);
                if code <= 0xFF {
                    escaped.push_str(&format!("%{:02X}", code));
                } else {
                    for unit in ch.encode_utf16(&mut [0; 2]) {
                        escaped.push_str(&format!("%U{:04X}", unit));
                    }
                }
            }
        }
    }
    escaped
}

/// INI-file backed settings namespace.
#[derive(Debug, Clone)]
pub struct IniSettings {
    path: PathBuf,
    section: String,
}

impl IniSettings {
    /// Settings stored in `path` under `[section]`.
    pub fn new(path: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
        }
    }

    /// The legacy namespace in the per-user config directory.
    pub fn legacy() -> InstallerResult<Self> {
        Ok(Self::legacy_at(
            user_settings_dir()?
                .join(LEGACY_ORGANIZATION)
                .join(format!("{}.ini", LEGACY_PRODUCT)),
        ))
    }

    /// The legacy namespace stored in `path`.
    ///
    /// The first client release keyed its group by the escaped product name.
    pub fn legacy_at(path: impl Into<PathBuf>) -> Self {
        Self::new(path, escape_group(LEGACY_PRODUCT))
    }

    /// The current launcher namespace in the per-user config directory.
    pub fn current() -> InstallerResult<Self> {
        Ok(Self::new(
            current_settings_dir()?.join(format!("{}.ini", LAUNCHER_PRODUCT)),
            "General",
        ))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> InstallerResult<Ini> {
        if !self.path.exists() {
            return Ok(Ini::new());
        }
        Ini::load_from_file(&self.path).map_err(|e| InstallerError::Settings {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

impl SettingsStore for IniSettings {
    fn install_location(&self) -> InstallerResult<Option<PathBuf>> {
        let ini = self.load()?;
        Ok(parse_location(
            ini.section(Some(self.section.as_str()))
                .and_then(|s| s.get(INSTALL_LOCATION_KEY)),
        ))
    }

    fn set_install_location(&self, location: Option<&Path>) -> InstallerResult<()> {
        let mut ini = self.load()?;
        let value = match location {
            Some(path) => normalize_root(path)
                .ok_or(InstallerError::NoInstallPath)?
                .to_string_lossy()
                .into_owned(),
            None => UNSET.to_string(),
        };
        ini.with_section(Some(self.section.as_str()))
            .set(INSTALL_LOCATION_KEY, value.as_str());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| InstallerError::fs("create", parent, e))?;
        }
        ini.write_to_file(&self.path)
            .map_err(|e| InstallerError::fs("write", &self.path, e))?;

        tracing::debug!(path = %self.path.display(), location = %value, "Stored install location");
        Ok(())
    }
}

/// In-memory settings namespace.
#[derive(Debug, Default)]
pub struct MemorySettings {
    location: Mutex<Option<PathBuf>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: impl AsRef<Path>) -> Self {
        Self {
            location: Mutex::new(normalize_root(location.as_ref())),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn install_location(&self) -> InstallerResult<Option<PathBuf>> {
        Ok(self
            .location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default())
    }

    fn set_install_location(&self, location: Option<&Path>) -> InstallerResult<()> {
        let normalized = match location {
            Some(path) => Some(normalize_root(path).ok_or(InstallerError::NoInstallPath)?),
            None => None,
        };
        if let Ok(mut slot) = self.location.lock() {
            *slot = normalized;
        }
        Ok(())
    }
}

/// Per-user configuration directory.
fn user_settings_dir() -> InstallerResult<PathBuf> {
    dirs::config_dir()
        .ok_or_else(|| InstallerError::Config("per-user config directory is unknown".to_string()))
}

/// Directory of the current launcher namespace.
pub fn current_settings_dir() -> InstallerResult<PathBuf> {
    Ok(user_settings_dir()?.join(ORGANIZATION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_root() {
        assert_eq!(
            normalize_root(Path::new("/opt/roa")),
            Some(PathBuf::from("/opt/roa/"))
        );
        assert_eq!(
            normalize_root(Path::new("/opt/roa/")),
            Some(PathBuf::from("/opt/roa/"))
        );
        assert_eq!(
            normalize_root(Path::new("C:\\Games\\RoA")),
            Some(PathBuf::from("C:/Games/RoA/"))
        );
    }

    #[test]
    fn test_empty_root_is_rejected() {
        assert_eq!(normalize_root(Path::new("")), None);
        assert_eq!(normalize_root(Path::new("  ")), None);

        let temp = TempDir::new().unwrap();
        let settings = IniSettings::new(temp.path().join("launcher.ini"), "General");
        assert!(matches!(
            settings.set_install_location(Some(Path::new(""))),
            Err(InstallerError::NoInstallPath)
        ));
        assert!(!settings.path().exists());

        let memory = MemorySettings::with_location("/srv/roa");
        assert!(memory.set_install_location(Some(Path::new(""))).is_err());
        assert_eq!(
            memory.install_location().unwrap(),
            Some(PathBuf::from("/srv/roa/"))
        );
    }

    #[test]
    fn test_escape_group() {
        assert_eq!(escape_group("General"), "General");
        assert_eq!(escape_group("Relics of Annorath"), "Relics%20of%20Annorath");
        assert_eq!(escape_group("a/b.c_d-e"), "a%2Fb.c_d-e");
        assert_eq!(escape_group("Ä"), "%C4");
        assert_eq!(escape_group("ż"), "%U017C");
    }

    #[test]
    fn test_missing_file_is_unset() {
        let temp = TempDir::new().unwrap();
        let settings = IniSettings::new(temp.path().join("absent.ini"), "General");
        assert_eq!(settings.install_location().unwrap(), None);
    }

    #[test]
    fn test_round_trip_and_clear() {
        let temp = TempDir::new().unwrap();
        let settings = IniSettings::new(temp.path().join("org/launcher.ini"), "General");

        settings
            .set_install_location(Some(Path::new("/opt/roa")))
            .unwrap();
        assert_eq!(
            settings.install_location().unwrap(),
            Some(PathBuf::from("/opt/roa/"))
        );

        settings.set_install_location(None).unwrap();
        assert_eq!(settings.install_location().unwrap(), None);

        let raw = std::fs::read_to_string(settings.path()).unwrap();
        assert!(raw.contains("installLocation=none"));
    }

    #[test]
    fn test_reads_legacy_section_layout() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy.ini");
        std::fs::write(
            &path,
            "[Relics%20of%20Annorath]\ninstallLocation=/home/hero/RoA\n",
        )
        .unwrap();

        let settings = IniSettings::legacy_at(&path);
        assert_eq!(
            settings.install_location().unwrap(),
            Some(PathBuf::from("/home/hero/RoA/"))
        );

        // Same file read through another section sees nothing
        let other = IniSettings::new(&path, "General");
        assert_eq!(other.install_location().unwrap(), None);
    }

    #[test]
    fn test_preserves_unrelated_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("launcher.ini");
        std::fs::write(&path, "[General]\nlanguage=de\n").unwrap();

        let settings = IniSettings::new(&path, "General");
        settings
            .set_install_location(Some(Path::new("/opt/roa/")))
            .unwrap();

        let ini = Ini::load_from_file(&path).unwrap();
        let general = ini.section(Some("General")).unwrap();
        assert_eq!(general.get("language"), Some("de"));
        assert_eq!(general.get(INSTALL_LOCATION_KEY), Some("/opt/roa/"));
    }

    #[test]
    fn test_memory_settings() {
        let settings = MemorySettings::new();
        assert_eq!(settings.install_location().unwrap(), None);
        settings
            .set_install_location(Some(Path::new("/srv/roa")))
            .unwrap();
        assert_eq!(
            settings.install_location().unwrap(),
            Some(PathBuf::from("/srv/roa/"))
        );
    }
}
