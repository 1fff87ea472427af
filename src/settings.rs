use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseSoundSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for PulseSoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub enabled: bool,
    pub address: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "192.168.241.26:8080".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserSettings {
    pulse_sound: PulseSoundSettings,
    bridge: BridgeSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            pulse_sound: PulseSoundSettings::default(),
            bridge: BridgeSettings::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn pulse_sound(&self) -> PulseSoundSettings {
        self.data.read().unwrap().pulse_sound.clone()
    }

    pub fn bridge(&self) -> BridgeSettings {
        self.data.read().unwrap().bridge.clone()
    }

    pub fn update_pulse_sound(&self, settings: PulseSoundSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.pulse_sound = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    pub fn update_bridge(&self, settings: BridgeSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.bridge = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl SettingsStore {
    #[allow(dead_code)]
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}
