// Copyright (c) 2018-2025 The Botho Foundation

//! Key keeper and host configuration

use anyhow::{anyhow, bail, Context, Result};
use bth_keykeeper_core::Kdf;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use zeroize::Zeroizing;

use crate::Error;

/// Largest supported nonce slot pool
pub const MAX_SLOTS: u32 = 1024;

/// Settings of the key keeper itself
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyKeeperConfig {
    /// Number of nonce slots, 1 to [`MAX_SLOTS`]
    #[serde(default = "default_num_slots")]
    pub num_slots: u32,

    /// Accept inputs whose blinding factor lacks the switch-commitment
    /// tweak. Off by default; outputs are never produced weak.
    #[serde(default)]
    pub allow_weak_inputs: bool,
}

fn default_num_slots() -> u32 {
    64
}

impl Default for KeyKeeperConfig {
    fn default() -> Self {
        Self {
            num_slots: default_num_slots(),
            allow_weak_inputs: false,
        }
    }
}

impl KeyKeeperConfig {
    /// Check the settings are usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_slots == 0 || self.num_slots > MAX_SLOTS {
            return Err(Error::InvalidParameter("num_slots"));
        }
        Ok(())
    }
}

/// Configuration of the `keykeeper-host` emulator
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HostConfig {
    /// BIP39 mnemonic phrase (24 words)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,

    /// Raw master seed, hex encoded, used when no mnemonic is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_hex: Option<String>,

    /// Approve every spend without prompting
    #[serde(default)]
    pub auto_approve: bool,

    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,

    /// Key keeper settings
    #[serde(default)]
    pub keykeeper: KeyKeeperConfig,
}

impl HostConfig {
    /// Default location: `~/.botho/keykeeper.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".botho").join("keykeeper.toml"))
    }

    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .keykeeper
            .validate()
            .map_err(|e| anyhow!("Invalid key keeper settings in {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        // The file holds the master secret
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// Master key-derivation function described by this config
    pub fn kdf(&self) -> Result<Kdf> {
        match (&self.mnemonic, &self.seed_hex) {
            (Some(phrase), _) => Kdf::from_phrase(phrase).map_err(|e| anyhow!("{}", e)),
            (None, Some(seed_hex)) => {
                let seed = Zeroizing::new(
                    hex::decode(seed_hex.trim()).context("Seed is not valid hex")?,
                );
                Kdf::from_seed(&seed).map_err(|e| anyhow!("{}", e))
            }
            (None, None) => bail!("Config holds neither a mnemonic nor a seed"),
        }
    }
}
