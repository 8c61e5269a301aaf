//! Client options: proving-artifact locations and the Apply batch limit.
//!
//! Defaults can be overridden from a JSON file ([`SdkOptions::load`]) or from
//! the environment ([`SdkOptions::from_env`]).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ct_common::{CircuitId, DEFAULT_MAX_PENDING_TRANSFERS_APPLY};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

pub const HELPERS_PATH_ENV: &str = "CT_SDK_HELPERS_PATH";
pub const KEYS_PATH_ENV: &str = "CT_SDK_KEYS_PATH";
pub const MAX_APPLY_ENV: &str = "CT_SDK_MAX_APPLY";
const DEFAULT_HELPERS_PATH: &str = "circuits/helpers";
const DEFAULT_KEYS_PATH: &str = "circuits/keys";

/// Where the witness generators and proving keys live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub helpers: PathBuf,
    pub keys: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            helpers: PathBuf::from(DEFAULT_HELPERS_PATH),
            keys: PathBuf::from(DEFAULT_KEYS_PATH),
        }
    }
}

impl ArtifactPaths {
    /// `{helpers}/{name}_js/{name}.wasm`
    pub fn wasm_path(&self, circuit: CircuitId) -> PathBuf {
        let name = circuit.name();
        self.helpers
            .join(format!("{name}_js"))
            .join(format!("{name}.wasm"))
    }

    /// `{keys}/{name}/{name}_final.zkey`
    pub fn zkey_path(&self, circuit: CircuitId) -> PathBuf {
        let name = circuit.name();
        self.keys.join(name).join(format!("{name}_final.zkey"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkOptions {
    #[serde(default = "default_max_apply")]
    pub max_pending_transfers_apply: usize,
    #[serde(default)]
    pub paths: ArtifactPaths,
}

fn default_max_apply() -> usize {
    DEFAULT_MAX_PENDING_TRANSFERS_APPLY
}

impl Default for SdkOptions {
    fn default() -> Self {
        Self {
            max_pending_transfers_apply: DEFAULT_MAX_PENDING_TRANSFERS_APPLY,
            paths: ArtifactPaths::default(),
        }
    }
}

impl SdkOptions {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        let options: SdkOptions = serde_json::from_slice(&bytes)?;
        options.validate()?;
        Ok(options)
    }

    /// Defaults with any `CT_SDK_*` overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut options = SdkOptions::default();
        if let Ok(helpers) = env::var(HELPERS_PATH_ENV) {
            options.paths.helpers = PathBuf::from(helpers);
        }
        if let Ok(keys) = env::var(KEYS_PATH_ENV) {
            options.paths.keys = PathBuf::from(keys);
        }
        if let Some(max) = parse_env_usize(MAX_APPLY_ENV)? {
            options.max_pending_transfers_apply = max;
        }
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.max_pending_transfers_apply == 0 {
            return Err(SdkError::Config(
                "max_pending_transfers_apply must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_env_usize(var: &str) -> Result<Option<usize>> {
    match env::var(var) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| SdkError::Config(format!("{var}={value}: {err}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_follow_circuit_names() {
        let paths = ArtifactPaths {
            helpers: PathBuf::from("/h"),
            keys: PathBuf::from("/k"),
        };
        assert_eq!(
            paths.wasm_path(CircuitId::ApplyAndTransfer),
            PathBuf::from("/h/applyAndTransfer_js/applyAndTransfer.wasm")
        );
        assert_eq!(
            paths.zkey_path(CircuitId::Init),
            PathBuf::from("/k/init/init_final.zkey")
        );
    }

    #[test]
    fn json_defaults_missing_fields() {
        let options: SdkOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, SdkOptions::default());
        assert_eq!(options.max_pending_transfers_apply, 10);

        let options: SdkOptions = serde_json::from_str(
            r#"{"maxPendingTransfersApply": 3, "paths": {"helpers": "a", "keys": "b"}}"#,
        )
        .unwrap();
        assert_eq!(options.max_pending_transfers_apply, 3);
        assert_eq!(options.paths.keys, PathBuf::from("b"));
    }

    #[test]
    fn zero_batch_limit_is_rejected() {
        let options = SdkOptions {
            max_pending_transfers_apply: 0,
            ..SdkOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
