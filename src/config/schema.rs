//! Configuration schema types for `posepaint.toml`
//!
//! Defines the structure and validation rules for a posepaint project.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::chain::ChainStep;
use crate::mapping::Rounding;
use crate::silhouette::{KeepRule, SilhouetteOptions, MAX_ERODE_PASSES};
use crate::transfer::{TransferMode, TransferOptions};

/// Highest accepted `transfer.retries`.
pub const MAX_RETRIES: u8 = 5;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosepaintConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub mask: MaskConfig,
    /// Frame chains keyed by character name
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterConfig>,
}

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Output directory for rendered frames
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

/// Transfer engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default)]
    pub mode: TransferMode,
    #[serde(default)]
    pub rounding: Rounding,
    /// Extra load attempts per chained frame
    #[serde(default = "default_retries")]
    pub retries: u8,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            mode: TransferMode::default(),
            rounding: Rounding::default(),
            retries: default_retries(),
        }
    }
}

fn default_retries() -> u8 {
    1
}

impl TransferConfig {
    pub fn options(&self) -> TransferOptions {
        TransferOptions { mode: self.mode, rounding: self.rounding }
    }
}

/// Silhouette mask settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskConfig {
    #[serde(default = "default_erode")]
    pub erode: u8,
    #[serde(default)]
    pub keep: KeepRule,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self { erode: default_erode(), keep: KeepRule::default() }
    }
}

fn default_erode() -> u8 {
    1
}

impl MaskConfig {
    pub fn silhouette(&self) -> SilhouetteOptions {
        SilhouetteOptions { keep: self.keep.clone(), erode: self.erode }
    }
}

/// One character's frame chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    /// Directory the asset locations are relative to
    #[serde(default)]
    pub dir: PathBuf,
    /// Region map of the painted base pose
    pub base_map: String,
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
}

/// A target pose in a chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub target: String,
    pub target_map: String,
}

impl CharacterConfig {
    /// Chain steps for this character.
    ///
    /// Each step transfers from the pose before it, so its source map is the previous
    /// frame's target map (the base map for the first step). The painted base is frame 1,
    /// so unnamed frames are numbered from 2.
    pub fn chain_steps(&self) -> Vec<ChainStep> {
        let mut source_map = self.base_map.clone();
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| ChainStep {
                name: frame.name.clone().unwrap_or_else(|| format!("frame{}", i + 2)),
                source_map: std::mem::replace(&mut source_map, frame.target_map.clone()),
                target: frame.target.clone(),
                target_map: frame.target_map.clone(),
            })
            .collect()
    }
}

/// Validation error for config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "characters.hare.frames[2].target")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "posepaint.toml: '{}' {}", self.field, self.message)
    }
}

impl PosepaintConfig {
    /// Validate the configuration and return every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigValidationError { field, message: message.to_string() });
        };

        if self.project.name.trim().is_empty() {
            push("project.name".into(), "must be a non-empty string");
        }

        if self.transfer.retries > MAX_RETRIES {
            push("transfer.retries".into(), "must be between 0 and 5");
        }

        if self.mask.erode > MAX_ERODE_PASSES {
            push("mask.erode".into(), "must be between 0 and 3");
        }
        if let KeepRule::Blocks(ids) = &self.mask.keep {
            if ids.is_empty() {
                push("mask.keep".into(), "must list at least one block");
            } else if ids.contains(&0) {
                push("mask.keep".into(), "block IDs must be positive");
            }
        }

        for (name, character) in &self.characters {
            if character.base_map.trim().is_empty() {
                push(format!("characters.{}.base_map", name), "must not be empty");
            }
            if character.frames.is_empty() {
                push(format!("characters.{}.frames", name), "must contain at least one frame");
            }
            for (i, frame) in character.frames.iter().enumerate() {
                if frame.target.trim().is_empty() {
                    push(format!("characters.{}.frames[{}].target", name, i), "must not be empty");
                }
                if frame.target_map.trim().is_empty() {
                    push(format!("characters.{}.frames[{}].target_map", name, i), "must not be empty");
                }
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn character(&self, name: &str) -> Option<&CharacterConfig> {
        self.characters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let toml = r#"
[project]
name = "test-project"
"#;
        let config: PosepaintConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "test-project");
        assert_eq!(config.project.out, PathBuf::from("build"));
        assert_eq!(config.transfer.mode, TransferMode::Sample);
        assert_eq!(config.transfer.rounding, Rounding::Round);
        assert_eq!(config.transfer.retries, 1);
        assert_eq!(config.mask.erode, 1);
        assert_eq!(config.mask.keep, KeepRule::Positive);
        assert!(config.characters.is_empty());
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[project]
name = "tortoise-hare"
out = "dist"

[transfer]
mode = "average"
rounding = "floor"
retries = 3

[mask]
erode = 2
keep = "non-zero"

[characters.tortoise]
dir = "images/frames/tortoise"
base_map = "mask_1.csv"

[[characters.tortoise.frames]]
name = "walk"
target = "tortoise2.png"
target_map = "mask_2.csv"

[[characters.tortoise.frames]]
target = "tortoise3.png"
target_map = "mask_3.csv"
"#;
        let config: PosepaintConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.project.out, PathBuf::from("dist"));
        assert_eq!(config.transfer.mode, TransferMode::Average);
        assert_eq!(config.transfer.rounding, Rounding::Floor);
        assert_eq!(config.transfer.retries, 3);
        assert_eq!(config.mask.erode, 2);
        assert_eq!(config.mask.keep, KeepRule::NonZero);

        let tortoise = config.character("tortoise").unwrap();
        assert_eq!(tortoise.dir, PathBuf::from("images/frames/tortoise"));
        assert_eq!(tortoise.frames.len(), 2);
        assert!(config.is_valid());
    }

    #[test]
    fn test_chain_steps_link_maps() {
        let toml = r#"
[project]
name = "p"

[characters.hare]
base_map = "mask_1.csv"

[[characters.hare.frames]]
target = "hare2.png"
target_map = "mask_2.csv"

[[characters.hare.frames]]
name = "leap"
target = "hare3.png"
target_map = "mask_3.csv"
"#;
        let config: PosepaintConfig = toml::from_str(toml).unwrap();
        let steps = config.character("hare").unwrap().chain_steps();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "frame2");
        assert_eq!(steps[0].source_map, "mask_1.csv");
        assert_eq!(steps[0].target_map, "mask_2.csv");
        assert_eq!(steps[1].name, "leap");
        assert_eq!(steps[1].source_map, "mask_2.csv");
        assert_eq!(steps[1].target, "hare3.png");
    }

    #[test]
    fn test_keep_blocks_uses_command_line_syntax() {
        let config: PosepaintConfig =
            toml::from_str("[project]\nname = \"p\"\n[mask]\nkeep = \"blocks:4, 2\"\n").unwrap();
        assert_eq!(config.mask.keep, KeepRule::Blocks([2, 4].into_iter().collect()));
        assert!(config.is_valid());

        let bad = toml::from_str::<PosepaintConfig>("[project]\nname = \"p\"\n[mask]\nkeep = \"blocks:0\"\n");
        assert!(bad.is_err());
    }

    #[test]
    fn test_options_from_sections() {
        let config: PosepaintConfig = toml::from_str(
            "[project]\nname = \"p\"\n[transfer]\nmode = \"average\"\n[mask]\nerode = 0\n",
        )
        .unwrap();
        assert_eq!(config.transfer.options().mode, TransferMode::Average);
        assert_eq!(config.mask.silhouette(), SilhouetteOptions { keep: KeepRule::Positive, erode: 0 });
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let toml = r#"
[project]
name = ""

[transfer]
retries = 9

[mask]
erode = 4

[characters.ghost]
base_map = ""
"#;
        let config: PosepaintConfig = toml::from_str(toml).unwrap();
        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "project.name",
                "transfer.retries",
                "mask.erode",
                "characters.ghost.base_map",
                "characters.ghost.frames",
            ]
        );
    }

    #[test]
    fn test_validation_empty_frame_locations() {
        let toml = r#"
[project]
name = "p"

[characters.hare]
base_map = "mask_1.csv"

[[characters.hare.frames]]
target = ""
target_map = "mask_2.csv"
"#;
        let config: PosepaintConfig = toml::from_str(toml).unwrap();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "characters.hare.frames[0].target");
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let result: Result<PosepaintConfig, _> =
            toml::from_str("[project]\nname = \"p\"\n[transfer]\nmode = \"blend\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError { field: "mask.erode".into(), message: "must be between 0 and 3".into() };
        assert_eq!(err.to_string(), "posepaint.toml: 'mask.erode' must be between 0 and 3");
    }
}
