//! Run options and the settings derived from them.

use serde::{Deserialize, Serialize};

use crate::types::StructureConfig;

/// Options supplied by the caller of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOptions {
    pub strict_mode: bool,
    pub validate_paths: bool,
    pub hooks_enabled: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            validate_paths: false,
            hooks_enabled: true,
        }
    }
}

/// Effective switches for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Settings {
    pub strict_mode: bool,
    pub validate_paths: bool,
    pub hooks_enabled: bool,
}

impl ValidateOptions {
    /// Combine with the project's config file.
    ///
    /// Either source can turn strict mode and path validation on; either
    /// source can turn hooks off.
    pub fn settings(&self, config: &StructureConfig) -> Settings {
        Settings {
            strict_mode: self.strict_mode || config.strict_mode,
            validate_paths: self.validate_paths || config.validate_paths,
            hooks_enabled: self.hooks_enabled && config.hooks_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_merge() {
        let options = ValidateOptions::default();
        let mut config = StructureConfig::default();
        assert_eq!(
            options.settings(&config),
            Settings {
                strict_mode: false,
                validate_paths: false,
                hooks_enabled: true
            }
        );

        config.strict_mode = true;
        config.hooks_enabled = false;
        let settings = options.settings(&config);
        assert!(settings.strict_mode);
        assert!(!settings.hooks_enabled);

        let options = ValidateOptions {
            validate_paths: true,
            hooks_enabled: false,
            ..ValidateOptions::default()
        };
        let settings = options.settings(&StructureConfig::default());
        assert!(settings.validate_paths);
        assert!(!settings.hooks_enabled);
    }

    #[test]
    fn test_options_serialize_camel_case() {
        let json = serde_json::to_string(&ValidateOptions::default()).unwrap();
        assert_eq!(
            json,
            r#"{"strictMode":false,"validatePaths":false,"hooksEnabled":true}"#
        );
    }
}
