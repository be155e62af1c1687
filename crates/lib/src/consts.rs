pub const APP_NAME: &str = "compkit";

/// Project config file read from the project root.
pub const CONFIG_FILENAME: &str = "compkit.json";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "COMPKIT_CONFIG";

/// Presence of this file in the project root switches on the typed pipeline.
pub const TYPED_PROJECT_MARKER: &str = "tsconfig.json";

pub const DEFAULT_SOURCE_DIR: &str = "src";
pub const DEFAULT_OUTPUT_DIR: &str = "lib";

/// Name of the transient miniapp tree, created under the output root.
pub const INTERMEDIATE_DIR_NAME: &str = "miniappTemp";

/// Entry file stem handed to the miniapp compiler, relative to a build root.
pub const ENTRY_STEM: &str = "index";

pub const MINIAPP_DIST_DIR: &str = "miniapp";

pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx"];
pub const TYPED_EXTENSIONS: &[&str] = &["ts", "tsx"];

pub const TEST_DIR_PATTERN: &str = "**/__tests__/**";
pub const DECLARATION_PATTERN: &str = "**/*.d.ts";
