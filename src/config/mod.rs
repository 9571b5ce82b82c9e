pub mod builtin;
pub mod loader;
pub mod schema;

pub use builtin::{builtin, discover, resolve, Builtin, Origin, BUILTINS};
pub use loader::{load_from_path, load_from_str, parse_str, ConfigError};
pub use schema::{
    ExpectationDefinition, MatchDefinition, Metadata, ReplacementDefinition, RuleDefinition,
    RuleSetConfig,
};
