//! Integration tests for the built-in rule sets and the filesystem pipeline.

mod landing_ruleset;
mod pipeline_fs;
