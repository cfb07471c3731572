//! Resource ceilings shared by the parsers, generator and glob matcher.

/// Largest document either parser accepts (1 MiB)
pub const MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Longest free-text value the generator emits
pub const MAX_VALUE_LENGTH: usize = 500;

/// Longest glob pattern the matcher compiles
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// Longest path the matcher tests
pub const MAX_PATH_LENGTH: usize = 2000;
