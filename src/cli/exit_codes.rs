//! exit codes for suprform commands
//!
//! these follow Unix conventions where 0 = success and non-zero = error
//! specific codes help scripts distinguish between failure types

/// command completed successfully
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// invalid command-line arguments (bad --values, malformed --set)
pub const INVALID_ARGS: i32 = 2;

/// form definition could not be parsed, resolved or verified
pub const CONFIG_ERROR: i32 = 3;

/// form definition file doesn't exist
pub const FILE_NOT_FOUND: i32 = 4;
