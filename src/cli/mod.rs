pub mod arguments;
pub mod commands;

pub use arguments::{InvocationParams, resolve_invocation, validate_ip};
pub use commands::{Cli, parse_args};
