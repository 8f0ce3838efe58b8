pub mod builder;
pub mod defs;
pub mod impls;
pub mod merge;

pub const FUNCTION_NAME_PATTERN: &str = "^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$";

pub use builder::{build, normalize_env, normalize_layers};
pub use defs::{DeploymentDescriptor, DescriptorError, FunctionProps};
pub use impls::{auto_domain_name, validate_function_name};
pub use merge::{merge, merge_file};
