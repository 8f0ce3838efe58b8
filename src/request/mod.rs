pub mod common;
pub mod domains;
pub mod functions;
pub mod versions;

pub use common::{CustomRuntime, Region};
