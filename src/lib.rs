pub mod authz;
pub mod errors;

// Re-export commonly used items for callers and tests
pub use authz::{check_permission, render_gated, CheckContext, Role};
pub use errors::{AuthzError, AuthzResult};
