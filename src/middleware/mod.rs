pub mod admin;
pub mod auth;
pub mod extract;
pub mod response;
pub mod security;

pub use admin::require_migration_token;
pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::{CleanPath, ValidatedJson, ValidatedQuery};
pub use response::{ApiResponse, ApiResult};
pub use security::{limit_body_size, sanitize_request, with_security_headers};
