// handlers/admin - /admin/*, gated by the migration token
//
// Failures surface as 500 with the underlying message. Nothing is retried or
// rolled back beyond what the database itself does.

mod create_admin;
mod migrate;
mod tables;

pub use create_admin::create_admin;
pub use migrate::migrate;
pub use tables::tables;
