//! Domain layer - DB queries, one module per aggregate
//!
//! All query functions use the generic Executor pattern, allowing them to
//! work with both `&PgPool` (standalone queries) and `&mut PgConnection`
//! (transactions).

pub mod accounts;
pub mod approvals;
pub mod sessions;
pub mod users;
