// All repository functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` (direct query) and a `&mut Transaction` (atomic operations).

pub mod achievement;
pub mod comment;
pub mod content;
pub mod profile;
pub mod progress;
pub mod view;
