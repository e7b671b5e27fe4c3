//! Storage backends.
//!
//! - `LocalFileStore` - local filesystem (via OpenDAL `fs`)
//! - `R2FileStore` - Cloudflare R2 (via OpenDAL `s3`)
//! - `SupabaseFileStore` - Supabase Storage REST API (via `reqwest`)

mod local;
mod r2;
mod supabase;

pub use local::LocalFileStore;
pub use r2::R2FileStore;
pub use supabase::SupabaseFileStore;
