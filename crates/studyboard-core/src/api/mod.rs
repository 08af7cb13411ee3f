//! REST clients for the two hosted services the dashboard reads from.
//!
//! - `GithubClient` lists the files in each member's repository and
//!   implements [`RepoLister`](crate::aggregator::RepoLister).
//! - `SupabaseClient` talks PostgREST to the hosted database and
//!   implements [`BoardStore`](crate::board::BoardStore).
//!
//! Both authenticate with a bearer token and share `ApiError`.

pub mod error;
pub mod github;
pub mod supabase;

pub use error::ApiError;
pub use github::GithubClient;
pub use supabase::SupabaseClient;
