pub mod auth;
pub mod client;
pub mod normalize;
pub mod query;

pub use auth::{AuthApi, LoginResponse};
pub use client::ApiClient;
pub use normalize::{normalize, ListPage, ListResponse};
pub use query::ListQuery;
