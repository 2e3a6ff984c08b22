pub mod error;
pub mod http;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use state::AppState;
