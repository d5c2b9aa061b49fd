pub mod handlers;
pub mod middleware;
pub mod model;
pub mod provider;
pub mod session;


pub use middleware::*;
pub use model::*;
pub use provider::{GoogleProvider, IdentityProvider};
pub use session::*;
