pub mod context;
pub mod guard;
pub mod jwt;
pub mod middleware;

pub use context::AuthContext;
pub use jwt::{Claims, JwtManager, TokenError};
pub use middleware::{auth_middleware, AuthState};
