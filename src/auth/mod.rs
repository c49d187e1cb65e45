//! Authentication: password hashing, token issuance/verification,
//! identity resolution, and the account handlers.

pub mod handlers;
pub mod password;
pub mod service;
pub mod token;

pub use password::PasswordHasher;
pub use service::{AuthService, Identity};
pub use token::{Claims, TokenService};
