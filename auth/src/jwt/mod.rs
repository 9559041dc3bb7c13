pub mod claims;
pub mod errors;
pub mod handler;
pub mod issuer;
pub mod validator;

pub use claims::TokenClaims;
pub use errors::TokenError;
pub use handler::JwtHandler;
pub use issuer::TokenIssuer;
pub use validator::TokenValidator;
