pub mod errors;
pub mod pbkdf2;

pub use errors::PasswordError;
pub use self::pbkdf2::PasswordHasher;
