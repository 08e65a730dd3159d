pub mod credentials;
pub mod extractor;
pub mod handlers;
pub mod token;
pub mod validation;

pub use extractor::AuthUser;
pub use token::TokenService;
