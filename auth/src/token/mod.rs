pub mod claims;
pub mod codec;
pub mod errors;
pub mod keys;
pub mod service;

pub use claims::Claims;
pub use claims::Role;
pub use claims::ISSUER;
pub use codec::TokenCodec;
pub use errors::RoleParseError;
pub use errors::TokenError;
pub use service::TokenService;
