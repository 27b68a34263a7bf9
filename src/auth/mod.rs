//! Login material: identity tokens, PKCE requests, cached credentials and
//! the localhost callback listener.

pub mod callback;
pub mod error;
pub mod id_token;
pub mod pkce;
pub mod store;
pub mod token;

pub use callback::{CallbackServer, FragmentCallback};
pub use error::AuthError;
pub use id_token::{Claims, IdToken, TokenError};
pub use pkce::AuthorizationRequest;
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
pub use token::Token;
