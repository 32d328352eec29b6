mod auth;
mod session;
mod storage;
mod store;

pub use auth::TokenManager;
pub use auth::TokenState;
pub use session::ConversionReport;
pub use session::ScanResult;
pub use session::ScanSession;
pub use storage::FileStore;
pub use storage::KeyValueStore;
pub use storage::MemoryStore;
pub use store::KEY_ACCESS_TOKEN;
pub use store::KEY_CODE_VERIFIER;
pub use store::KEY_EXPIRES_IN;
pub use store::KEY_OBTAINED_AT;
pub use store::KEY_REFRESH_TOKEN;
pub use store::TokenStore;
