pub mod cache;
pub mod capability;
pub mod client;
pub mod config;
pub mod credential;
pub mod draft;
pub mod error;
pub mod gate;
pub mod monitor;
pub mod navigation;
pub mod policy;
pub mod session;
pub mod views;

// Re-export commonly used items
pub use cache::{CacheEntry, CacheEvent, CacheKey, EntityCache, EntryStatus, PredictionScope};
pub use capability::{Capabilities, NavEntry, Target};
pub use client::ApiClient;
pub use config::{load_config, ClientConfig};
pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use draft::{DraftBuffer, DraftTarget};
pub use error::ApiError;
pub use gate::{AuthorizationGate, GateDecision, ViewOutcome};
pub use monitor::SessionMonitor;
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use policy::Mutation;
pub use session::Session;
