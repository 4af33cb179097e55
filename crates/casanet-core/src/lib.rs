// casanet-core: Observable data services between casanet-api and consumers (CLI).

pub mod config;
pub mod error;
pub mod hub;
pub mod model;
pub mod notifications;
pub mod resources;
pub mod service;
pub mod session;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{HubConfig, TlsVerification};
pub use error::CoreError;
pub use hub::Hub;
pub use notifications::{Notification, NotificationLevel, Notifier};
pub use resources::{
    BluetoothService, DevicesService, FeedOptions, MinionsService, TimingsService, new_timing_id,
};
pub use service::{DataService, Fetch, FetchFn, FetchOutcome, ServiceStatus, SubscriptionId};
pub use session::{FileSessionStore, MemorySessionStore, SessionKey, SessionManager, SessionStore};
pub use stream::{CollectionStream, UseData};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BluetoothDevice, DaysOptions, LocalNetworkDevice, Minion, MinionStatus, MinionTypes,
    SwitchOptions, Timing, TimingFeed, TimingProperties, TimingTypes, User,
};
