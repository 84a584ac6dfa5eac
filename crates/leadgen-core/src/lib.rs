//! Lead model, lifecycle, and deduplicating lead store.

pub mod app_config;
pub mod config;
pub mod error;
pub mod lead;
pub mod lifecycle;
pub mod normalize;
pub mod segments;
pub mod state;
pub mod store;
pub mod view;

pub use app_config::{AppConfig, DocumentStoreKind, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use lead::{
    BrandSearchPreference, ContactInfo, DraftKind, FollowUpKind, FollowUpLog, Lead,
    LeadCandidate, LeadOrigin, LeadStatus, TargetPreference, TargetType,
};
pub use lifecycle::{transition, LeadEvent};
pub use normalize::{ensure_absolute_url, normalize_name, normalize_url};
pub use segments::{load_segments, FollowUpAsset, Segment, SegmentsFile};
pub use state::LeadState;
pub use store::{Bucket, BucketCounts, LeadStore, LookupOutcome, TargetFilter};
pub use view::ViewCache;
