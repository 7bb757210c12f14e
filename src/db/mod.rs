//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// Sales funnels (keyed by funnel ID)
    pub const SALES_FUNNELS: &str = "sales_funnels";
    /// Leads (keyed by `{funnel_id}_{email}`)
    pub const LEADS: &str = "leads";
    /// Encrypted platform credentials (keyed by `{user_id}_{platform}`)
    pub const PLATFORM_CONNECTIONS: &str = "platform_connections";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    pub const USAGE_RECORDS: &str = "usage_records";
}
