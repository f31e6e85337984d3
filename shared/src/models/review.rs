//! Supply review models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member's review of a supply item, carried into its history on archival
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub supply_id: Uuid,
    pub user_id: Uuid,

    /// 1 to 5 stars
    pub rating: i16,

    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
