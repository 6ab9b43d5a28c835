use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One known image: the identity key and the URL it was uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogEntry {
    pub identity_key: String,
    pub remote_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
