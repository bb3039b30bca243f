use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection details for a remote deployment host.
///
/// Stored for a future remote mode; nothing consumes these yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub ssh_key_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemoteTarget {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub ssh_key_path: Option<String>,
}
