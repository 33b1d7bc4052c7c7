// Image listing record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub repo_tags: Vec<String>,
    pub repo_digests: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub size: i64,
    pub shared_size: i64,
    pub labels: HashMap<String, String>,
    #[serde(rename = "ParentID")]
    pub parent_id: String,
}
