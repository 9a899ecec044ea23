use serde::{Deserialize, Serialize};

// The single resource served by /data
pub const DATA_CACHE_KEY: &str = "myData";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshData {
    pub message: String,
}

impl FreshData {
    /// Stand-in for an upstream API call; recomputed on every cache miss.
    pub fn generate() -> Self {
        Self {
            message: "Hello, fresh data!".to_string(),
        }
    }
}

/// Where a payload came from, reported to the client alongside the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    #[serde(rename = "API")]
    Api,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub data: FreshData,
    pub source: Source,
}
