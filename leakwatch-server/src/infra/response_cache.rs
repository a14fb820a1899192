//! List-response caching keyed by filter params and an entity version token.
//!
//! Keys embed the current version counter for the entity kind, so any bump
//! invalidates every cached page of that kind without issuing deletes; stale
//! entries simply age out on TTL.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TTL: Duration = Duration::from_secs(60 * 15);

#[derive(Clone)]
pub struct ResponseCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            ttl: DEFAULT_TTL,
        }
    }

    /// Cache key over the view name, the allowed filter params (already
    /// restricted by the caller to its filterset), pagination, and the
    /// version token.
    pub fn make_key(view: &str, params: &[(&str, String)], version: u64) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        let mut hasher = Sha256::new();
        hasher.update(view.as_bytes());
        for (name, value) in sorted {
            hasher.update(b"&");
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());

        format!("fcache:{view}:{digest}:v={version}")
    }

    /// Cache read; any Redis error degrades to a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    debug!(key, "response cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "dropping undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "response cache read failed");
                None
            }
        }
    }

    /// Cache write; errors are logged and swallowed, the response was
    /// already computed.
    pub async fn set(&self, key: &str, value: &Value) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize response for cache");
                return;
            }
        };
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, json, self.ttl.as_secs())
            .await
        {
            warn!(key, error = %e, "response cache write failed");
        }
    }
}
