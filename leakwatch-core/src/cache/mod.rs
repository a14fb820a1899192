pub mod versions;

pub use versions::{CacheVersions, EntityKind, InMemoryCacheVersions, RedisCacheVersions};
