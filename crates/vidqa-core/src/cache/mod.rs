//! Expiring result cache and the memoizing wrapper built on it.

mod cached;
mod key;
mod keyed;

pub use cached::{CachePolicy, Cacheable, CachedOperation};
pub use key::{CacheKey, CacheKeyBuilder};
pub use keyed::{CacheEntry, KeyedCache};
