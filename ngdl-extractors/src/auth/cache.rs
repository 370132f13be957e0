use ahash::HashMap;
use bincode::{deserialize, serialize};
use ngdl_common::log::debug;
use ngdl_common::serde::{self, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{Error, SessionCookies};

/// Key-value store for login results, keyed by user name.
///
/// Entries carry their own time-to-live; expired entries read as missing.
pub trait LoginCache: Send + Sync {
    fn get(&self, key: &str) -> Option<SessionCookies>;

    fn set(&self, key: &str, value: &SessionCookies, ttl: Duration) -> Result<(), Error>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
struct CacheEntry {
    cookies: SessionCookies,
    /// Unix timestamp, in seconds.
    expires_at: u64,
}

impl CacheEntry {
    fn new(cookies: &SessionCookies, ttl: Duration) -> Self {
        Self {
            cookies: cookies.clone(),
            expires_at: (unix_now() + ttl).as_secs(),
        }
    }

    fn is_fresh(&self) -> bool {
        unix_now().as_secs() < self.expires_at
    }
}

fn unix_now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Cache that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryLoginCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl LoginCache for MemoryLoginCache {
    fn get(&self, key: &str) -> Option<SessionCookies> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.cookies.clone())
    }

    fn set(&self, key: &str, value: &SessionCookies, ttl: Duration) -> Result<(), Error> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        }
        Ok(())
    }
}

/// Cache persisted as a single `bincode` file.
#[derive(Debug)]
pub struct FileLoginCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLoginCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Cache file named after the site inside [`auth_cache_dir`](ngdl_common::auth_cache_dir).
    pub fn in_cache_dir(site_name: &str) -> Result<Self, Error> {
        Ok(Self::new(ngdl_common::auth_cache_dir()?.join(site_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> HashMap<String, CacheEntry> {
        let Ok(bytes) = fs::read(&self.path) else {
            return HashMap::default();
        };
        deserialize(&bytes).unwrap_or_else(|err| {
            debug!("Discarding unreadable login cache: {err}");
            HashMap::default()
        })
    }
}

impl LoginCache for FileLoginCache {
    fn get(&self, key: &str) -> Option<SessionCookies> {
        let _guard = self.lock.lock().ok()?;
        self.read_entries()
            .remove(key)
            .filter(CacheEntry::is_fresh)
            .map(|entry| entry.cookies)
    }

    fn set(&self, key: &str, value: &SessionCookies, ttl: Duration) -> Result<(), Error> {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries();
        entries.retain(|_, entry| entry.is_fresh());
        entries.insert(key.to_string(), CacheEntry::new(value, ttl));

        let Ok(bytes) = serialize(&entries) else {
            return Err(Error::CacheEncodeError);
        };
        fs::write(&self.path, bytes)?;
        debug!("Wrote login cache to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cookies() -> SessionCookies {
        SessionCookies(vec![
            ("NG_GG_username".into(), "tomfulp".into()),
            ("vmk1du5I8m".into(), "s3cr3t".into()),
        ])
    }

    #[test]
    fn memory_cache_expires() {
        let cache = MemoryLoginCache::default();
        cache.set("tomfulp", &cookies(), Duration::from_secs(60)).unwrap();
        cache.set("expired", &cookies(), Duration::ZERO).unwrap();

        assert_eq!(cache.get("tomfulp"), Some(cookies()));
        assert_eq!(cache.get("expired"), None);
        assert_eq!(cache.get("nobody"), None);
    }

    #[test]
    fn file_cache_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newgrounds");

        FileLoginCache::new(&path)
            .set("tomfulp", &cookies(), Duration::from_secs(60))
            .unwrap();

        let reopened = FileLoginCache::new(&path);
        assert_eq!(reopened.get("tomfulp"), Some(cookies()));
        assert_eq!(reopened.get("someone_else"), None);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("newgrounds");
        fs::write(&path, b"not bincode at all").unwrap();

        let cache = FileLoginCache::new(&path);
        assert_eq!(cache.get("tomfulp"), None);
        cache.set("tomfulp", &cookies(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("tomfulp"), Some(cookies()));
    }
}
