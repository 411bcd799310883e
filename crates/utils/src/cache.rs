use std::path::PathBuf;

/// Well-known on-disk locations used by `sdb` hosts.
///
/// The engine itself is purely in-memory (see the engine's concurrency
/// notes); these paths are for host-side bookkeeping only, not engine state.
/// Every `evaluate()` call always recompiles from scratch (its wrapper name
/// is nonce-unique per session, so there's nothing stable to key a cache on)
/// — there is no eval-artifact cache here, unlike the teacher's RPC/Etherscan
/// response cache.
pub struct CachePath {}

impl CachePath {
    /// Returns the path to sdb's cache dir: `~/.sdb/cache`.
    pub fn sdb_cache_dir() -> Option<PathBuf> {
        dirs_next::home_dir().map(|p| p.join(".sdb").join("cache"))
    }

    /// Returns the path to sdb's session log dir: `~/.sdb/cache/logs`.
    pub fn sdb_log_dir() -> Option<PathBuf> {
        Some(Self::sdb_cache_dir()?.join("logs"))
    }
}
