//! Wall-clock effect.

/// Source of the current time.
pub trait TimeEffects: Send + Sync {
    /// Seconds since the Unix epoch
    fn now_unix_secs(&self) -> u64;
}

impl<T: TimeEffects + ?Sized> TimeEffects for std::sync::Arc<T> {
    fn now_unix_secs(&self) -> u64 {
        (**self).now_unix_secs()
    }
}
