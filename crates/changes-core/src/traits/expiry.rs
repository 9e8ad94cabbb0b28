//! Expiry tracking - decides when an abandoned connection may be reclaimed

/// Tracks how long each connection id has been missing
pub trait ExpiryTracker: Send + Sync {
    /// The id is alive; any running expiry window is cancelled
    fn seen(&self, id: &str);

    /// The id has no live transport; its expiry window starts now unless
    /// a later `seen` resets it
    fn missing(&self, id: &str);

    /// Invoke `action` once per id whose window has elapsed as of this call
    ///
    /// Reported ids are forgotten by the tracker.
    fn for_all_expired(&self, action: &mut dyn FnMut(&str));
}
