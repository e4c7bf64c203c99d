//! Optional observer hooks the dispatcher consults for the handful of
//! messages it interprets inline rather than queuing to the brigade.

use crate::error::DisconnectedError;

/// Observer hooks a [`crate::session::Session`] may register.
///
/// Every field is independently optional; a [`Default`]-constructed
/// `Callbacks` observes nothing and lets every inline message take its
/// default action (discard).
#[derive(Default)]
pub struct Callbacks {
    disconnect: Option<Box<dyn FnMut(&DisconnectedError) + Send>>,
    ignore: Option<Box<dyn FnMut(&[u8]) + Send>>,
    debug: Option<Box<dyn FnMut(bool, &[u8], &[u8]) + Send>>,
    mac_error: Option<Box<dyn FnMut() -> bool + Send>>,
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("disconnect", &self.disconnect.is_some())
            .field("ignore", &self.ignore.is_some())
            .field("debug", &self.debug.is_some())
            .field("mac_error", &self.mac_error.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook invoked when a `DISCONNECT` message is received.
    pub fn on_disconnect(mut self, f: impl FnMut(&DisconnectedError) + Send + 'static) -> Self {
        self.disconnect = Some(Box::new(f));
        self
    }

    /// Register a hook invoked with the embedded data of every `IGNORE`
    /// message received.
    pub fn on_ignore(mut self, f: impl FnMut(&[u8]) + Send + 'static) -> Self {
        self.ignore = Some(Box::new(f));
        self
    }

    /// Register a hook invoked with `(always_display, message, language)` for
    /// every `DEBUG` message received.
    pub fn on_debug(mut self, f: impl FnMut(bool, &[u8], &[u8]) + Send + 'static) -> Self {
        self.debug = Some(Box::new(f));
        self
    }

    /// Register a hook consulted when a frame's MAC fails to verify. If it
    /// returns `true`, the frame is treated as if the MAC had matched.
    pub fn on_mac_error(mut self, f: impl FnMut() -> bool + Send + 'static) -> Self {
        self.mac_error = Some(Box::new(f));
        self
    }

    pub(crate) fn disconnected(&mut self, err: &DisconnectedError) {
        if let Some(cb) = self.disconnect.as_mut() {
            cb(err);
        }
    }

    pub(crate) fn ignored(&mut self, data: &[u8]) {
        if let Some(cb) = self.ignore.as_mut() {
            cb(data);
        }
    }

    pub(crate) fn debugged(&mut self, always_display: bool, message: &[u8], language: &[u8]) {
        if let Some(cb) = self.debug.as_mut() {
            cb(always_display, message, language);
        }
    }

    /// Consult the mac-error hook, if any; `false` if none is registered.
    pub(crate) fn mac_error_rescued(&mut self) -> bool {
        self.mac_error.as_mut().map(|cb| cb()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_mac_error_hook_never_rescues() {
        let mut callbacks = Callbacks::new();
        assert!(!callbacks.mac_error_rescued());
    }

    #[test]
    fn registered_ignore_hook_is_invoked() {
        let mut seen = Vec::new();
        let mut callbacks = Callbacks::new().on_ignore(|data| seen.push(data.to_vec()));

        callbacks.ignored(b"hello");
        drop(callbacks);

        assert_eq!(seen, vec![b"hello".to_vec()]);
    }
}
