//! Navigation over a broadcast channel.
//!
//! The core only asks for "go to login"; a front end subscribes here and
//! performs the actual screen change.

use tokio::sync::broadcast;
use tracing::{debug, info};
use warden_application::ports::Navigator;

const DEFAULT_CAPACITY: usize = 16;

/// Navigation requested by the authentication core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// Show the login screen.
    Login,
}

/// [`Navigator`] publishing [`NavigationEvent`]s to subscribers.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    sender: broadcast::Sender<NavigationEvent>,
}

impl ChannelNavigator {
    /// Creates a navigator buffering up to `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to navigation events sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChannelNavigator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect_to_login(&self) {
        info!("redirecting to login");
        if self.sender.send(NavigationEvent::Login).is_err() {
            debug!("no navigation subscribers");
        }
    }
}
