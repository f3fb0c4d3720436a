// SPDX-License-Identifier: GPL-3.0-only

//! Externally toggled online/offline flag

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Value published on the connectivity channel
///
/// A watch channel only keeps the latest value, so a quick
/// online-offline-online burst would look unchanged to a slow reader.
/// `reconnects` counts offline to online edges so the reader can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkState {
    pub online: bool,
    pub reconnects: u64,
}

/// Online/offline flag that publishes edge changes only
#[derive(Clone)]
pub struct Connectivity {
    sender: Arc<watch::Sender<LinkState>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(LinkState {
            online,
            reconnects: 0,
        });
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn is_online(&self) -> bool {
        self.sender.borrow().online
    }

    /// Set the flag. Returns true if the value changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|link| {
            if link.online == online {
                return false;
            }
            link.online = online;
            if online {
                link.reconnects += 1;
            }
            true
        });

        if changed {
            info!(online, "Connectivity changed");
        }
        changed
    }

    /// Receiver that is woken on every change
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.sender.subscribe()
    }
}

impl std::fmt::Debug for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connectivity")
            .field("link", &*self.sender.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_edges_publish() {
        let connectivity = Connectivity::new(true);
        let mut rx = connectivity.subscribe();

        assert!(!connectivity.set_online(true));
        assert!(!rx.has_changed().unwrap());

        assert!(connectivity.set_online(false));
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().online);
        assert!(!connectivity.is_online());
    }

    #[tokio::test]
    async fn test_reconnects_survive_collapsed_updates() {
        let connectivity = Connectivity::new(true);
        let mut rx = connectivity.subscribe();

        connectivity.set_online(false);
        connectivity.set_online(true);

        let link = *rx.borrow_and_update();
        assert!(link.online);
        assert_eq!(link.reconnects, 1);
    }
}
