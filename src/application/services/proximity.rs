//! Viewport-proximity trigger for lazy loading.

use tokio::sync::watch;

use crate::domain::entities::Rect;

/// Distance from the viewport at which lazy images start loading.
pub const DEFAULT_MARGIN: f32 = 50.0;

/// Publishes the page's viewport to every mounted image.
#[derive(Debug)]
pub struct ViewportTracker {
    tx: watch::Sender<Rect>,
}

impl ViewportTracker {
    /// Creates a tracker with the initial viewport.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        let (tx, _rx) = watch::channel(viewport);
        Self { tx }
    }

    /// Moves the viewport, waking observers whose element came into range.
    pub fn scroll_to(&self, viewport: Rect) {
        self.tx.send_replace(viewport);
    }

    /// Returns the current viewport.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        *self.tx.borrow()
    }

    /// Starts observing `element`.
    #[must_use]
    pub fn observe(&self, element: Rect, margin: f32) -> ProximityObserver {
        ProximityObserver {
            viewport: self.tx.subscribe(),
            element,
            margin,
        }
    }

    /// Number of observations still alive.
    #[must_use]
    pub fn observers(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One element's subscription to the viewport. Dropping it ends the
/// observation.
#[derive(Debug)]
pub struct ProximityObserver {
    viewport: watch::Receiver<Rect>,
    element: Rect,
    margin: f32,
}

impl ProximityObserver {
    /// Returns true if the element is currently within range.
    #[must_use]
    pub fn is_near(&self) -> bool {
        self.viewport.borrow().is_near(&self.element, self.margin)
    }

    /// Waits until the element comes within range.
    ///
    /// Returns false if the tracker went away first.
    pub async fn wait_until_near(&mut self) -> bool {
        let (element, margin) = (self.element, self.margin);
        self.viewport
            .wait_for(|viewport| viewport.is_near(&element, margin))
            .await
            .is_ok()
    }
}
