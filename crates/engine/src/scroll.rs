//! Decides whether the view should chase the newest message.
//!
//! A user who scrolled up to read history must not be yanked back down
//! by every arrival, so the follow decision is made from the scroll
//! position as it was when the message arrived, not from where the
//! view ends up afterwards.

/// A viewport counts as "at the bottom" within this distance.
pub const NEAR_BOTTOM_PX: f32 = 100.0;

/// The scroll geometry of the message list, as reported by the view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Scroll offset from the top of the content.
    pub scroll_top: f32,
    /// Total height of the content.
    pub scroll_height: f32,
    /// Height of the visible area.
    pub client_height: f32,
}

impl Viewport {
    /// Distance between the bottom edge of the visible area and the
    /// bottom of the content.
    #[inline]
    pub fn distance_to_bottom(self) -> f32 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}

/// Tracks whether the view is following the newest message.
pub struct FollowTracker {
    follow: bool,
}

impl FollowTracker {
    /// Creates a tracker that starts out following.
    #[inline]
    pub fn new() -> Self {
        Self { follow: true }
    }

    /// Re-derives the follow flag from the latest scroll geometry.
    #[inline]
    pub fn observe(&mut self, viewport: Viewport) {
        self.follow = viewport.distance_to_bottom() < NEAR_BOTTOM_PX;
    }

    /// Whether the view is currently following the bottom.
    #[inline]
    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// The scroll decision for one message arrival: scroll only if the
    /// view was following at that moment.
    #[inline]
    pub fn on_new_message(&self) -> bool {
        self.follow
    }

    /// A conversation switch always lands at the newest message.
    #[inline]
    pub fn on_conversation_switch(&mut self) {
        self.follow = true;
    }
}

impl Default for FollowTracker {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
