//! Gallery view state for the portfolio: card rendering, tag filtering,
//! the detail/fullscreen viewer and the admin CRUD controller.
//!
//! Everything here is free of I/O except the admin controller, which talks
//! to the record store through the `api_client` traits. Timers are returned
//! as [`Effect`]s for the host to schedule.

pub mod admin;
pub mod binding;
pub mod filter;
pub mod form;
mod gallery;
pub mod render;
pub mod view;
pub mod viewer;

pub use admin::{AdminController, AdminError, Notice, PendingDelete};
pub use binding::{Anchor, BindError, ViewBinding};
pub use filter::{FilterBar, FilterValue, ALL_FILTER};
pub use form::{FormError, FormMode, ImageSource, PhotoForm};
pub use gallery::{Gallery, GalleryEvent, GalleryState};
pub use render::{render_cards, GalleryCard};
pub use view::{render, GalleryView};
pub use viewer::{
    Direction, Effect, Key, Origin, Timer, Transient, Viewer, ViewerEvent, ViewerMode,
    CLOSE_ANIMATION_DELAY, INFO_REVEAL_DELAY, SETTLE_DELAY,
};
