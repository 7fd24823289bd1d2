//! Named view anchors the gallery drives, checked once at setup.

use crate::viewer::Capabilities;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anchor {
    Gallery,
    FilterBar,
    FullscreenModal,
    FullscreenImage,
    InfoPanel,
    InfoTitle,
    InfoDescription,
    InfoPrice,
    InfoLocation,
    PrevControl,
    NextControl,
    CloseControl,
    DetailModal,
    DetailImage,
    DetailTitle,
    DetailDescription,
    ViewLargeControl,
}

impl Anchor {
    pub const ALL: [Anchor; 17] = [
        Anchor::Gallery,
        Anchor::FilterBar,
        Anchor::FullscreenModal,
        Anchor::FullscreenImage,
        Anchor::InfoPanel,
        Anchor::InfoTitle,
        Anchor::InfoDescription,
        Anchor::InfoPrice,
        Anchor::InfoLocation,
        Anchor::PrevControl,
        Anchor::NextControl,
        Anchor::CloseControl,
        Anchor::DetailModal,
        Anchor::DetailImage,
        Anchor::DetailTitle,
        Anchor::DetailDescription,
        Anchor::ViewLargeControl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::Gallery => "gallery",
            Anchor::FilterBar => "filter-bar",
            Anchor::FullscreenModal => "fullscreen-modal",
            Anchor::FullscreenImage => "fullscreen-image",
            Anchor::InfoPanel => "fullscreen-info",
            Anchor::InfoTitle => "fullscreen-title",
            Anchor::InfoDescription => "fullscreen-description",
            Anchor::InfoPrice => "fullscreen-price",
            Anchor::InfoLocation => "fullscreen-location",
            Anchor::PrevControl => "prev-photo",
            Anchor::NextControl => "next-photo",
            Anchor::CloseControl => "close-fullscreen",
            Anchor::DetailModal => "detail-modal",
            Anchor::DetailImage => "detail-image",
            Anchor::DetailTitle => "detail-title",
            Anchor::DetailDescription => "detail-description",
            Anchor::ViewLargeControl => "view-large",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Bind Error: required anchor `{0}` is missing")]
    MissingAnchor(Anchor),
}

/// The anchors a host actually provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewBinding {
    present: BTreeSet<Anchor>,
}

impl ViewBinding {
    /// Without these the gallery cannot run at all.
    pub const REQUIRED: [Anchor; 3] = [
        Anchor::Gallery,
        Anchor::FullscreenModal,
        Anchor::FullscreenImage,
    ];

    pub fn bind<I>(anchors: I) -> Result<Self, BindError>
    where
        I: IntoIterator<Item = Anchor>,
    {
        let present: BTreeSet<Anchor> = anchors.into_iter().collect();
        if let Some(missing) = Self::REQUIRED.iter().find(|a| !present.contains(a)) {
            return Err(BindError::MissingAnchor(*missing));
        }
        Ok(ViewBinding { present })
    }

    pub fn full() -> Self {
        ViewBinding {
            present: Anchor::ALL.into_iter().collect(),
        }
    }

    pub fn has(&self, anchor: Anchor) -> bool {
        self.present.contains(&anchor)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            fullscreen: true,
            detail: self.has(Anchor::DetailModal) && self.has(Anchor::DetailImage),
            info_panel: self.has(Anchor::InfoPanel),
        }
    }
}
