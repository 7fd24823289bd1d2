//! Render step: projects a [`Gallery`] onto plain view models a front-end
//! can draw without knowing anything about the state machine.

use crate::binding::Anchor;
use crate::filter::FilterValue;
use crate::gallery::Gallery;
use crate::render::{description_label, location_label, price_label, GalleryCard};
use crate::viewer::{Transient, ViewerMode};
use api_client::PhotoRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub card: GalleryCard,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterControlView {
    pub value: FilterValue,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: String,
    pub image_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: String,
    pub location: String,
    pub tags: Vec<String>,
    pub can_view_large: bool,
    pub classes: Vec<Transient>,
}

/// Fields of the fullscreen info panel. Unbound fields stay `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfoView {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FullscreenView {
    pub id: String,
    pub image_url: String,
    pub alt: String,
    pub info: Option<InfoView>,
    pub show_prev: bool,
    pub show_next: bool,
    pub show_close: bool,
    /// One-based position and total within the navigation list.
    pub position: (usize, usize),
    pub classes: Vec<Transient>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryView {
    pub cards: Vec<CardView>,
    pub filters: Vec<FilterControlView>,
    pub scroll_locked: bool,
    pub detail: Option<DetailView>,
    pub fullscreen: Option<FullscreenView>,
}

fn filter_label(value: &FilterValue) -> String {
    let tag = match value {
        FilterValue::All => return "All".to_string(),
        FilterValue::Tag(tag) => tag,
    };
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn render(gallery: &Gallery) -> GalleryView {
    let has = |anchor| gallery.binding().map_or(false, |b| b.has(anchor));

    let cards = gallery
        .cards()
        .iter()
        .zip(gallery.visibility())
        .map(|(card, visible)| CardView {
            card: card.clone(),
            visible: *visible,
        })
        .collect();

    let filters = if has(Anchor::FilterBar) {
        gallery
            .filters()
            .controls()
            .iter()
            .enumerate()
            .map(|(i, value)| FilterControlView {
                value: value.clone(),
                label: filter_label(value),
                active: gallery.filters().is_active(i),
            })
            .collect()
    } else {
        Vec::new()
    };

    let viewer = gallery.viewer();
    let classes: Vec<Transient> = viewer.transient().iter().copied().collect();
    let (mut detail, mut fullscreen) = (None, None);
    if let Some(record) = gallery.current_record() {
        match viewer.mode() {
            ViewerMode::Detail { .. } => {
                detail = Some(DetailView {
                    id: record.id.clone(),
                    image_url: record.image_url.clone(),
                    title: has(Anchor::DetailTitle).then(|| record.title.clone()),
                    description: has(Anchor::DetailDescription)
                        .then(|| description_label(record.description.as_deref())),
                    price: price_label(record.price),
                    location: location_label(record.location.as_deref()),
                    tags: record.tags.clone(),
                    can_view_large: has(Anchor::ViewLargeControl),
                    classes: classes.clone(),
                });
            }
            ViewerMode::Fullscreen { index, .. } => {
                let info = viewer.info_visible().then(|| info_view(record, &has));
                fullscreen = Some(FullscreenView {
                    id: record.id.clone(),
                    image_url: record.image_url.clone(),
                    alt: record.title.clone(),
                    info,
                    show_prev: has(Anchor::PrevControl) && viewer.has_prev(),
                    show_next: has(Anchor::NextControl) && viewer.has_next(),
                    show_close: has(Anchor::CloseControl),
                    position: (index + 1, viewer.active_ids().len()),
                    classes,
                });
            }
            ViewerMode::Closed => {}
        }
    }

    GalleryView {
        cards,
        filters,
        scroll_locked: viewer.scroll_locked(),
        detail,
        fullscreen,
    }
}

fn info_view(record: &PhotoRecord, has: &dyn Fn(Anchor) -> bool) -> InfoView {
    InfoView {
        title: has(Anchor::InfoTitle).then(|| record.title.clone()),
        description: has(Anchor::InfoDescription)
            .then(|| description_label(record.description.as_deref())),
        price: has(Anchor::InfoPrice).then(|| price_label(record.price)),
        location: has(Anchor::InfoLocation).then(|| location_label(record.location.as_deref())),
    }
}
