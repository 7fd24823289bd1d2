use crate::binding::{Anchor, BindError, ViewBinding};
use crate::filter::{visibility, FilterBar, FilterValue};
use crate::render::{filter_values, render_cards, GalleryCard};
use crate::viewer::{Effect, Timer, Viewer, ViewerEvent, ViewerMode, SETTLE_DELAY};
use api_client::PhotoRecord;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    Filter(FilterValue),
    Viewer(ViewerEvent),
    /// Replace the record snapshot, e.g. after an admin change.
    Reload(Vec<PhotoRecord>),
}

impl GalleryEvent {
    /// The event a host delivers once a scheduled timer elapses.
    pub fn timer(timer: Timer, epoch: u64) -> Self {
        GalleryEvent::Viewer(ViewerEvent::TimerFired { timer, epoch })
    }
}

/// Public summary of where the gallery stands.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryState {
    pub mode: ViewerMode,
    pub current_id: Option<String>,
    pub active_filter: FilterValue,
    pub info_visible: bool,
}

/// One gallery instance: the record snapshot, its filter bar and viewer.
#[derive(Debug, Clone)]
pub struct Gallery {
    records: Vec<PhotoRecord>,
    cards: Vec<GalleryCard>,
    filters: FilterBar,
    visible: Vec<bool>,
    viewer: Viewer,
    binding: Option<ViewBinding>,
    ready: bool,
}

impl Gallery {
    pub fn try_new<I>(records: Vec<PhotoRecord>, anchors: I) -> Result<Self, BindError>
    where
        I: IntoIterator<Item = Anchor>,
    {
        let binding = ViewBinding::bind(anchors)?;
        Ok(Self::with_binding(records, Some(binding)))
    }

    /// Like [`Gallery::try_new`] but never fails: a missing required anchor
    /// is logged and the gallery stays inert.
    pub fn setup<I>(records: Vec<PhotoRecord>, anchors: I) -> Self
    where
        I: IntoIterator<Item = Anchor>,
    {
        match ViewBinding::bind(anchors) {
            Ok(binding) => Self::with_binding(records, Some(binding)),
            Err(e) => {
                warn!("Gallery disabled: {}", e);
                Self::with_binding(records, None)
            }
        }
    }

    fn with_binding(records: Vec<PhotoRecord>, binding: Option<ViewBinding>) -> Self {
        let viewer = binding
            .as_ref()
            .map(|b| Viewer::new(b.capabilities()))
            .unwrap_or_default();
        let mut gallery = Gallery {
            records: Vec::new(),
            cards: Vec::new(),
            filters: FilterBar::default(),
            visible: Vec::new(),
            viewer,
            binding,
            ready: false,
        };
        gallery.load(records);
        info!(count = gallery.records.len(), "Gallery set up");
        gallery
    }

    /// Effects to run right after setup. Input is accepted once the settle
    /// timer comes back.
    pub fn start(&self) -> Vec<Effect> {
        if self.binding.is_none() {
            return Vec::new();
        }
        vec![Effect::Schedule {
            timer: Timer::Settle,
            epoch: 0,
            after: SETTLE_DELAY,
        }]
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn binding(&self) -> Option<&ViewBinding> {
        self.binding.as_ref()
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&PhotoRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn cards(&self) -> &[GalleryCard] {
        &self.cards
    }

    pub fn filters(&self) -> &FilterBar {
        &self.filters
    }

    pub fn visibility(&self) -> &[bool] {
        &self.visible
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.cards
            .iter()
            .zip(&self.visible)
            .filter(|(_, shown)| **shown)
            .map(|(card, _)| card.id.clone())
            .collect()
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// The record shown by the open viewer, if any.
    pub fn current_record(&self) -> Option<&PhotoRecord> {
        self.viewer.current_id().and_then(|id| self.record(id))
    }

    pub fn state(&self) -> GalleryState {
        GalleryState {
            mode: self.viewer.mode(),
            current_id: self.viewer.current_id().map(str::to_string),
            active_filter: self.filters.active().clone(),
            info_visible: self.viewer.info_visible(),
        }
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn handle(&mut self, event: GalleryEvent) -> Vec<Effect> {
        if self.binding.is_none() {
            return Vec::new();
        }
        match event {
            GalleryEvent::Reload(records) => {
                let effects = self.viewer.reset();
                self.load(records);
                effects
            }
            GalleryEvent::Viewer(ViewerEvent::TimerFired {
                timer: Timer::Settle,
                ..
            }) => {
                self.ready = true;
                debug!("Gallery accepting input");
                Vec::new()
            }
            GalleryEvent::Viewer(event @ ViewerEvent::TimerFired { .. }) => {
                self.viewer.transition(event, &[]).effects
            }
            event if !self.ready => {
                debug!(?event, "Input before settle dropped");
                Vec::new()
            }
            GalleryEvent::Filter(value) => {
                self.apply_filter(value);
                Vec::new()
            }
            GalleryEvent::Viewer(event) => {
                let visible = self.visible_ids();
                self.viewer.transition(event, &visible).effects
            }
        }
    }

    fn apply_filter(&mut self, value: FilterValue) {
        if !self.filters.select(&value) {
            debug!(%value, "Unknown filter value ignored");
            return;
        }
        self.visible = visibility(&self.cards, self.filters.active());
        debug!(
            filter = %value,
            shown = self.visible.iter().filter(|v| **v).count(),
            "Filter applied"
        );
    }

    fn load(&mut self, records: Vec<PhotoRecord>) {
        self.cards = render_cards(&records);
        self.records = records;
        self.filters.replace_controls(filter_values(&self.records));
        self.visible = visibility(&self.cards, self.filters.active());
    }
}
