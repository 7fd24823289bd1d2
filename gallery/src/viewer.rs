//! Modal viewer state machine.
//!
//! The viewer is either closed, showing the detail modal, or showing the
//! fullscreen viewer. Fullscreen remembers whether it was opened from the
//! detail modal so that closing it steps back there instead of closing
//! everything. Transitions never touch the screen: they return [`Effect`]s
//! which the host executes, and delayed work comes back in as
//! [`ViewerEvent::TimerFired`] tagged with the epoch it was scheduled under.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between setup and the first accepted input.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Delay before the fullscreen info panel is revealed.
pub const INFO_REVEAL_DELAY: Duration = Duration::from_millis(500);
/// Length of the closing animation.
pub const CLOSE_ANIMATION_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Opened straight from a gallery card.
    Direct,
    /// Opened with "view large" from the detail modal.
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerMode {
    #[default]
    Closed,
    Detail {
        index: usize,
    },
    Fullscreen {
        index: usize,
        origin: Origin,
    },
}

impl ViewerMode {
    pub fn index(&self) -> Option<usize> {
        match self {
            ViewerMode::Closed => None,
            ViewerMode::Detail { index } | ViewerMode::Fullscreen { index, .. } => Some(*index),
        }
    }
}

/// Animation markers applied to the open surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Transient {
    Entering,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Settle,
    RevealInfo,
    FinishClose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// A gallery card was activated.
    Select { id: String },
    /// The explicit "details" action on a card.
    ShowDetails { id: String },
    /// "View large" inside the detail modal.
    ViewLarge,
    Navigate(Direction),
    Key(Key),
    CloseControl,
    /// A click that landed on the modal backdrop itself.
    BackdropClick,
    /// A click inside the modal content. Never closes anything.
    ContentClick,
    TimerFired { timer: Timer, epoch: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ScrollLock(bool),
    Schedule {
        timer: Timer,
        epoch: u64,
        after: Duration,
    },
}

/// Which optional surfaces the viewer may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub fullscreen: bool,
    pub detail: bool,
    pub info_panel: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities {
            fullscreen: true,
            detail: true,
            info_panel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: ViewerMode,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    mode: ViewerMode,
    active: Vec<String>,
    info_visible: bool,
    transient: BTreeSet<Transient>,
    scroll_locked: bool,
    epoch: u64,
    capabilities: Capabilities,
}

impl Viewer {
    pub fn new(capabilities: Capabilities) -> Self {
        Viewer {
            capabilities,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    /// Identifiers navigation moves through, frozen when the viewer opened.
    pub fn active_ids(&self) -> &[String] {
        &self.active
    }

    pub fn current_id(&self) -> Option<&str> {
        self.mode
            .index()
            .and_then(|i| self.active.get(i))
            .map(String::as_str)
    }

    pub fn info_visible(&self) -> bool {
        self.info_visible
    }

    pub fn transient(&self) -> &BTreeSet<Transient> {
        &self.transient
    }

    pub fn is_closing(&self) -> bool {
        self.transient.contains(&Transient::Closing)
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has_prev(&self) -> bool {
        matches!(self.mode, ViewerMode::Fullscreen { index, .. } if index > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.mode, ViewerMode::Fullscreen { index, .. } if index + 1 < self.active.len())
    }

    /// Drop everything without animating. Pending timers become stale.
    pub fn reset(&mut self) -> Vec<Effect> {
        let was_locked = self.scroll_locked;
        self.mode = ViewerMode::Closed;
        self.active.clear();
        self.info_visible = false;
        self.transient.clear();
        self.scroll_locked = false;
        self.epoch += 1;
        if was_locked {
            vec![Effect::ScrollLock(false)]
        } else {
            Vec::new()
        }
    }

    /// Apply `event`. `visible` is the id list of the currently filtered
    /// cards, used only when the event opens the viewer.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, visible)))]
    pub fn transition(&mut self, event: ViewerEvent, visible: &[String]) -> Transition {
        let effects = match event {
            ViewerEvent::TimerFired { timer, epoch } => self.on_timer(timer, epoch),
            _ if self.is_closing() => {
                debug!(?event, "Input ignored while closing");
                Vec::new()
            }
            ViewerEvent::Select { id } => match self.mode {
                ViewerMode::Closed => self.open_fullscreen(&id, visible),
                _ => Vec::new(),
            },
            ViewerEvent::ShowDetails { id } => match self.mode {
                ViewerMode::Closed => self.open_detail(&id, visible),
                _ => Vec::new(),
            },
            ViewerEvent::ViewLarge => self.view_large(),
            ViewerEvent::Navigate(direction) => self.navigate(direction),
            ViewerEvent::Key(Key::ArrowLeft) => self.navigate(Direction::Prev),
            ViewerEvent::Key(Key::ArrowRight) => self.navigate(Direction::Next),
            ViewerEvent::Key(Key::Escape)
            | ViewerEvent::CloseControl
            | ViewerEvent::BackdropClick => self.close_deepest(),
            ViewerEvent::ContentClick => Vec::new(),
        };
        Transition {
            mode: self.mode,
            effects,
        }
    }

    fn open_fullscreen(&mut self, id: &str, visible: &[String]) -> Vec<Effect> {
        if !self.capabilities.fullscreen {
            warn!("Fullscreen viewer is not bound; ignoring selection");
            return Vec::new();
        }
        let Some(index) = visible.iter().position(|v| v == id) else {
            debug!(id, "Selected id is not among visible records");
            return Vec::new();
        };
        self.epoch += 1;
        self.active = visible.to_vec();
        self.mode = ViewerMode::Fullscreen {
            index,
            origin: Origin::Direct,
        };
        self.enter_fullscreen()
    }

    fn open_detail(&mut self, id: &str, visible: &[String]) -> Vec<Effect> {
        if !self.capabilities.detail {
            debug!("Detail modal is not bound; ignoring details request");
            return Vec::new();
        }
        let Some(index) = visible.iter().position(|v| v == id) else {
            debug!(id, "Requested id is not among visible records");
            return Vec::new();
        };
        self.epoch += 1;
        self.active = visible.to_vec();
        self.mode = ViewerMode::Detail { index };
        self.info_visible = false;
        self.transient.clear();
        self.scroll_locked = true;
        vec![Effect::ScrollLock(true)]
    }

    fn view_large(&mut self) -> Vec<Effect> {
        let ViewerMode::Detail { index } = self.mode else {
            return Vec::new();
        };
        if !self.capabilities.fullscreen {
            warn!("Fullscreen viewer is not bound; staying on detail");
            return Vec::new();
        }
        self.epoch += 1;
        self.mode = ViewerMode::Fullscreen {
            index,
            origin: Origin::Detail,
        };
        self.enter_fullscreen()
    }

    fn enter_fullscreen(&mut self) -> Vec<Effect> {
        self.info_visible = false;
        self.transient.clear();
        self.transient.insert(Transient::Entering);
        let mut effects = Vec::new();
        if !self.scroll_locked {
            self.scroll_locked = true;
            effects.push(Effect::ScrollLock(true));
        }
        effects.push(Effect::Schedule {
            timer: Timer::RevealInfo,
            epoch: self.epoch,
            after: INFO_REVEAL_DELAY,
        });
        effects
    }

    fn navigate(&mut self, direction: Direction) -> Vec<Effect> {
        let ViewerMode::Fullscreen { index, origin } = self.mode else {
            return Vec::new();
        };
        let target = match direction {
            Direction::Prev => index.checked_sub(1),
            Direction::Next => Some(index + 1).filter(|i| *i < self.active.len()),
        };
        match target {
            Some(index) => self.mode = ViewerMode::Fullscreen { index, origin },
            None => debug!(?direction, index, "Navigation clamped at boundary"),
        }
        Vec::new()
    }

    fn close_deepest(&mut self) -> Vec<Effect> {
        match self.mode {
            ViewerMode::Closed => Vec::new(),
            ViewerMode::Fullscreen {
                index,
                origin: Origin::Detail,
            } => {
                self.epoch += 1;
                self.mode = ViewerMode::Detail { index };
                self.info_visible = false;
                self.transient.clear();
                Vec::new()
            }
            ViewerMode::Fullscreen { .. } | ViewerMode::Detail { .. } => {
                self.epoch += 1;
                self.info_visible = false;
                self.transient.clear();
                self.transient.insert(Transient::Closing);
                self.scroll_locked = false;
                vec![
                    Effect::ScrollLock(false),
                    Effect::Schedule {
                        timer: Timer::FinishClose,
                        epoch: self.epoch,
                        after: CLOSE_ANIMATION_DELAY,
                    },
                ]
            }
        }
    }

    fn on_timer(&mut self, timer: Timer, epoch: u64) -> Vec<Effect> {
        if epoch != self.epoch {
            debug!(?timer, epoch, current = self.epoch, "Stale timer ignored");
            return Vec::new();
        }
        match timer {
            Timer::RevealInfo => {
                if matches!(self.mode, ViewerMode::Fullscreen { .. }) {
                    self.transient.remove(&Transient::Entering);
                    self.info_visible = self.capabilities.info_panel;
                }
            }
            Timer::FinishClose => {
                if self.is_closing() {
                    self.mode = ViewerMode::Closed;
                    self.active.clear();
                    self.transient.clear();
                }
            }
            Timer::Settle => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    fn fire(viewer: &mut Viewer, effects: &[Effect], wanted: Timer) {
        for effect in effects {
            if let Effect::Schedule { timer, epoch, .. } = effect {
                if *timer == wanted {
                    viewer.transition(
                        ViewerEvent::TimerFired {
                            timer: *timer,
                            epoch: *epoch,
                        },
                        &[],
                    );
                }
            }
        }
    }

    #[test]
    fn select_opens_fullscreen_and_reveals_info() {
        let mut viewer = Viewer::default();
        let t = viewer.transition(ViewerEvent::Select { id: "2".into() }, &ids(3));
        assert_eq!(
            t.mode,
            ViewerMode::Fullscreen {
                index: 1,
                origin: Origin::Direct
            }
        );
        assert_eq!(t.effects[0], Effect::ScrollLock(true));
        assert!(viewer.transient().contains(&Transient::Entering));
        assert!(!viewer.info_visible());

        fire(&mut viewer, &t.effects, Timer::RevealInfo);
        assert!(viewer.info_visible());
        assert!(viewer.transient().is_empty());
    }

    #[test]
    fn unknown_id_is_noop() {
        let mut viewer = Viewer::default();
        let t = viewer.transition(ViewerEvent::Select { id: "99".into() }, &ids(3));
        assert_eq!(t.mode, ViewerMode::Closed);
        assert!(t.effects.is_empty());
        assert!(!viewer.scroll_locked());
    }

    #[test]
    fn navigation_clamps() {
        let mut viewer = Viewer::default();
        viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(2));
        assert!(!viewer.has_prev());
        assert!(viewer.has_next());

        viewer.transition(ViewerEvent::Key(Key::ArrowLeft), &[]);
        assert_eq!(viewer.mode().index(), Some(0));
        viewer.transition(ViewerEvent::Navigate(Direction::Next), &[]);
        viewer.transition(ViewerEvent::Key(Key::ArrowRight), &[]);
        assert_eq!(viewer.mode().index(), Some(1));
        assert_eq!(viewer.current_id(), Some("2"));
        assert!(viewer.has_prev());
        assert!(!viewer.has_next());
    }

    #[test]
    fn arrows_do_nothing_in_detail() {
        let mut viewer = Viewer::default();
        viewer.transition(ViewerEvent::ShowDetails { id: "1".into() }, &ids(3));
        viewer.transition(ViewerEvent::Key(Key::ArrowRight), &[]);
        assert_eq!(viewer.mode(), ViewerMode::Detail { index: 0 });
    }

    #[test]
    fn close_releases_scroll_then_finishes() {
        let mut viewer = Viewer::default();
        viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(1));
        let t = viewer.transition(ViewerEvent::Key(Key::Escape), &[]);
        assert_eq!(t.effects[0], Effect::ScrollLock(false));
        assert!(!viewer.scroll_locked());
        assert!(viewer.is_closing());
        assert!(matches!(viewer.mode(), ViewerMode::Fullscreen { .. }));

        let ignored = viewer.transition(ViewerEvent::Key(Key::ArrowRight), &[]);
        assert!(ignored.effects.is_empty());

        fire(&mut viewer, &t.effects, Timer::FinishClose);
        assert_eq!(viewer.mode(), ViewerMode::Closed);
        assert!(viewer.transient().is_empty());
        assert!(viewer.active_ids().is_empty());
    }

    #[test]
    fn stale_reveal_after_close_is_ignored() {
        let mut viewer = Viewer::default();
        let open = viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(1));
        viewer.transition(ViewerEvent::BackdropClick, &[]);
        fire(&mut viewer, &open.effects, Timer::RevealInfo);
        assert!(!viewer.info_visible());
        assert!(viewer.is_closing());
    }

    #[test]
    fn fullscreen_from_detail_steps_back() {
        let mut viewer = Viewer::default();
        viewer.transition(ViewerEvent::ShowDetails { id: "3".into() }, &ids(3));
        let large = viewer.transition(ViewerEvent::ViewLarge, &[]);
        assert_eq!(
            large.mode,
            ViewerMode::Fullscreen {
                index: 2,
                origin: Origin::Detail
            }
        );
        assert!(!large.effects.contains(&Effect::ScrollLock(true)));

        let back = viewer.transition(ViewerEvent::Key(Key::Escape), &[]);
        assert_eq!(back.mode, ViewerMode::Detail { index: 2 });
        assert!(back.effects.is_empty());
        assert!(viewer.scroll_locked());

        viewer.transition(ViewerEvent::Key(Key::Escape), &[]);
        assert!(viewer.is_closing());
    }

    #[test]
    fn content_click_keeps_viewer_open() {
        let mut viewer = Viewer::default();
        viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(1));
        let t = viewer.transition(ViewerEvent::ContentClick, &[]);
        assert!(matches!(t.mode, ViewerMode::Fullscreen { .. }));
        assert!(!viewer.is_closing());
    }

    #[test]
    fn missing_fullscreen_surface_aborts() {
        let mut viewer = Viewer::new(Capabilities {
            fullscreen: false,
            ..Default::default()
        });
        let t = viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(1));
        assert_eq!(t.mode, ViewerMode::Closed);
    }

    #[test]
    fn reveal_respects_missing_info_panel() {
        let mut viewer = Viewer::new(Capabilities {
            info_panel: false,
            ..Default::default()
        });
        let t = viewer.transition(ViewerEvent::Select { id: "1".into() }, &ids(1));
        fire(&mut viewer, &t.effects, Timer::RevealInfo);
        assert!(!viewer.info_visible());
        assert!(viewer.transient().is_empty());
    }
}
