use gallery::*;
use mocks::{sample_record, sample_records};

fn ready_gallery(records: Vec<api_client::PhotoRecord>) -> Gallery {
    let mut gallery = Gallery::setup(records, Anchor::ALL);
    for effect in gallery.start() {
        if let Effect::Schedule { timer, epoch, .. } = effect {
            gallery.handle(GalleryEvent::timer(timer, epoch));
        }
    }
    assert!(gallery.is_ready());
    gallery
}

/// Deliver every scheduled timer of the given kind immediately.
fn run_timers(gallery: &mut Gallery, effects: &[Effect], wanted: Timer) {
    for effect in effects {
        if let Effect::Schedule { timer, epoch, .. } = *effect {
            if timer == wanted {
                gallery.handle(GalleryEvent::timer(timer, epoch));
            }
        }
    }
}

fn select(gallery: &mut Gallery, id: &str) -> Vec<Effect> {
    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Select { id: id.into() }))
}

#[test]
fn tag_filter_shows_matching_cards() {
    let mut gallery = ready_gallery(sample_records());
    gallery.handle(GalleryEvent::Filter(FilterValue::parse("naturaleza")));
    assert_eq!(gallery.visible_ids(), vec!["1".to_string(), "3".to_string()]);

    let view = render(&gallery);
    let active: Vec<_> = view.filters.iter().filter(|f| f.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].value, FilterValue::Tag("naturaleza".into()));
    assert!(!view.cards[1].visible);

    gallery.handle(GalleryEvent::Filter(FilterValue::All));
    assert_eq!(gallery.visible_ids().len(), 3);
}

#[test]
fn unknown_filter_changes_nothing() {
    let mut gallery = ready_gallery(sample_records());
    gallery.handle(GalleryEvent::Filter(FilterValue::parse("urbano")));
    gallery.handle(GalleryEvent::Filter(FilterValue::parse("retratos")));
    assert_eq!(gallery.state().active_filter, FilterValue::parse("urbano"));
    assert_eq!(gallery.visible_ids(), vec!["2".to_string(), "3".to_string()]);
}

#[test]
fn navigation_walks_to_the_end_and_back() {
    let records = (1..=5)
        .map(|i| sample_record(&i.to_string(), &format!("Foto {}", i), &["mar"]))
        .collect();
    let mut gallery = ready_gallery(records);
    select(&mut gallery, "1");
    assert_eq!(gallery.viewer().mode().index(), Some(0));

    for _ in 0..4 {
        gallery.handle(GalleryEvent::Viewer(ViewerEvent::Navigate(Direction::Next)));
    }
    let view = render(&gallery);
    let fullscreen = view.fullscreen.unwrap();
    assert_eq!(fullscreen.position, (5, 5));
    assert!(!fullscreen.show_next);
    assert!(fullscreen.show_prev);

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Navigate(Direction::Next)));
    assert_eq!(gallery.viewer().mode().index(), Some(4));

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Navigate(Direction::Prev)));
    let fullscreen = render(&gallery).fullscreen.unwrap();
    assert_eq!(gallery.viewer().mode().index(), Some(3));
    assert!(fullscreen.show_next);
    assert_eq!(fullscreen.id, "4");
}

#[test]
fn navigation_stays_within_the_filtered_list() {
    let mut gallery = ready_gallery(sample_records());
    gallery.handle(GalleryEvent::Filter(FilterValue::parse("urbano")));
    select(&mut gallery, "2");
    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Key(Key::ArrowRight)));
    assert_eq!(gallery.state().current_id.as_deref(), Some("3"));
    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Key(Key::ArrowRight)));
    assert_eq!(gallery.state().current_id.as_deref(), Some("3"));

    // Changing the filter while open does not reshuffle navigation.
    gallery.handle(GalleryEvent::Filter(FilterValue::All));
    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Key(Key::ArrowLeft)));
    assert_eq!(gallery.state().current_id.as_deref(), Some("2"));
}

#[test]
fn info_panel_appears_after_reveal_timer() {
    let mut record = sample_record("1", "Bosque", &["naturaleza"]);
    record.price = Some(150.0);
    let mut gallery = ready_gallery(vec![record]);

    let effects = select(&mut gallery, "1");
    assert!(effects.contains(&Effect::ScrollLock(true)));
    assert!(effects.contains(&Effect::Schedule {
        timer: Timer::RevealInfo,
        epoch: gallery.viewer().epoch(),
        after: INFO_REVEAL_DELAY,
    }));
    let view = render(&gallery);
    assert!(view.scroll_locked);
    let fullscreen = view.fullscreen.unwrap();
    assert!(fullscreen.info.is_none());
    assert_eq!(fullscreen.classes, vec![Transient::Entering]);

    run_timers(&mut gallery, &effects, Timer::RevealInfo);
    let info = render(&gallery).fullscreen.unwrap().info.unwrap();
    assert_eq!(info.title.as_deref(), Some("Bosque"));
    assert_eq!(info.description.as_deref(), Some("No description"));
    assert_eq!(info.price.as_deref(), Some("$150"));
    assert_eq!(info.location.as_deref(), Some("No location"));
}

#[test]
fn close_runs_the_closing_animation() {
    let mut gallery = ready_gallery(sample_records());
    select(&mut gallery, "2");
    let effects = gallery.handle(GalleryEvent::Viewer(ViewerEvent::CloseControl));
    assert_eq!(effects[0], Effect::ScrollLock(false));

    let view = render(&gallery);
    assert!(!view.scroll_locked);
    assert_eq!(view.fullscreen.unwrap().classes, vec![Transient::Closing]);

    run_timers(&mut gallery, &effects, Timer::FinishClose);
    let view = render(&gallery);
    assert!(view.fullscreen.is_none());
    assert_eq!(gallery.state().mode, ViewerMode::Closed);
}

#[test]
fn reopening_during_close_is_ignored_and_old_timers_stay_stale() {
    let mut gallery = ready_gallery(sample_records());
    let open = select(&mut gallery, "1");
    let close = gallery.handle(GalleryEvent::Viewer(ViewerEvent::BackdropClick));
    assert!(select(&mut gallery, "3").is_empty());

    run_timers(&mut gallery, &open, Timer::RevealInfo);
    assert!(!gallery.state().info_visible);
    run_timers(&mut gallery, &close, Timer::FinishClose);

    let reopened = select(&mut gallery, "3");
    run_timers(&mut gallery, &close, Timer::FinishClose);
    assert_eq!(gallery.state().current_id.as_deref(), Some("3"));
    run_timers(&mut gallery, &reopened, Timer::RevealInfo);
    assert!(gallery.state().info_visible);
}

#[test]
fn details_then_view_large_then_escape_twice() {
    let mut record = sample_record("1", "Bosque", &["naturaleza"]);
    record.location = Some("Chiloé".into());
    let mut gallery = ready_gallery(vec![record]);

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::ShowDetails { id: "1".into() }));
    let detail = render(&gallery).detail.unwrap();
    assert_eq!(detail.location, "Chiloé");
    assert_eq!(detail.price, "Price not specified");
    assert!(detail.can_view_large);

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::ViewLarge));
    let view = render(&gallery);
    assert!(view.detail.is_none());
    assert_eq!(view.fullscreen.unwrap().image_url, detail.image_url);

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::Key(Key::Escape)));
    assert!(render(&gallery).detail.is_some());

    let effects = gallery.handle(GalleryEvent::Viewer(ViewerEvent::Key(Key::Escape)));
    run_timers(&mut gallery, &effects, Timer::FinishClose);
    let view = render(&gallery);
    assert!(view.detail.is_none());
    assert!(view.fullscreen.is_none());
}

#[test]
fn missing_optional_anchors_hide_controls() {
    let mut anchors = ViewBinding::REQUIRED.to_vec();
    anchors.push(Anchor::InfoPanel);
    anchors.push(Anchor::InfoTitle);
    let mut gallery = Gallery::try_new(sample_records(), anchors).unwrap();
    gallery.handle(GalleryEvent::timer(Timer::Settle, 0));

    gallery.handle(GalleryEvent::Viewer(ViewerEvent::ShowDetails { id: "1".into() }));
    assert_eq!(gallery.state().mode, ViewerMode::Closed);

    let effects = select(&mut gallery, "2");
    run_timers(&mut gallery, &effects, Timer::RevealInfo);
    let view = render(&gallery);
    assert!(view.filters.is_empty());
    let fullscreen = view.fullscreen.unwrap();
    assert!(!fullscreen.show_prev && !fullscreen.show_next && !fullscreen.show_close);
    let info = fullscreen.info.unwrap();
    assert_eq!(info.title.as_deref(), Some("Avenida"));
    assert!(info.price.is_none());
}

#[test]
fn try_new_reports_missing_anchor() {
    let err = Gallery::try_new(sample_records(), [Anchor::Gallery, Anchor::FullscreenImage])
        .unwrap_err();
    assert_eq!(err, BindError::MissingAnchor(Anchor::FullscreenModal));
}

#[test]
fn every_filter_control_selects_its_own_tag() {
    let rows = serde_json::json!([
        { "id": 1, "title": "Costa", "image_url": "u1", "tags": [" mar"] },
        { "id": 2, "title": "Todo", "image_url": "u2", "tags": ["all"] },
        { "id": 3, "title": "Calle", "image_url": "u3", "tags": ["urbano"] }
    ]);
    let records: Vec<api_client::PhotoRecord> = serde_json::from_value(rows).unwrap();
    let mut gallery = ready_gallery(records);

    let controls = render(&gallery).filters;
    assert_eq!(controls.len(), 4);
    for control in controls {
        gallery.handle(GalleryEvent::Filter(control.value.clone()));
        let view = render(&gallery);
        let active: Vec<_> = view.filters.iter().filter(|f| f.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].value, control.value);

        let expected: Vec<String> = match &control.value {
            FilterValue::All => vec!["1".into(), "2".into(), "3".into()],
            FilterValue::Tag(tag) if tag == "mar" => vec!["1".into()],
            FilterValue::Tag(tag) if tag == "all" => vec!["2".into()],
            FilterValue::Tag(tag) => {
                assert_eq!(tag, "urbano");
                vec!["3".into()]
            }
        };
        assert_eq!(gallery.visible_ids(), expected, "pressed {:?}", control.label);
    }
}
