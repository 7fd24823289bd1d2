//! Desktop gallery front-end for Folio.
//!
//! The window is a thin shell around [`gallery::Gallery`]: input becomes
//! [`GalleryEvent`]s, returned effects become delayed commands, and every
//! frame is drawn from [`gallery::render`].

mod image_loader;
mod style;

pub use image_loader::{ImageLoader, ImageLoaderError};

use crate::style::Palette;
use api_client::{ApiClient, PhotoRecord, RecordStore};
use gallery::view::{CardView, DetailView, FullscreenView};
use gallery::{
    render, Anchor, Direction, Effect, Gallery, GalleryEvent, Key as ViewerKey,
    Transient, ViewerEvent,
};
use iced::keyboard::{self, key::Named};
use iced::widget::image::Handle;
use iced::widget::{button, column, container, image, mouse_area, row, scrollable, text, Column, Row};
use iced::{executor, Alignment, Application, Command, Element, Length, Settings, Subscription, Theme};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);
const GRID_COLUMNS: usize = 4;

#[derive(Debug, Clone)]
pub struct UiFlags {
    pub store_url: String,
    pub api_key: String,
    pub cache_dir: PathBuf,
    /// How many card images to fetch right after loading.
    pub preload: usize,
}

#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(flags)))]
pub fn run(flags: UiFlags) -> iced::Result {
    FolioUi::run(Settings::with_flags(flags))
}

#[derive(Debug, Clone)]
pub enum Message {
    LoadPhotos,
    PhotosLoaded(Result<Vec<PhotoRecord>, String>),
    Gallery(GalleryEvent),
    LoadImage(String, String),
    ImageLoaded(String, Result<Handle, String>),
    ImagesPreloaded(Vec<(String, Result<Handle, String>)>),
    DismissError(usize),
    ClearErrors,
}

fn viewer(event: ViewerEvent) -> Message {
    Message::Gallery(GalleryEvent::Viewer(event))
}

pub struct FolioUi {
    client: ApiClient,
    gallery: Gallery,
    image_loader: Arc<ImageLoader>,
    images: HashMap<String, Handle>,
    pending_images: Vec<String>,
    loading: bool,
    preload_count: usize,
    errors: Vec<String>,
}

impl FolioUi {
    /// Expose current viewer mode for testing purposes
    pub fn state_debug(&self) -> String {
        format!("{:?}", self.gallery.state().mode)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn photo_count(&self) -> usize {
        self.gallery.records().len()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    fn error_timeout() -> Command<Message> {
        Command::perform(
            async {
                sleep(ERROR_DISPLAY_DURATION).await;
            },
            |_| Message::ClearErrors,
        )
    }

    fn push_error(&mut self, msg: String) -> Command<Message> {
        tracing::error!("{}", msg);
        self.errors.push(msg);
        FolioUi::error_timeout()
    }

    /// Turn gallery effects into commands. Timers come back as messages.
    fn run_effects(effects: Vec<Effect>) -> Command<Message> {
        let commands = effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::ScrollLock(locked) => {
                    tracing::debug!(locked, "Grid scrolling toggled");
                    None
                }
                Effect::Schedule {
                    timer,
                    epoch,
                    after,
                } => Some(Command::perform(
                    async move {
                        sleep(after).await;
                    },
                    move |_| Message::Gallery(GalleryEvent::timer(timer, epoch)),
                )),
            })
            .collect::<Vec<_>>();
        Command::batch(commands)
    }

    /// Fetch the image of the record on screen if it is not loaded yet.
    fn ensure_current_image(&mut self) -> Command<Message> {
        let Some(record) = self.gallery.current_record() else {
            return Command::none();
        };
        if self.images.contains_key(&record.id) || self.pending_images.contains(&record.id) {
            return Command::none();
        }
        let (id, url) = (record.id.clone(), record.image_url.clone());
        Command::perform(async {}, move |_| Message::LoadImage(id, url))
    }
}

impl Application for FolioUi {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = UiFlags;

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(flags)))]
    fn new(flags: Self::Flags) -> (Self, Command<Message>) {
        let client = ApiClient::new(flags.store_url, flags.api_key);
        let gallery = Gallery::setup(Vec::new(), Anchor::ALL);
        let start = FolioUi::run_effects(gallery.start());
        let app = Self {
            client,
            gallery,
            image_loader: Arc::new(ImageLoader::new(flags.cache_dir.join("images"))),
            images: HashMap::new(),
            pending_images: Vec::new(),
            loading: false,
            preload_count: flags.preload,
            errors: Vec::new(),
        };
        (
            app,
            Command::batch(vec![
                start,
                Command::perform(async {}, |_| Message::LoadPhotos),
            ]),
        )
    }

    fn title(&self) -> String {
        String::from("Folio - Photography")
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::LoadPhotos => {
                self.loading = true;
                let client = self.client.clone();
                return Command::perform(
                    async move { client.list(None).await.map_err(|e| e.to_string()) },
                    Message::PhotosLoaded,
                );
            }
            Message::PhotosLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(records) => {
                        let effects = self.gallery.handle(GalleryEvent::Reload(records));
                        let loader = self.image_loader.clone();
                        let cards = self.gallery.cards().to_vec();
                        let count = self.preload_count;
                        self.pending_images
                            .extend(cards.iter().take(count).map(|c| c.id.clone()));
                        return Command::batch(vec![
                            FolioUi::run_effects(effects),
                            Command::perform(
                                async move { loader.preload(&cards, count).await },
                                Message::ImagesPreloaded,
                            ),
                        ]);
                    }
                    Err(error) => {
                        return self.push_error(format!("Failed to load photos: {}", error));
                    }
                }
            }
            Message::Gallery(event) => {
                let effects = self.gallery.handle(event);
                return Command::batch(vec![
                    FolioUi::run_effects(effects),
                    self.ensure_current_image(),
                ]);
            }
            Message::LoadImage(id, url) => {
                self.pending_images.push(id.clone());
                let loader = self.image_loader.clone();
                let id_clone = id.clone();
                return Command::perform(
                    async move { loader.load(&id_clone, &url).await },
                    move |res| Message::ImageLoaded(id, res.map_err(|e| e.to_string())),
                );
            }
            Message::ImageLoaded(id, result) => {
                self.pending_images.retain(|p| *p != id);
                match result {
                    Ok(handle) => {
                        self.images.insert(id, handle);
                    }
                    Err(error) => {
                        return self.push_error(format!("Failed to load image {}: {}", id, error));
                    }
                }
            }
            Message::ImagesPreloaded(results) => {
                for (id, result) in results {
                    self.pending_images.retain(|p| *p != id);
                    if let Ok(handle) = result {
                        self.images.insert(id, handle);
                    }
                }
            }
            Message::DismissError(idx) => {
                if idx < self.errors.len() {
                    self.errors.remove(idx);
                }
            }
            Message::ClearErrors => {
                self.errors.clear();
            }
        }
        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        keyboard::on_key_press(|key, _modifiers| match key {
            keyboard::Key::Named(Named::Escape) => Some(viewer(ViewerEvent::Key(ViewerKey::Escape))),
            keyboard::Key::Named(Named::ArrowLeft) => {
                Some(viewer(ViewerEvent::Key(ViewerKey::ArrowLeft)))
            }
            keyboard::Key::Named(Named::ArrowRight) => {
                Some(viewer(ViewerEvent::Key(ViewerKey::ArrowRight)))
            }
            _ => None,
        })
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn view(&self) -> Element<Message> {
        let view = render(&self.gallery);

        let content: Element<Message> = if let Some(full) = &view.fullscreen {
            self.fullscreen_view(full)
        } else if let Some(detail) = &view.detail {
            self.detail_view(detail)
        } else {
            let mut filters = Row::new().spacing(10);
            for control in &view.filters {
                filters = filters.push(
                    button(text(&control.label))
                        .style(style::filter_button(control.active))
                        .on_press(Message::Gallery(GalleryEvent::Filter(control.value.clone()))),
                );
            }
            let header = row![text("Folio").size(28), filters]
                .spacing(Palette::SPACING)
                .align_items(Alignment::Center);

            let body: Element<Message> = if self.loading {
                text("Loading photos...").size(16).into()
            } else if view.cards.is_empty() {
                text("No photos yet.").size(16).into()
            } else {
                scrollable(self.grid(&view.cards)).height(Length::Fill).into()
            };
            column![header, body].spacing(Palette::SPACING).into()
        };

        let mut base = Column::new().spacing(Palette::SPACING);
        if !self.errors.is_empty() {
            let mut list = Column::new().spacing(5);
            for (i, msg) in self.errors.iter().enumerate() {
                list = list.push(
                    row![
                        text(msg).size(14),
                        button("Dismiss")
                            .style(style::button_primary())
                            .on_press(Message::DismissError(i))
                    ]
                    .spacing(10)
                    .align_items(Alignment::Center),
                );
            }
            base = base.push(
                container(list)
                    .style(style::error_banner())
                    .padding(10)
                    .width(Length::Fill),
            );
        }
        base = base.push(content);

        container(base)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(20)
            .into()
    }
}

impl FolioUi {
    fn picture(&self, id: &str, size: Length) -> Element<Message> {
        match self.images.get(id) {
            Some(handle) => image(handle.clone()).width(size).height(size).into(),
            None => container(text("Loading..."))
                .width(size)
                .height(size)
                .center_x()
                .center_y()
                .into(),
        }
    }

    fn grid(&self, cards: &[CardView]) -> Element<Message> {
        let mut rows = Column::new().spacing(Palette::SPACING);
        let visible: Vec<_> = cards.iter().filter(|c| c.visible).collect();
        for chunk in visible.chunks(GRID_COLUMNS) {
            let mut current = Row::new().spacing(Palette::SPACING);
            for view in chunk {
                let card = &view.card;
                let mut caption = row![text(&card.title).size(16)].spacing(8);
                if card.sold {
                    caption = caption.push(text("Sold").size(12));
                }
                let tile = column![
                    button(self.picture(&card.id, Length::Fixed(Palette::THUMBNAIL)))
                        .style(style::card_button())
                        .on_press(viewer(ViewerEvent::Select {
                            id: card.id.clone()
                        })),
                    caption,
                    row![
                        text(&card.price_label).size(14),
                        button(text("Details").size(12))
                            .style(style::button_primary())
                            .on_press(viewer(ViewerEvent::ShowDetails {
                                id: card.id.clone()
                            })),
                    ]
                    .spacing(8)
                    .align_items(Alignment::Center),
                ]
                .spacing(6);
                current = current.push(container(tile).style(style::card()).padding(8));
            }
            rows = rows.push(current);
        }
        rows.into()
    }

    /// Wrap modal content so clicks inside it never reach the backdrop.
    fn modal<'a>(&self, content: Element<'a, Message>, closing: bool) -> Element<'a, Message> {
        let inner = mouse_area(container(content).padding(Palette::SPACING))
            .on_press(viewer(ViewerEvent::ContentClick));
        let mut backdrop = container(inner)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .center_y()
            .padding(40);
        if !closing {
            backdrop = backdrop.style(style::backdrop());
        }
        mouse_area(backdrop)
            .on_press(viewer(ViewerEvent::BackdropClick))
            .into()
    }

    fn fullscreen_view(&self, full: &FullscreenView) -> Element<Message> {
        let mut stage = Row::new().spacing(Palette::SPACING).align_items(Alignment::Center);
        if full.show_prev {
            stage = stage.push(
                button("<")
                    .style(style::button_primary())
                    .on_press(viewer(ViewerEvent::Navigate(Direction::Prev))),
            );
        }
        stage = stage.push(self.picture(&full.id, Length::Fill));
        if full.show_next {
            stage = stage.push(
                button(">")
                    .style(style::button_primary())
                    .on_press(viewer(ViewerEvent::Navigate(Direction::Next))),
            );
        }

        let mut col = Column::new().spacing(Palette::SPACING).push(stage);
        if let Some(info) = &full.info {
            let mut panel = Column::new().spacing(4);
            for line in [&info.title, &info.description, &info.price, &info.location]
                .into_iter()
                .flatten()
            {
                panel = panel.push(text(line));
            }
            col = col.push(panel);
        }
        let mut footer = row![text(format!("{} / {}", full.position.0, full.position.1))]
            .spacing(Palette::SPACING)
            .align_items(Alignment::Center);
        if full.show_close {
            footer = footer.push(
                button("Close")
                    .style(style::button_primary())
                    .on_press(viewer(ViewerEvent::CloseControl)),
            );
        }
        col = col.push(footer);
        self.modal(col.into(), full.classes.contains(&Transient::Closing))
    }

    fn detail_view(&self, detail: &DetailView) -> Element<Message> {
        let mut col = Column::new()
            .spacing(10)
            .push(self.picture(&detail.id, Length::Fixed(480.0)));
        if let Some(title) = &detail.title {
            col = col.push(text(title).size(22));
        }
        if let Some(description) = &detail.description {
            col = col.push(text(description));
        }
        col = col
            .push(text(&detail.price))
            .push(text(&detail.location))
            .push(text(detail.tags.join(", ")).size(12));
        let mut actions = Row::new().spacing(10);
        if detail.can_view_large {
            actions = actions.push(
                button("View large")
                    .style(style::button_primary())
                    .on_press(viewer(ViewerEvent::ViewLarge)),
            );
        }
        actions = actions.push(
            button("Close")
                .style(style::button_primary())
                .on_press(viewer(ViewerEvent::CloseControl)),
        );
        col = col.push(actions);
        let content = container(col).style(style::card()).padding(Palette::SPACING);
        self.modal(content.into(), detail.classes.contains(&Transient::Closing))
    }
}
