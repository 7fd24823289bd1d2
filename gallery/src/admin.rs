//! Admin controller: record CRUD against a [`RecordStore`], image upload
//! through a [`FileStorage`], and the form and confirmation state around it.

use crate::form::{FormError, FormMode, ImageSource, PhotoForm};
use crate::render::{render_cards, GalleryCard};
use api_client::{
    validate_image, ApiClientError, FileStorage, ImageFile, PhotoRecord, PhotoStatus, RecordStore,
};
use thiserror::Error;
use tracing::{error, info, warn};

/// Searches shorter than this many characters do nothing.
pub const MIN_SEARCH_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("{0}")]
    Store(#[from] ApiClientError),
    #[error("Photo not found: {0}")]
    NotFound(String),
    #[error("A save is already in progress")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: String,
    pub message: String,
}

/// Keeps the submit control disabled while alive, including when the
/// submitting future is dropped mid-call.
struct SubmitGuard<'a>(&'a mut bool);

impl<'a> SubmitGuard<'a> {
    fn hold(enabled: &'a mut bool) -> Self {
        *enabled = false;
        SubmitGuard(enabled)
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        *self.0 = true;
    }
}

pub struct AdminController<S, F> {
    store: S,
    storage: F,
    records: Vec<PhotoRecord>,
    form: PhotoForm,
    mode: FormMode,
    form_open: bool,
    submit_enabled: bool,
    pending_delete: Option<PendingDelete>,
    notice: Option<Notice>,
    status_filter: Option<PhotoStatus>,
}

impl<S: RecordStore, F: FileStorage> AdminController<S, F> {
    pub fn new(store: S, storage: F) -> Self {
        AdminController {
            store,
            storage,
            records: Vec::new(),
            form: PhotoForm::default(),
            mode: FormMode::Create,
            form_open: false,
            submit_enabled: true,
            pending_delete: None,
            notice: None,
            status_filter: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    /// The admin grid, rendered the same way as the public gallery.
    pub fn cards(&self) -> Vec<GalleryCard> {
        render_cards(&self.records)
    }

    pub fn form(&self) -> &PhotoForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PhotoForm {
        &mut self.form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn form_title(&self) -> &'static str {
        self.mode.title()
    }

    /// Id of the record being edited. Duplicates have none.
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn pending_delete(&self) -> Option<&PendingDelete> {
        self.pending_delete.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn status_filter(&self) -> Option<PhotoStatus> {
        self.status_filter
    }

    fn fail(&mut self, context: &str, err: impl std::fmt::Display) {
        let message = if context.is_empty() {
            err.to_string()
        } else {
            format!("{}: {}", context, err)
        };
        error!("{}", message);
        self.notice = Some(Notice::Error(message));
    }

    fn find(&self, id: &str) -> Option<&PhotoRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Fetch records with the current status filter.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn load(&mut self) -> Result<(), AdminError> {
        match self.store.list(self.status_filter).await {
            Ok(records) => {
                info!(count = records.len(), "Loaded photos");
                self.records = records;
                Ok(())
            }
            Err(e) => {
                self.fail("Error loading photos", &e);
                Err(e.into())
            }
        }
    }

    pub async fn filter_by_status(&mut self, status: Option<PhotoStatus>) -> Result<(), AdminError> {
        self.status_filter = status;
        self.load().await
    }

    /// Title/description search. An empty query reloads everything; one or
    /// two characters leave the list alone.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn search(&mut self, query: &str) -> Result<(), AdminError> {
        let query = query.trim();
        if query.is_empty() {
            return self.load().await;
        }
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(());
        }
        match self.store.search(query).await {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                self.fail("Error searching photos", &e);
                Err(e.into())
            }
        }
    }

    pub fn open_create(&mut self) {
        self.form = PhotoForm::default();
        self.mode = FormMode::Create;
        self.form_open = true;
    }

    pub fn edit(&mut self, id: &str) -> Result<(), AdminError> {
        let Some(record) = self.find(id) else {
            self.fail("", "Photo not found");
            return Err(AdminError::NotFound(id.to_string()));
        };
        self.form = PhotoForm::from_record(record);
        self.mode = FormMode::Edit(id.to_string());
        self.form_open = true;
        Ok(())
    }

    pub fn duplicate(&mut self, id: &str) -> Result<(), AdminError> {
        let Some(record) = self.find(id) else {
            self.fail("", "Photo not found");
            return Err(AdminError::NotFound(id.to_string()));
        };
        let mut form = PhotoForm::from_record(record);
        form.title = format!("{} (Copy)", form.title);
        self.form = form;
        self.mode = FormMode::Duplicate;
        self.form_open = true;
        Ok(())
    }

    pub fn close_form(&mut self) {
        self.form = PhotoForm::default();
        self.mode = FormMode::Create;
        self.form_open = false;
    }

    pub fn set_image_source(&mut self, source: ImageSource) {
        self.form.image_source = source;
    }

    /// Attach a file for upload after checking type and size.
    pub fn select_file(&mut self, file: ImageFile) -> Result<(), AdminError> {
        if let Err(e) = validate_image(&file) {
            self.fail("", &e);
            return Err(e.into());
        }
        info!(name = %file.name, size = %file.size_in_mb(), "Image selected");
        self.form.file = Some(file);
        Ok(())
    }

    pub fn remove_file(&mut self) {
        self.form.file = None;
    }

    /// Validate, upload if needed, then create or update. The submit control
    /// is disabled for the duration of the remote calls.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn submit(&mut self) -> Result<PhotoRecord, AdminError> {
        if !self.submit_enabled {
            return Err(AdminError::Busy);
        }
        let checked = self
            .form
            .check_image()
            .and_then(|_| self.form.to_payload());
        let payload = match checked {
            Ok(payload) => payload,
            Err(e) => {
                self.fail("", &e);
                return Err(e.into());
            }
        };

        let result = {
            let _busy = SubmitGuard::hold(&mut self.submit_enabled);
            persist(&self.store, &self.storage, &self.form, &self.mode, payload).await
        };

        match result {
            Ok(record) => {
                let message = match self.mode {
                    FormMode::Edit(_) => "Photo updated",
                    _ => "Photo created",
                };
                info!(id = %record.id, "{}", message);
                self.close_form();
                self.finish(message).await;
                Ok(record)
            }
            Err(e) => {
                self.fail("Error saving photo", &e);
                Err(e)
            }
        }
    }

    /// Ask for confirmation. A newer request replaces any pending one.
    pub fn request_delete(&mut self, id: &str) -> Result<&PendingDelete, AdminError> {
        let Some(record) = self.find(id) else {
            self.fail("", "Photo not found");
            return Err(AdminError::NotFound(id.to_string()));
        };
        let message = format!(
            "Are you sure you want to delete \"{}\"? This action cannot be undone.",
            record.title
        );
        Ok(self.pending_delete.insert(PendingDelete {
            id: id.to_string(),
            message,
        }))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the record awaiting confirmation. Nothing pending is a no-op.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn confirm_delete(&mut self) -> Result<(), AdminError> {
        let Some(pending) = self.pending_delete.take() else {
            return Ok(());
        };
        if let Err(e) = self.store.delete(&pending.id).await {
            self.fail("Error deleting photo", &e);
            return Err(e.into());
        }
        info!(id = %pending.id, "Photo deleted");
        self.finish("Photo deleted").await;
        Ok(())
    }

    /// Reload after a successful write. A failed reload replaces the success
    /// notice so the stale list is not presented as current.
    async fn finish(&mut self, message: &str) {
        match self.load().await {
            Ok(()) => self.notice = Some(Notice::Success(message.to_string())),
            Err(e) => {
                warn!("Reload after write failed: {}", e);
                self.notice = Some(Notice::Error(format!(
                    "{}, but the list could not be refreshed: {}",
                    message, e
                )));
            }
        }
    }
}

/// Upload the selected file if any, then create or update. A file uploaded
/// for a write that then fails is removed again.
async fn persist<S: RecordStore, F: FileStorage>(
    store: &S,
    storage: &F,
    form: &PhotoForm,
    mode: &FormMode,
    mut payload: api_client::PhotoPayload,
) -> Result<PhotoRecord, AdminError> {
    let uploaded = match (form.image_source, &form.file) {
        (ImageSource::Upload, Some(file)) => {
            let uploaded = storage.upload(file).await?;
            payload.image_url = uploaded.public_url.clone();
            Some(uploaded)
        }
        _ => None,
    };
    let result = write_record(store, mode, &payload).await;
    if let (Err(e), Some(uploaded)) = (&result, &uploaded) {
        warn!(path = %uploaded.path, "Removing upload after failed save: {}", e);
        if let Err(remove_err) = storage.remove(&uploaded.path).await {
            error!(path = %uploaded.path, "Could not remove orphaned upload: {}", remove_err);
        }
    }
    result
}

async fn write_record<S: RecordStore>(
    store: &S,
    mode: &FormMode,
    payload: &api_client::PhotoPayload,
) -> Result<PhotoRecord, AdminError> {
    match mode {
        FormMode::Edit(id) => {
            if store.get(id).await?.is_none() {
                return Err(AdminError::NotFound(id.clone()));
            }
            Ok(store.update(id, payload).await?)
        }
        FormMode::Create | FormMode::Duplicate => Ok(store.create(payload).await?),
    }
}
