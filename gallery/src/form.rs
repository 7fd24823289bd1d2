//! Admin photo form state and its conversion into a store payload.

use api_client::{parse_tags, ImageFile, PhotoPayload, PhotoRecord, PhotoStatus};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please select an image to upload")]
    MissingFile,
    #[error("Please provide an image URL")]
    MissingUrl,
    #[error("Title is required")]
    MissingTitle,
    #[error("Price must be a number")]
    InvalidPrice,
    #[error("Date must use YYYY-MM-DD")]
    InvalidDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSource {
    #[default]
    Upload,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(String),
    Duplicate,
}

impl FormMode {
    pub fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "Add Photo",
            FormMode::Edit(_) => "Edit Photo",
            FormMode::Duplicate => "Duplicate Photo",
        }
    }
}

/// Raw field values as typed by the admin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub location: String,
    pub date: String,
    pub tags: String,
    pub status: PhotoStatus,
    pub image_source: ImageSource,
    pub image_url: String,
    pub file: Option<ImageFile>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl PhotoForm {
    pub fn from_record(record: &PhotoRecord) -> Self {
        let image_source = if record.image_url.is_empty() {
            ImageSource::Upload
        } else {
            ImageSource::Url
        };
        PhotoForm {
            title: record.title.clone(),
            description: record.description.clone().unwrap_or_default(),
            price: record.price.map(|p| p.to_string()).unwrap_or_default(),
            location: record.location.clone().unwrap_or_default(),
            date: record
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            tags: record.tags.join(", "),
            status: record.status,
            image_source,
            image_url: record.image_url.clone(),
            file: None,
        }
    }

    /// Checks that an image will be available before anything is sent.
    pub fn check_image(&self) -> Result<(), FormError> {
        match self.image_source {
            ImageSource::Upload if self.file.is_none() => Err(FormError::MissingFile),
            ImageSource::Url if self.image_url.trim().is_empty() => Err(FormError::MissingUrl),
            _ => Ok(()),
        }
    }

    /// Build the payload; `image_url` is filled in by the caller once the
    /// image location is known.
    pub fn to_payload(&self) -> Result<PhotoPayload, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::MissingTitle);
        }
        let price = match optional(&self.price) {
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite())
                    .ok_or(FormError::InvalidPrice)?,
            ),
            None => None,
        };
        let date = match optional(&self.date) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| FormError::InvalidDate)?,
            ),
            None => None,
        };
        Ok(PhotoPayload {
            title: title.to_string(),
            description: optional(&self.description),
            image_url: self.image_url.trim().to_string(),
            price,
            location: optional(&self.location),
            date,
            tags: parse_tags(&self.tags),
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PhotoForm {
        PhotoForm {
            title: " Sunset ".into(),
            price: "120.5".into(),
            date: "2024-05-01".into(),
            tags: "mar, , atardecer ,mar".into(),
            image_source: ImageSource::Url,
            image_url: "https://cdn.example.com/s.jpg".into(),
            ..Default::default()
        }
    }

    #[test]
    fn payload_from_fields() {
        let payload = filled().to_payload().unwrap();
        assert_eq!(payload.title, "Sunset");
        assert_eq!(payload.price, Some(120.5));
        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(payload.tags, vec!["mar".to_string(), "atardecer".to_string()]);
        assert_eq!(payload.description, None);
    }

    #[test]
    fn bad_price_and_date_rejected() {
        let mut form = filled();
        form.price = "cheap".into();
        assert_eq!(form.to_payload().unwrap_err(), FormError::InvalidPrice);
        form.price.clear();
        form.date = "01/05/2024".into();
        assert_eq!(form.to_payload().unwrap_err(), FormError::InvalidDate);
    }

    #[test]
    fn image_checks() {
        let mut form = PhotoForm::default();
        assert_eq!(form.check_image().unwrap_err(), FormError::MissingFile);
        form.image_source = ImageSource::Url;
        form.image_url = "   ".into();
        assert_eq!(form.check_image().unwrap_err(), FormError::MissingUrl);
    }

    #[test]
    fn from_record_prefers_url_source() {
        let record = PhotoRecord {
            id: "4".into(),
            title: "Faro".into(),
            description: None,
            image_url: "https://cdn.example.com/4.jpg".into(),
            price: Some(80.0),
            location: None,
            date: None,
            tags: vec!["mar".into(), "noche".into()],
            status: PhotoStatus::Sold,
            created_at: None,
            updated_at: None,
        };
        let form = PhotoForm::from_record(&record);
        assert_eq!(form.image_source, ImageSource::Url);
        assert_eq!(form.tags, "mar, noche");
        assert_eq!(form.price, "80");
        assert_eq!(FormMode::Edit("4".into()).title(), "Edit Photo");
    }
}
