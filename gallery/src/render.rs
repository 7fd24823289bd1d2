//! Turns photo records into display cards carrying filter metadata.

use crate::filter::FilterValue;
use api_client::{PhotoRecord, PhotoStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryCard {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub alt: String,
    pub tags: Vec<String>,
    pub sold: bool,
    pub description_label: String,
    pub price_label: String,
    pub location_label: String,
    pub date_label: Option<String>,
}

pub fn description_label(description: Option<&str>) -> String {
    match description.map(str::trim) {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => "No description".to_string(),
    }
}

/// A zero price counts as unset, like an empty field in the admin form.
pub fn price_label(price: Option<f64>) -> String {
    match price {
        Some(p) if p > 0.0 => format!("${}", p),
        _ => "Price not specified".to_string(),
    }
}

pub fn location_label(location: Option<&str>) -> String {
    match location.map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => "No location".to_string(),
    }
}

pub fn render_card(record: &PhotoRecord) -> GalleryCard {
    GalleryCard {
        id: record.id.clone(),
        title: record.title.clone(),
        image_url: record.image_url.clone(),
        alt: record.title.clone(),
        tags: record.tags.clone(),
        sold: record.status == PhotoStatus::Sold,
        description_label: description_label(record.description.as_deref()),
        price_label: price_label(record.price),
        location_label: location_label(record.location.as_deref()),
        date_label: record.date.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

pub fn render_cards(records: &[PhotoRecord]) -> Vec<GalleryCard> {
    records.iter().map(render_card).collect()
}

/// The sentinel first, then every distinct tag in order of first use.
pub fn filter_values(records: &[PhotoRecord]) -> Vec<FilterValue> {
    let mut values = vec![FilterValue::All];
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        let value = FilterValue::Tag(tag.clone());
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, tags: &[&str]) -> PhotoRecord {
        PhotoRecord {
            id: id.into(),
            title: format!("Photo {}", id),
            description: Some("  ".into()),
            image_url: format!("https://cdn.example.com/{}.jpg", id),
            price: Some(150.0),
            location: None,
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 9),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            status: PhotoStatus::Sold,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn card_labels() {
        let card = render_card(&record("1", &["mar"]));
        assert_eq!(card.alt, "Photo 1");
        assert_eq!(card.description_label, "No description");
        assert_eq!(card.price_label, "$150");
        assert_eq!(card.location_label, "No location");
        assert_eq!(card.date_label.as_deref(), Some("2024-01-09"));
        assert!(card.sold);
    }

    #[test]
    fn price_label_zero_is_unset() {
        assert_eq!(price_label(Some(0.0)), "Price not specified");
        assert_eq!(price_label(Some(99.5)), "$99.5");
    }

    #[test]
    fn filter_values_first_seen_order() {
        let records = vec![
            record("1", &["urbano", "noche"]),
            record("2", &["naturaleza", "urbano"]),
        ];
        let values = filter_values(&records);
        assert_eq!(
            values,
            vec![
                FilterValue::All,
                FilterValue::Tag("urbano".into()),
                FilterValue::Tag("noche".into()),
                FilterValue::Tag("naturaleza".into()),
            ]
        );
    }
}
