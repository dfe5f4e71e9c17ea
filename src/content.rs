//! Media record types
//!
//! A [`Content`] describes one scraped item: its identity, descriptive
//! metadata, and the remote images that belong to it. Records are produced by
//! scrapers outside this crate and are treated as read-only input here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A genre tag and the page it links to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Genre {
    #[serde(rename = "URL")]
    pub url: String,
    pub content: String,
}

/// A sample (preview) image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Sample {
    /// Position reported by the source site
    pub index: usize,
    /// Small preview URL
    pub thumb: String,
    /// Full-size image URL
    pub image: String,
    pub title: String,
}

/// A performer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Star {
    /// Portrait URL
    pub image: String,
    /// Profile page URL
    pub link: String,
    /// Primary (romanized) name
    pub name: String,
    /// Other names, e.g. in the original script
    pub alias: Vec<String>,
}

/// One scraped media item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Content {
    /// Source tag naming the site the record came from
    pub from: String,
    pub language: String,
    pub uncensored: bool,
    #[serde(rename = "ID")]
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub year: String,
    pub release_date: Option<DateTime<Utc>>,
    pub studio: String,
    pub director: String,
    pub movie_set: String,
    pub plot: String,
    pub genres: Vec<Genre>,
    pub actors: Vec<Star>,
    /// Poster URL
    pub poster: String,
    /// Thumb URL
    pub thumb: String,
    pub sample: Vec<Sample>,
    pub publisher: String,
}

impl Content {
    /// All image URLs referenced by this record, in a fixed order
    ///
    /// Poster, thumb, each actor portrait, then (when `with_samples` is set)
    /// each sample's image followed by its thumb. Empty URLs are left out.
    pub fn image_urls(&self, with_samples: bool) -> Vec<&str> {
        let mut urls = vec![self.poster.as_str(), self.thumb.as_str()];
        urls.extend(self.actors.iter().map(|a| a.image.as_str()));
        if with_samples {
            for sample in &self.sample {
                urls.push(&sample.image);
                urls.push(&sample.thumb);
            }
        }
        urls.retain(|u| !u.is_empty());
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Content {
        Content {
            id: "abc-123".to_string(),
            from: "javbus".to_string(),
            poster: "http://h/p.jpg".to_string(),
            thumb: String::new(),
            actors: vec![Star {
                image: "http://h/a.jpg".to_string(),
                name: "Actor".to_string(),
                ..Star::default()
            }],
            sample: vec![Sample {
                index: 1,
                image: "http://h/s1.jpg".to_string(),
                thumb: "http://h/s1t.jpg".to_string(),
                ..Sample::default()
            }],
            ..Content::default()
        }
    }

    #[test]
    fn test_image_urls_without_samples() {
        assert_eq!(record().image_urls(false), vec!["http://h/p.jpg", "http://h/a.jpg"]);
    }

    #[test]
    fn test_image_urls_with_samples() {
        assert_eq!(
            record().image_urls(true),
            vec!["http://h/p.jpg", "http://h/a.jpg", "http://h/s1.jpg", "http://h/s1t.jpg"]
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["ID"], "abc-123");
        assert_eq!(value["From"], "javbus");
        assert_eq!(value["Poster"], "http://h/p.jpg");
        assert_eq!(value["Actors"][0]["Name"], "Actor");
        assert_eq!(value["Sample"][0]["Index"], 1);
        assert!(value["ReleaseDate"].is_null());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let content: Content =
            serde_json::from_str(r#"{ "ID": "XYZ-001", "Poster": "http://h/p.jpg" }"#).unwrap();
        assert_eq!(content.id, "XYZ-001");
        assert_eq!(content.poster, "http://h/p.jpg");
        assert!(content.actors.is_empty());
    }
}
