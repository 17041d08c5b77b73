use bson::{Document, doc};
use serde::Deserialize;

use super::{Mode, lenient_number, number, require_text, require_value};

const MAX_TITLE: usize = 100;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewInput {
    pub title: Option<String>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
}

impl ReviewInput {
    pub fn validate(&self, mode: Mode) -> Vec<String> {
        let mut errors = Vec::new();
        require_text(
            &mut errors,
            self.title.as_deref(),
            mode,
            "Please add a title for the review",
        );
        if self
            .title
            .as_deref()
            .is_some_and(|t| t.trim().chars().count() > MAX_TITLE)
        {
            errors.push(format!("Title can not be more than {MAX_TITLE} characters"));
        }
        require_text(&mut errors, self.text.as_deref(), mode, "Please add some text");

        let message = "Please add a rating between 1 and 10";
        require_value(&mut errors, self.rating, mode, message);
        if self
            .rating
            .is_some_and(|r| !(MIN_RATING..=MAX_RATING).contains(&r))
        {
            errors.push(message.into());
        }
        errors
    }

    pub fn into_fields(self) -> Document {
        let mut out = Document::new();
        if let Some(title) = self.title {
            out.insert("title", title.trim());
        }
        if let Some(text) = self.text {
            out.insert("text", text);
        }
        if let Some(rating) = self.rating {
            out.insert("rating", number(rating));
        }
        out
    }
}

pub fn new_document(fields: Document) -> Document {
    let mut out = doc! { "createdAt": bson::DateTime::now() };
    for (key, value) in fields {
        out.insert(key, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range() {
        for (rating, ok) in [(0.0, false), (1.0, true), (10.0, true), (10.5, false)] {
            let input = ReviewInput {
                title: Some("Great".into()),
                text: Some("Learned a lot".into()),
                rating: Some(rating),
            };
            assert_eq!(input.validate(Mode::Create).is_empty(), ok, "rating {rating}");
        }
    }

    #[test]
    fn required_on_create_only() {
        assert_eq!(ReviewInput::default().validate(Mode::Create).len(), 3);
        assert!(ReviewInput::default().validate(Mode::Update).is_empty());
    }

    #[test]
    fn long_title() {
        let input = ReviewInput {
            title: Some("t".repeat(101)),
            ..ReviewInput::default()
        };
        assert_eq!(
            input.validate(Mode::Update),
            vec!["Title can not be more than 100 characters"]
        );
    }
}
