use bson::{Document, doc};
use serde::Deserialize;

use super::{Mode, lenient_number, number, require_text, require_value};

pub const SKILLS: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weeks: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tuition: Option<f64>,
    pub minimum_skill: Option<String>,
    pub scholarship_available: Option<bool>,
}

impl CourseInput {
    pub fn validate(&self, mode: Mode) -> Vec<String> {
        let mut errors = Vec::new();
        require_text(&mut errors, self.title.as_deref(), mode, "Please add a title");
        require_text(
            &mut errors,
            self.description.as_deref(),
            mode,
            "Please add a description",
        );

        require_value(&mut errors, self.weeks, mode, "Please add number of weeks");
        if self.weeks.is_some_and(|w| w < 1.0) {
            errors.push("Weeks must be at least 1".into());
        }

        require_value(&mut errors, self.tuition, mode, "Please add a tuition cost");
        if self.tuition.is_some_and(|t| t < 0.0) {
            errors.push("Tuition can not be negative".into());
        }

        match self.minimum_skill.as_deref() {
            None if mode == Mode::Create => errors.push("Please add a minimum skill".into()),
            Some(skill) if !SKILLS.contains(&skill) => {
                errors.push(format!("`{skill}` is not a valid minimum skill"))
            }
            _ => {}
        }
        errors
    }

    pub fn into_fields(self) -> Document {
        let mut out = Document::new();
        if let Some(title) = self.title {
            out.insert("title", title.trim());
        }
        if let Some(description) = self.description {
            out.insert("description", description);
        }
        if let Some(weeks) = self.weeks {
            out.insert("weeks", number(weeks));
        }
        if let Some(tuition) = self.tuition {
            out.insert("tuition", number(tuition));
        }
        if let Some(skill) = self.minimum_skill {
            out.insert("minimumSkill", skill);
        }
        if let Some(scholarship) = self.scholarship_available {
            out.insert("scholarshipAvailable", scholarship);
        }
        out
    }
}

pub fn new_document(fields: Document) -> Document {
    let mut out = doc! {
        "scholarshipAvailable": false,
        "createdAt": bson::DateTime::now(),
    };
    for (key, value) in fields {
        out.insert(key, value);
    }
    out
}
