use bson::{Document, doc};
use serde::Deserialize;

use super::{Mode, is_email, is_http_url, require_text};

pub const CAREERS: &[&str] = &[
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";
const MAX_NAME: usize = 50;
const MAX_DESCRIPTION: usize = 500;
const MAX_PHONE: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Geocoded into `location`; never stored itself.
    pub address: Option<String>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl BootcampInput {
    pub fn validate(&self, mode: Mode) -> Vec<String> {
        let mut errors = Vec::new();

        require_text(&mut errors, self.name.as_deref(), mode, "Please add a name");
        if self.name.as_deref().is_some_and(|n| n.trim().chars().count() > MAX_NAME) {
            errors.push(format!("Name can not be more than {MAX_NAME} characters"));
        }

        require_text(
            &mut errors,
            self.description.as_deref(),
            mode,
            "Please add a description",
        );
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION)
        {
            errors.push(format!(
                "Description can not be more than {MAX_DESCRIPTION} characters"
            ));
        }

        if self.website.as_deref().is_some_and(|w| !is_http_url(w)) {
            errors.push("Please use a valid URL with HTTP or HTTPS".into());
        }
        if self.phone.as_deref().is_some_and(|p| p.chars().count() > MAX_PHONE) {
            errors.push(format!(
                "Phone number can not be longer than {MAX_PHONE} characters"
            ));
        }
        if self.email.as_deref().is_some_and(|e| !is_email(e.trim())) {
            errors.push("Please add a valid email".into());
        }

        require_text(&mut errors, self.address.as_deref(), mode, "Please add an address");

        match &self.careers {
            None if mode == Mode::Create => errors.push("Please add at least one career".into()),
            Some(careers) if careers.is_empty() => {
                errors.push("Please add at least one career".into())
            }
            Some(careers) => {
                for career in careers {
                    if !CAREERS.contains(&career.as_str()) {
                        errors.push(format!("`{career}` is not a valid career"));
                    }
                }
            }
            None => {}
        }
        errors
    }

    /// Stored fields other than `location`. A new name also sets `slug`.
    pub fn into_fields(self) -> Document {
        let mut out = Document::new();
        if let Some(name) = self.name {
            let name = name.trim().to_string();
            out.insert("slug", slugify(&name));
            out.insert("name", name);
        }
        let text = [
            ("description", self.description),
            ("website", self.website),
            ("phone", self.phone),
            ("email", self.email.map(|e| e.trim().to_string())),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        if let Some(careers) = self.careers {
            out.insert("careers", careers);
        }
        let flags = [
            ("housing", self.housing),
            ("jobAssistance", self.job_assistance),
            ("jobGuarantee", self.job_guarantee),
            ("acceptGi", self.accept_gi),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        out
    }
}

/// A new bootcamp with defaults applied; `fields` win over defaults.
pub fn new_document(fields: Document) -> Document {
    let mut out = doc! {
        "photo": DEFAULT_PHOTO,
        "housing": false,
        "jobAssistance": false,
        "jobGuarantee": false,
        "acceptGi": false,
        "createdAt": bson::DateTime::now(),
    };
    for (key, value) in fields {
        out.insert(key, value);
    }
    out
}

/// Lowercase, ASCII-alphanumeric words joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devworks() -> BootcampInput {
        BootcampInput {
            name: Some("Devworks Bootcamp".into()),
            description: Some("Full stack web development".into()),
            website: Some("https://devworks.com".into()),
            phone: Some("(111) 111-1111".into()),
            email: Some("enroll@devworks.com".into()),
            address: Some("233 Bay State Rd Boston MA 02215".into()),
            careers: Some(vec!["Web Development".into(), "UI/UX".into()]),
            housing: Some(true),
            ..BootcampInput::default()
        }
    }

    #[test]
    fn valid_input() {
        assert!(devworks().validate(Mode::Create).is_empty());
    }

    #[test]
    fn create_requires_core_fields() {
        let errors = BootcampInput::default().validate(Mode::Create);
        assert_eq!(
            errors,
            vec![
                "Please add a name",
                "Please add a description",
                "Please add an address",
                "Please add at least one career",
            ]
        );
        assert!(BootcampInput::default().validate(Mode::Update).is_empty());
    }

    #[test]
    fn field_limits() {
        let input = BootcampInput {
            name: Some("x".repeat(51)),
            website: Some("devworks.com".into()),
            phone: Some("1".repeat(21)),
            careers: Some(vec!["Cooking".into()]),
            ..devworks()
        };
        assert_eq!(
            input.validate(Mode::Update),
            vec![
                "Name can not be more than 50 characters",
                "Please use a valid URL with HTTP or HTTPS",
                "Phone number can not be longer than 20 characters",
                "`Cooking` is not a valid career",
            ]
        );
    }

    #[test]
    fn fields_include_slug_and_skip_address() {
        let fields = devworks().into_fields();
        assert_eq!(fields.get_str("name").unwrap(), "Devworks Bootcamp");
        assert_eq!(fields.get_str("slug").unwrap(), "devworks-bootcamp");
        assert!(fields.get_bool("housing").unwrap());
        assert!(!fields.contains_key("address"));
        assert!(!fields.contains_key("jobGuarantee"));
    }

    #[test]
    fn defaults_fill_gaps() {
        let d = new_document(doc! { "housing": true });
        assert!(d.get_bool("housing").unwrap());
        assert!(!d.get_bool("acceptGi").unwrap());
        assert_eq!(d.get_str("photo").unwrap(), DEFAULT_PHOTO);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("ModernTech Bootcamp"), "moderntech-bootcamp");
        assert_eq!(slugify("  Codemasters & Co.  "), "codemasters-co");
    }
}
