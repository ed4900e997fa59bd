//! Status banner data for whatever renders the form.

use serde::Serialize;

use super::SubmissionStatus;
use crate::form::{DraftRecord, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerTone {
    Progress,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub tone: BannerTone,
    pub title: String,
    pub lines: Vec<String>,
    pub submit_enabled: bool,
}

impl Banner {
    /// `None` while idle: nothing is shown above the form.
    pub fn for_status(status: &SubmissionStatus, draft: &DraftRecord) -> Option<Self> {
        let banner = match status {
            SubmissionStatus::Idle => return None,
            SubmissionStatus::Submitting => Banner {
                tone: BannerTone::Progress,
                title: "Sending your message...".to_string(),
                lines: Vec::new(),
                submit_enabled: false,
            },
            SubmissionStatus::Succeeded => Banner {
                tone: BannerTone::Success,
                title: "Thanks! Your message has been sent.".to_string(),
                lines: vec!["We will get back to you shortly.".to_string()],
                submit_enabled: true,
            },
            SubmissionStatus::Failed(errors) => Banner {
                tone: BannerTone::Error,
                title: "Your message could not be sent.".to_string(),
                lines: errors.clone(),
                submit_enabled: true,
            },
            SubmissionStatus::Invalid(fields) => Banner {
                tone: BannerTone::Error,
                title: "Please check the highlighted fields.".to_string(),
                lines: ValidationError {
                    fields: fields.clone(),
                }
                .reasons(draft),
                submit_enabled: true,
            },
        };
        Some(banner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Field;

    #[test]
    fn test_idle_shows_nothing() {
        assert!(Banner::for_status(&SubmissionStatus::Idle, &DraftRecord::reset()).is_none());
    }

    #[test]
    fn test_submitting_disables_submit() {
        let banner =
            Banner::for_status(&SubmissionStatus::Submitting, &DraftRecord::reset()).unwrap();
        assert_eq!(banner.tone, BannerTone::Progress);
        assert!(!banner.submit_enabled);
    }

    #[test]
    fn test_failed_lists_reasons() {
        let status = SubmissionStatus::Failed(vec!["Invalid email".to_string()]);
        let banner = Banner::for_status(&status, &DraftRecord::reset()).unwrap();
        assert_eq!(banner.tone, BannerTone::Error);
        assert_eq!(banner.lines, vec!["Invalid email".to_string()]);
        assert!(banner.submit_enabled);
    }

    #[test]
    fn test_invalid_names_fields() {
        let draft = DraftRecord::reset().update(Field::Email, "nope");
        let status = SubmissionStatus::Invalid(vec![Field::Name, Field::Email]);
        let banner = Banner::for_status(&status, &draft).unwrap();
        assert_eq!(
            banner.lines,
            vec![
                "Name is required".to_string(),
                "Email is not valid".to_string()
            ]
        );
    }
}
