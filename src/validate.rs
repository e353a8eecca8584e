//! Pure input shaping for chirp submissions. No I/O happens here; a
//! submission either comes out as a [`ValidChirp`] ready to persist or as a
//! field-by-field [`ValidationErrors`].

use axum::{http::StatusCode, response::{Html, IntoResponse, Response}};

use crate::db::AttachmentKind;
use crate::include_res;

pub const MIN_BODY_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct ChirpSubmission {
    pub body: String,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub attachments: Vec<AttachmentSubmission>,
}

#[derive(Debug)]
pub struct AttachmentSubmission {
    pub kind: String,
    pub url: String,
    pub filename: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug)]
pub struct ValidChirp {
    pub body: String,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub attachments: Vec<ValidAttachment>,
}

#[derive(Debug)]
pub struct ValidAttachment {
    pub kind: AttachmentKind,
    pub url: String,
    pub filename: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ValidationErrors(pub Vec<(&'static str, String)>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, msg: impl Into<String>) {
        self.0.push((field, msg.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        let mut items = String::new();
        for (field, msg) in &self.0 {
            items += &format!("<li><b>{field}</b>: {}</li>\n", crate::res::escape(msg));
        }

        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(include_res!(str, "/pages/invalid.html").replace("{errors}", &items)),
        )
            .into_response()
    }
}

pub fn validate(submission: ChirpSubmission) -> Result<ValidChirp, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let body = submission.body.trim().to_owned();
    if body.is_empty() {
        errors.push("chirp", "must not be empty");
    } else if body.chars().count() < MIN_BODY_LEN {
        errors.push("chirp", format!("minimum length is {MIN_BODY_LEN} characters"));
    }

    let mut hashtags = Vec::new();
    for tag in &submission.hashtags {
        let tag = tag.trim_start_matches('#').trim().to_lowercase();
        if tag.is_empty() {
            errors.push("hashtags", "empty tag");
        } else if !hashtags.contains(&tag) {
            hashtags.push(tag);
        }
    }

    let mut mentions = Vec::new();
    for handle in &submission.mentions {
        let handle = handle.trim_start_matches('@').trim().to_owned();
        if handle.is_empty() {
            errors.push("mentions", "mention without a username");
        } else if !mentions.contains(&handle) {
            mentions.push(handle);
        }
    }

    let mut attachments = Vec::new();
    for att in submission.attachments {
        let Some(kind) = AttachmentKind::parse(att.kind.trim()) else {
            errors.push("attachments", format!("unknown kind {:?}", att.kind));
            continue;
        };
        if att.url.trim().is_empty() {
            errors.push("attachments", "attachment without a url");
            continue;
        }
        attachments.push(ValidAttachment {
            kind,
            url: att.url.trim().to_owned(),
            filename: att.filename.filter(|f| !f.is_empty()),
            size: att.size,
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidChirp { body, hashtags, mentions, attachments })
}

/// Pulls `#tags` and `@mentions` out of a chirp body. Entities end at the
/// first character that isn't alphanumeric, `_` or `-`.
pub fn extract_entities(body: &str) -> (Vec<String>, Vec<String>) {
    let mut hashtags = Vec::new();
    let mut mentions = Vec::new();

    for word in body.split_whitespace() {
        let (sigil, rest) = match word.split_at_checked(1) {
            Some(x) => x,
            None => continue,
        };
        let entity: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if entity.is_empty() {
            continue;
        }

        match sigil {
            "#" => hashtags.push(entity),
            "@" => mentions.push(entity),
            _ => {}
        }
    }

    (hashtags, mentions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(body: &str) -> ChirpSubmission {
        ChirpSubmission { body: body.to_owned(), ..Default::default() }
    }

    #[test]
    fn rejects_short_body_citing_minimum_length() {
        let errors = validate(submission("Hi")).unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0[0].0, "chirp");
        assert!(errors.0[0].1.contains("minimum length"));
    }

    #[test]
    fn rejects_empty_and_whitespace_body() {
        assert!(validate(submission("")).is_err());
        assert!(validate(submission("   ")).is_err());
    }

    #[test]
    fn accepts_plain_body_with_empty_lists() {
        let valid = validate(submission("Hello world")).unwrap();
        assert_eq!(valid.body, "Hello world");
        assert!(valid.hashtags.is_empty());
        assert!(valid.mentions.is_empty());
        assert!(valid.attachments.is_empty());
    }

    #[test]
    fn normalizes_and_dedupes_hashtags() {
        let valid = validate(ChirpSubmission {
            body: "tagged".to_owned(),
            hashtags: vec!["#Rust".to_owned(), "rust".to_owned(), "Web".to_owned()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(valid.hashtags, vec!["rust", "web"]);
    }

    #[test]
    fn rejects_mention_without_username() {
        let errors = validate(ChirpSubmission {
            body: "hey there".to_owned(),
            mentions: vec!["@".to_owned()],
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.0[0].0, "mentions");
    }

    #[test]
    fn attachment_requires_known_kind_and_url() {
        let errors = validate(ChirpSubmission {
            body: "look at this".to_owned(),
            attachments: vec![
                AttachmentSubmission {
                    kind: "video".to_owned(),
                    url: "https://cdn.example/x".to_owned(),
                    filename: None,
                    size: None,
                },
                AttachmentSubmission {
                    kind: "image".to_owned(),
                    url: "".to_owned(),
                    filename: None,
                    size: None,
                },
            ],
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.0.len(), 2);
        assert!(errors.0.iter().all(|(field, _)| *field == "attachments"));
    }

    #[test]
    fn accepts_image_attachment() {
        let valid = validate(ChirpSubmission {
            body: "look at this".to_owned(),
            attachments: vec![AttachmentSubmission {
                kind: "image".to_owned(),
                url: "https://cdn.example/x.png".to_owned(),
                filename: Some("x.png".to_owned()),
                size: Some(1024),
            }],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(valid.attachments.len(), 1);
        assert_eq!(valid.attachments[0].kind, AttachmentKind::Image);
    }

    #[test]
    fn extracts_tags_and_mentions_from_body() {
        let (tags, mentions) = extract_entities("hey @bob, #Rust is neat #web-dev");
        assert_eq!(tags, vec!["Rust", "web-dev"]);
        assert_eq!(mentions, vec!["bob"]);
    }

    #[test]
    fn bare_sigils_are_not_entities() {
        let (tags, mentions) = extract_entities("# @ nothing here");
        assert!(tags.is_empty());
        assert!(mentions.is_empty());
    }
}
