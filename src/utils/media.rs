use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Decoded `data:<mime>;base64,<payload>` media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrlMedia {
    pub mime: String,
    pub bytes: Vec<u8>,
    pub filename: String,
}

pub fn is_data_url(s: &str) -> bool {
    s.starts_with("data:")
}

pub fn parse_data_url(data_url: &str) -> Option<DataUrlMedia> {
    let rest = data_url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() || mime.contains(';') || payload.is_empty() {
        return None;
    }

    let bytes = BASE64.decode(payload.trim()).ok()?;

    let ext = mime
        .split('/')
        .nth(1)
        .filter(|e| !e.is_empty())
        .unwrap_or("jpg");

    Some(DataUrlMedia {
        mime: mime.to_string(),
        bytes,
        filename: format!("media.{}", ext),
    })
}

/// Classifies a product media link the way the catalogue renders it.
pub fn media_type_for_url(url: &str) -> &'static str {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        "youtube"
    } else {
        "image"
    }
}
