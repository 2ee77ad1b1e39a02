//! Response message model.

use super::body::BodyData;
use super::headers::HeaderMultiMap;

/// A response as the pipeline emits it.
#[derive(Debug, Clone, Default)]
pub struct ResponseMessage {
    pub status_code: u16,
    pub headers: HeaderMultiMap,
    pub body: Option<BodyData>,
}

impl ResponseMessage {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: HeaderMultiMap::new(),
            body: None,
        }
    }

    /// Body as text, when one is present and decodes.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.text.as_deref())
    }
}
