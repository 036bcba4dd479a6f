use qg_pacer::HeaderSource;
use reqwest::header::HeaderMap;

/// Quota-header view over a reqwest response's headers
///
/// Values that are not valid visible ASCII read as absent.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHeaders<'a>(&'a HeaderMap);

impl<'a> ResponseHeaders<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self(headers)
    }
}

impl HeaderSource for ResponseHeaders<'_> {
    fn header(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|value| value.to_str().ok())
    }
}
