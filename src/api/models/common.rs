use serde::Deserialize;

/// Response body that may or may not be wrapped in a `data` envelope
///
/// List endpoints answer `{"success": true, "data": [...]}` while a few
/// older ones return the bare value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    pub fn into_inner(self) -> T {
        match self {
            Payload::Wrapped { data } => data,
            Payload::Bare(value) => value,
        }
    }
}

/// Acknowledgement returned by mutations without a body of interest
#[derive(Debug, Deserialize)]
pub struct SuccessResponse {
    #[serde(default = "acknowledged")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn acknowledged() -> bool {
    true
}
