/// Failure of a request to the favorites backend or the metadata service.
///
/// Targets are human readable descriptions ("favorites for alice",
/// "movie 550") rather than URLs, so the TMDB API key never ends up in a
/// message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch {target}: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} responded with HTTP {status} for {target}{}", detail(.message))]
    Status {
        service: &'static str,
        target: String,
        status: u16,
        message: Option<String>,
    },
    #[error("Invalid response for {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

impl FetchError {
    pub fn status(service: &'static str, target: impl Into<String>, status: u16) -> Self {
        FetchError::Status {
            service,
            target: target.into(),
            status,
            message: None,
        }
    }
}
