//! Feature source error types.

/// Errors from fetching layers and features.
///
/// Any of these aborts the sync that triggered the fetch; the previously
/// stored network is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The server answered 200 with an ArcGIS error payload
    #[error("ArcGIS error {code} from {url}: {message}")]
    Arcgis {
        url: String,
        code: i64,
        message: String,
    },

    /// The response body was not the JSON we expected
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// One page of a paginated layer query failed
    #[error("failed to fetch page at offset {offset} of layer {layer}: {source}")]
    Page {
        layer: String,
        offset: usize,
        #[source]
        source: Box<SourceError>,
    },

    /// Discovery found no stop or line layers
    #[error("no transit layers found")]
    NoLayers,

    /// Fixture data could not be read
    #[error("mock data error: {message}")]
    Mock { message: String },

    /// The request limiter was shut down
    #[error("request limiter closed")]
    LimiterClosed,
}

impl SourceError {
    pub(crate) fn json(err: impl std::fmt::Display) -> Self {
        SourceError::Json {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SourceError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API error 503: Service Unavailable");

        let err = SourceError::Page {
            layer: "Metro stations".into(),
            offset: 2000,
            source: Box::new(SourceError::Arcgis {
                url: "https://host/0/query".into(),
                code: 400,
                message: "Invalid query".into(),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("offset 2000"));
        assert!(text.contains("Metro stations"));
        assert!(text.contains("Invalid query"));

        assert_eq!(SourceError::NoLayers.to_string(), "no transit layers found");
    }
}
