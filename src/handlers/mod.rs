mod about;
mod posts;
mod users;

pub use about::*;
pub use posts::*;
pub use users::*;

use axum::http::Uri;

use crate::errors::RequestError;

// ----------------- Helper Handlers -----------------

pub async fn not_found(uri: Uri) -> RequestError {
    tracing::debug!("No route for {}", uri);
    RequestError::NotFound
}

/// Object ids come from the URL as text; anything that is not a number names
/// no object.
pub(crate) fn parse_id(raw: &str) -> Result<i64, RequestError> {
    raw.parse().map_err(|_| RequestError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_id_is_not_found() {
        assert_eq!(parse_id("42").ok(), Some(42));
        assert!(matches!(parse_id("abc"), Err(RequestError::NotFound)));
        assert!(matches!(parse_id("-"), Err(RequestError::NotFound)));
        assert!(matches!(
            parse_id("99999999999999999999"),
            Err(RequestError::NotFound)
        ));
    }
}
