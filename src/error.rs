#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl AppError {
    /// Pipeline stage the error belongs to, used in the run diagnostic.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Fetch(_) | AppError::Http(_) => "fetch",
            AppError::Render(_) => "render",
            AppError::Delivery(_) => "delivery",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Render(format!("Failed to build workbook: {e}"))
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Render(format!("Failed to render email body: {e}"))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(e: lettre::error::Error) -> Self {
        AppError::Delivery(format!("Failed to build message: {e}"))
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(e: lettre::address::AddressError) -> Self {
        AppError::Delivery(format!("Invalid mail address: {e}"))
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        AppError::Delivery(format!("SMTP failure: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_taxonomy() {
        assert_eq!(AppError::Config("x".into()).stage(), "config");
        assert_eq!(AppError::Fetch("r/jobs".into()).stage(), "fetch");
        assert_eq!(AppError::Render("bad row".into()).stage(), "render");
        assert_eq!(AppError::Delivery("smtp down".into()).stage(), "delivery");
    }

    #[test]
    fn display_includes_detail() {
        let err = AppError::Delivery("connection refused".into());
        assert_eq!(err.to_string(), "Delivery error: connection refused");
    }
}
