use thiserror::Error;

/// Every failure the dashboard can surface to the user.
///
/// Handlers never distinguish between kinds beyond picking a status code:
/// the message is rendered as-is on the error page.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("the file is empty or has no header row")]
    Empty,

    #[error("unsupported file type: {0} (only .csv files are accepted)")]
    UnsupportedFile(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("no dataset with id '{0}' (it may have expired, upload the file again)")]
    UnknownDataset(String),

    #[error("invalid filter value for '{field}': {value}")]
    Filter { field: &'static str, value: String },

    #[error("failed to draw chart: {0}")]
    Chart(String),

    #[error("failed to render page: {0}")]
    Render(String),

    #[error("failed to build workbook: {0}")]
    Workbook(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    /// True for errors caused by what the user sent rather than by the server.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Csv(_)
                | DashboardError::Empty
                | DashboardError::UnsupportedFile(_)
                | DashboardError::Upload(_)
                | DashboardError::Filter { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        assert!(DashboardError::Empty.is_input_error());
        assert!(
            DashboardError::Filter {
                field: "start",
                value: "yesterday".to_string()
            }
            .is_input_error()
        );
        assert!(!DashboardError::Render("boom".to_string()).is_input_error());
        assert!(!DashboardError::UnknownDataset("x".to_string()).is_input_error());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = DashboardError::UnsupportedFile("xlsx".to_string());
        assert!(err.to_string().contains("xlsx"));
    }
}
