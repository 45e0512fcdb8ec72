use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    Input(String),
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: String, found: String },
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("no nearby network found for snapping")]
    NoPointsFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("route processing exceeded its time budget")]
    TimeBudgetExceeded,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Short failure label for run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "input",
            Error::CrsMismatch { .. } => "crs-mismatch",
            Error::DegenerateGeometry(_) => "degenerate-geometry",
            Error::NoPointsFound => "unreachable-seed",
            Error::Storage(_) => "storage",
            Error::TimeBudgetExceeded => "time-budget",
            Error::Io(_) => "io",
            Error::GeoJson(_) => "geojson",
            Error::Csv(_) => "csv",
        }
    }

    /// Failures that skip a single route instead of aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DegenerateGeometry(_) | Error::NoPointsFound | Error::TimeBudgetExceeded
        )
    }
}
