use thiserror::Error;

/// Where in a worksheet a row-level failure happened.
///
/// Row numbers are 1-based and count the header line, so the first data row
/// is row 2, matching what a spreadsheet shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLocation {
    pub file: Option<String>,
    pub row: usize,
}

impl std::fmt::Display for RowLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "({}) row {}", file, self.row),
            None => write!(f, "row {}", self.row),
        }
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("'{column}' is empty at {at}")]
    MissingField { column: String, at: RowLocation },

    #[error("The experiment key of {at} conflicts with row {other_row}, both are {key:?}")]
    DuplicateSignature {
        at: RowLocation,
        other_row: usize,
        key: Vec<String>,
    },

    #[error("Unknown gene {0:?} (expected one of CA, PR, RT, IN)")]
    UnknownGene(String),

    #[error("Invalid {field} value {value:?} at {at}")]
    InvalidMeasure {
        field: String,
        value: String,
        at: RowLocation,
    },

    /// The mutation pattern produced a match that breaks its own contract.
    #[error("Mutation grammar invariant violated: {0}")]
    Grammar(String),

    #[error("{error} at {at}")]
    AtRow {
        error: Box<EtlError>,
        at: RowLocation,
    },
}

impl EtlError {
    /// Attaches `at` unless the error already names its row.
    pub fn located(self, at: &RowLocation) -> Self {
        match self {
            EtlError::UnknownGene(_) | EtlError::Grammar(_) => EtlError::AtRow {
                error: Box::new(self),
                at: at.clone(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

/// `located` for results, used where a cell is handed to the mutation parser.
pub trait AtRow<T> {
    fn at_row(self, at: &RowLocation) -> Result<T>;
}

impl<T> AtRow<T> for Result<T> {
    fn at_row(self, at: &RowLocation) -> Result<T> {
        self.map_err(|e| e.located(at))
    }
}
