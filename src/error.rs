use thiserror::Error;

/// Errors that can occur while generating recipes
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Required request input was missing or blank
    #[error("{0}")]
    MissingInput(String),

    /// HTTP transport failure talking to an upstream service
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The text-generation provider returned an error or no text
    #[error("Text generation failed: {0}")]
    Generation(String),

    /// The model reply contained no recognizable recipe
    #[error("Chef Quirky could not understand the recipe format")]
    UnrecognizedFormat,

    /// The recipe is missing its ingredients or instructions
    #[error("Recipe is incomplete: {0}")]
    IncompleteRecipe(String),

    /// The image-generation provider failed
    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    /// The image prediction never reached a terminal state
    #[error("Image generation timed out after {0} polls")]
    ImageTimeout(u32),

    /// Provider setup error (unknown, disabled or missing credentials)
    #[error("Provider error: {0}")]
    Provider(String),

    /// The PDF document could not be built
    #[error("PDF export failed: {0}")]
    Pdf(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecipeError {
    /// Whether the error was caused by the caller's input rather than a downstream failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, RecipeError::MissingInput(_))
    }
}

/// Internal failures of the response parser.
///
/// These never escape [`crate::parser::RecipeParser::parse`]; they are turned
/// into an empty result with a diagnostic note.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("response is {size} bytes, limit is {limit}")]
    InputTooLarge { size: usize, limit: usize },
}
