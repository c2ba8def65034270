use std::fmt::Formatter;

#[derive(Debug, PartialEq)]
pub enum GrabError {
    /// Parameter is the error the WebDriver server answered with
    ErrorStartingBrowser(String),
    /// Parameter is the underlying driver error message
    BrowserError(String),
    SessionTimeout,
    ErrorCreatingDestinationDirectory(String),
    /// parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
    NetworkError(String),
    ErrorStatusCode {
        status_code: String,
        url: String,
    },
    InvalidUrl(String),
}

impl std::fmt::Display for GrabError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            GrabError::ErrorStartingBrowser(err) => {
                format!("error starting a browser session. {err}")
            }
            GrabError::BrowserError(err) => format!("browser session error. {err}"),
            GrabError::SessionTimeout => {
                "login was not completed within the allowed wait time".to_string()
            }
            GrabError::ErrorCreatingDestinationDirectory(err) => {
                format!("error creating destination directory. {err}")
            }
            GrabError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
            GrabError::NetworkError(err) => format!("error connecting to internet. {err}"),
            GrabError::ErrorStatusCode { status_code, url } => {
                format!("server returned an error response. {url} => {status_code}")
            }
            GrabError::InvalidUrl(url) => format!("Invalid url received : {url}"),
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for GrabError {}
