pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("empty command for service `{0}`")]
    EmptyCommand(String),
    #[error("`{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("unknown process id {0}")]
    UnknownProcess(u64),
}
