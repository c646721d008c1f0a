pub type PlakatResult<T> = Result<T, PlakatError>;

#[derive(thiserror::Error, Debug)]
pub enum PlakatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlakatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PlakatError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(PlakatError::asset("x").to_string().contains("asset error:"));
        assert!(
            PlakatError::layout("x")
                .to_string()
                .contains("layout error:")
        );
        assert!(
            PlakatError::render("x")
                .to_string()
                .contains("render error:")
        );
        assert!(
            PlakatError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PlakatError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
