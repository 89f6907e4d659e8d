pub type DriftwallResult<T> = Result<T, DriftwallError>;

#[derive(thiserror::Error, Debug)]
pub enum DriftwallError {
    #[error("schedule format error: {0}")]
    ScheduleFormat(String),

    #[error("schedule has no events")]
    EmptySchedule,

    #[error("schedule total duration is zero")]
    DegenerateSchedule,

    #[error("image load error: {0}")]
    ImageLoad(String),

    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    #[error("need at least 2 images to build a playlist, found {found}")]
    InsufficientImages { found: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DriftwallError {
    pub fn schedule_format(msg: impl Into<String>) -> Self {
        Self::ScheduleFormat(msg.into())
    }

    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    pub fn invalid_directory(msg: impl Into<String>) -> Self {
        Self::InvalidDirectory(msg.into())
    }

    /// True for errors a refresh tick recovers from by keeping the prior
    /// frame; everything else is fatal at load time.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateSchedule | Self::ImageLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            DriftwallError::schedule_format("x")
                .to_string()
                .contains("schedule format error:")
        );
        assert!(
            DriftwallError::image_load("x")
                .to_string()
                .contains("image load error:")
        );
        assert!(
            DriftwallError::InsufficientImages { found: 1 }
                .to_string()
                .contains("found 1")
        );
    }

    #[test]
    fn recoverable_split_matches_taxonomy() {
        assert!(DriftwallError::DegenerateSchedule.is_recoverable());
        assert!(DriftwallError::image_load("x").is_recoverable());
        assert!(!DriftwallError::EmptySchedule.is_recoverable());
        assert!(!DriftwallError::schedule_format("x").is_recoverable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = DriftwallError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
