use crate::core::PropertyId;

pub type MenuclipResult<T> = Result<T, MenuclipError>;

/// Fatal errors: the pass aborts and no output is produced.
#[derive(thiserror::Error, Debug)]
pub enum MenuclipError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("menu error: {0}")]
    Menu(String),

    #[error("animation error: {0}")]
    Animation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MenuclipError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn menu(msg: impl Into<String>) -> Self {
        Self::Menu(msg.into())
    }

    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MenuclipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

/// Failure to lower one property set into clips. Only the affected keyframe
/// (or costume) is dropped; the pass records a diagnostic and continues.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LoweringError {
    #[error("property '{property}' is declared more than once with different values")]
    DuplicateProperty { property: PropertyId },

    #[error("no baseline value is known for property '{property}'")]
    MissingBaseline { property: PropertyId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PropertyKind;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            MenuclipError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(MenuclipError::menu("x").to_string().contains("menu error:"));
        assert!(
            MenuclipError::animation("x")
                .to_string()
                .contains("animation error:")
        );
        assert!(
            MenuclipError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = MenuclipError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_become_serde() {
        let err: MenuclipError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, MenuclipError::Serde(_)));
    }

    #[test]
    fn lowering_error_names_the_property() {
        let property = PropertyId::new("Body", PropertyKind::BlendShape, "smile");
        let err = LoweringError::MissingBaseline { property };
        assert!(err.to_string().contains("Body#blendshape:smile"));
    }
}
