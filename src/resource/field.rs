//! Tri-state field updates.

/// Requested change to one optional field of a resource.
///
/// Keeps "not supplied" apart from "supplied as empty", which a plain
/// `Option` would collapse.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldUpdate<T> {
    /// Leave the field as it is
    #[default]
    Unchanged,
    /// Remove the field
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, FieldUpdate::Unchanged)
    }

    /// Apply this update to a field of the resource being edited
    pub fn apply_to(&self, target: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            FieldUpdate::Unchanged => {}
            FieldUpdate::Clear => *target = None,
            FieldUpdate::Set(value) => *target = Some(value.clone()),
        }
    }
}

impl FieldUpdate<String> {
    /// Map a text flag: absent leaves the field alone, an empty string clears it
    pub fn from_text_flag(value: Option<String>) -> Self {
        match value {
            None => FieldUpdate::Unchanged,
            Some(s) if s.is_empty() => FieldUpdate::Clear,
            Some(s) => FieldUpdate::Set(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_flag_is_tri_state() {
        assert_eq!(FieldUpdate::from_text_flag(None), FieldUpdate::Unchanged);
        assert_eq!(
            FieldUpdate::from_text_flag(Some(String::new())),
            FieldUpdate::Clear
        );
        assert_eq!(
            FieldUpdate::from_text_flag(Some("frontend".into())),
            FieldUpdate::Set("frontend".to_string())
        );
    }

    #[test]
    fn test_apply_to() {
        let mut description = Some("old".to_string());

        FieldUpdate::Unchanged.apply_to(&mut description);
        assert_eq!(description.as_deref(), Some("old"));

        FieldUpdate::Set("new".to_string()).apply_to(&mut description);
        assert_eq!(description.as_deref(), Some("new"));

        FieldUpdate::<String>::Clear.apply_to(&mut description);
        assert_eq!(description, None);
    }
}
