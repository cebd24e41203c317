/// State carried between the entries of one render pass.
///
/// Group blocks (`\begingroup{year}...\endgroup{year}`) are suppressed when
/// their value equals the value of the previous rendered group, so a header
/// is printed once for a run of consecutive entries. Share one session
/// across a pass and [`reset`](Self::reset) it (or start a new one) before
/// an unrelated pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSession {
    current_group: Option<String>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value of the last group block that was rendered.
    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Forget the current group.
    pub fn reset(&mut self) {
        self.current_group = None;
    }

    /// Whether `value` repeats the current group, ignoring case.
    pub(crate) fn repeats_group(&self, value: &str) -> bool {
        self.current_group
            .as_deref()
            .is_some_and(|current| current.to_lowercase() == value.to_lowercase())
    }

    pub(crate) fn enter_group(&mut self, value: String) {
        self.current_group = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_tracking() {
        let mut session = RenderSession::new();
        assert!(!session.repeats_group("2001"));

        session.enter_group("Physics".to_string());
        assert_eq!(session.current_group(), Some("Physics"));
        assert!(session.repeats_group("physics"));
        assert!(!session.repeats_group("Chemistry"));

        session.reset();
        assert_eq!(session.current_group(), None);
    }
}
