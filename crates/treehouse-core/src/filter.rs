/// Focus/mute selection applied to every captured output line.
///
/// Focus wins over mute: with a focus set, the mute selector is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFilter {
    focus: Option<String>,
    mute: Option<String>,
}

impl StreamFilter {
    /// Empty selectors mean "no restriction".
    #[must_use]
    pub fn new(focus: Option<String>, mute: Option<String>) -> Self {
        Self {
            focus: focus.filter(|s| !s.is_empty()),
            mute: mute.filter(|s| !s.is_empty()),
        }
    }

    #[must_use]
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    #[must_use]
    pub fn mute(&self) -> Option<&str> {
        self.mute.as_deref()
    }

    /// Whether a line produced by `service` should be forwarded.
    #[must_use]
    pub fn allows(&self, service: &str) -> bool {
        match (&self.focus, &self.mute) {
            (Some(focus), _) => focus == service,
            (None, Some(mute)) => mute != service,
            (None, None) => true,
        }
    }
}
