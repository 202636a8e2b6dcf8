/// Accordion state: at most one row is expanded at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: Option<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn is_expanded(&self, row_id: &str) -> bool {
        self.expanded.as_deref() == Some(row_id)
    }

    pub fn len(&self) -> usize {
        usize::from(self.expanded.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_none()
    }

    /// Returns the next state without touching `self`.
    pub fn toggled(&self, row_id: &str) -> Self {
        if self.is_expanded(row_id) {
            Self { expanded: None }
        } else {
            Self {
                expanded: Some(row_id.to_string()),
            }
        }
    }

    pub fn toggle(&mut self, row_id: &str) {
        *self = self.toggled(row_id);
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    /// Drops the expansion when its row is no longer among `visible_ids`.
    pub fn retain_visible<'a>(&mut self, mut visible_ids: impl Iterator<Item = &'a str>) {
        if let Some(expanded) = self.expanded.as_deref() {
            if !visible_ids.any(|id| id == expanded) {
                self.expanded = None;
            }
        }
    }
}
