//! The single user selection
//!
//!  At most one identity is selected. The selection may name an identity that
//!  is not live yet; it is honored when that identity is first drawn.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_selected(&self, identity: &str) -> bool {
        self.selected.as_deref() == Some(identity)
    }

    /// Select `identity`, returning the previously selected one if it differs
    pub fn replace(&mut self, identity: &str) -> Option<String> {
        match self.selected.replace(identity.to_string()) {
            Some(prev) if prev != identity => Some(prev),
            _ => None,
        }
    }

    /// Clear the selection, returning what was selected
    pub fn take(&mut self) -> Option<String> {
        self.selected.take()
    }
}
