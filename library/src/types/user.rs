use crate::index::Record;

/// A registered library user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identifier, unique within the directory.
    pub id: String,
    pub name: String,
    /// Free-form contact detail (phone, e-mail).
    pub contact: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact: contact.into(),
        }
    }
}

impl Record for User {
    type Key = String;

    fn key(&self) -> &String {
        &self.id
    }
}
