use crate::models::{ClassGroup, Guardian, Student, Subject, Teacher};
use serde::{Deserialize, Serialize};

/// Column accessor implemented by every record type a list screen can browse.
pub trait ListRow {
    const KIND: ResourceKind;

    fn row_id(&self) -> String;

    fn display_name(&self) -> String;

    /// Fields the free-text search matches against.
    fn search_fields(&self) -> Vec<String>;

    fn columns() -> &'static [&'static str];

    fn column(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Student,
    Teacher,
    ClassGroup,
    Subject,
    Guardian,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::ClassGroup => "class-group",
            Self::Subject => "subject",
            Self::Guardian => "guardian",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::ClassGroup => "class",
            Self::Subject => "subject",
            Self::Guardian => "guardian",
        }
    }

    pub fn delete_confirmation_message(self, name: &str) -> String {
        format!(
            "Are you sure you want to delete the {} \"{}\"? This action cannot be undone.",
            self.label(),
            name
        )
    }

    pub fn deleted_message(self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("{} deleted successfully.", capitalized)
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

impl ListRow for Student {
    const KIND: ResourceKind = ResourceKind::Student;

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.registration.clone(),
            self.status.as_str().to_string(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["name", "registration", "status", "classGroupId"]
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "registration" => Some(self.registration.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "classGroupId" => self.class_group_id.clone(),
            _ => None,
        }
    }
}

impl ListRow for Teacher {
    const KIND: ResourceKind = ResourceKind::Teacher;

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            short_id(&self.id),
            self.status.as_str().to_string(),
        ]
    }

    fn columns() -> &'static [&'static str] {
        &["shortId", "name", "email", "status"]
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "shortId" => Some(short_id(&self.id)),
            "name" => Some(self.name.clone()),
            "email" => Some(self.email.clone()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }
}

impl ListRow for ClassGroup {
    const KIND: ResourceKind = ResourceKind::ClassGroup;

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.year.to_string(), self.shift.clone()]
    }

    fn columns() -> &'static [&'static str] {
        &["name", "year", "shift"]
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "year" => Some(self.year.to_string()),
            "shift" => Some(self.shift.clone()),
            _ => None,
        }
    }
}

impl ListRow for Subject {
    const KIND: ResourceKind = ResourceKind::Subject;

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.code.clone()]
    }

    fn columns() -> &'static [&'static str] {
        &["code", "name"]
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "code" => Some(self.code.clone()),
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }
}

impl ListRow for Guardian {
    const KIND: ResourceKind = ResourceKind::Guardian;

    fn row_id(&self) -> String {
        self.id.clone()
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.email.clone(), self.phone.clone()]
    }

    fn columns() -> &'static [&'static str] {
        &["name", "email", "phone"]
    }

    fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "email" => Some(self.email.clone()),
            "phone" => Some(self.phone.clone()),
            _ => None,
        }
    }
}

/// Renders the declared columns of a row, in order. Missing values render empty.
pub fn render_row<T: ListRow>(row: &T) -> Vec<String> {
    T::columns()
        .iter()
        .map(|column| row.column(column).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{render_row, ListRow, ResourceKind};
    use crate::models::{RecordStatus, Student, Teacher};

    #[test]
    fn teacher_search_includes_short_id() {
        let teacher = Teacher {
            id: "a1b2c3d4e5f6".to_string(),
            name: "Ana Souza".to_string(),
            email: "ana@school.test".to_string(),
            status: RecordStatus::Active,
        };
        assert!(teacher.search_fields().contains(&"a1b2c3d4".to_string()));
        assert_eq!(teacher.column("shortId").as_deref(), Some("a1b2c3d4"));
        assert_eq!(teacher.column("unknown"), None);
    }

    #[test]
    fn renders_missing_columns_as_empty() {
        let student = Student {
            id: "s1".to_string(),
            name: "Bruno".to_string(),
            registration: "2024001".to_string(),
            status: RecordStatus::Pending,
            class_group_id: None,
        };
        assert_eq!(render_row(&student), vec!["Bruno", "2024001", "pending", ""]);
    }

    #[test]
    fn deletion_messages_use_resource_label() {
        assert_eq!(ResourceKind::ClassGroup.deleted_message(), "Class deleted successfully.");
        assert!(ResourceKind::Guardian
            .delete_confirmation_message("Carla")
            .contains("guardian \"Carla\""));
    }
}
