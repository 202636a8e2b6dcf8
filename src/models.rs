use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;
pub const DEFAULT_LOADING_FLOOR_MS: u64 = 1500;
pub const DEFAULT_VIDEO_DURATION_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPageState")]
pub struct PageState {
    current_page: usize,
    items_per_page: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPageState {
    current_page: usize,
    items_per_page: usize,
}

impl TryFrom<RawPageState> for PageState {
    type Error = AppError;

    fn try_from(value: RawPageState) -> Result<Self, Self::Error> {
        Ok(Self::new(value.items_per_page)?.with_current_page(value.current_page))
    }
}

impl PageState {
    pub fn new(items_per_page: usize) -> AppResult<Self> {
        if items_per_page == 0 {
            return Err(AppError::InvalidInput(
                "itemsPerPage must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            current_page: 1,
            items_per_page,
        })
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// Pages are 1-based; zero is stored as the first page.
    pub fn with_current_page(mut self, page: usize) -> Self {
        self.set_current_page(page);
        self
    }

    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn total_pages(&self, record_count: usize) -> usize {
        record_count.div_ceil(self.items_per_page)
    }

    /// The page actually rendered: `current_page` clamped into `1..=total_pages`.
    pub fn effective_page(&self, record_count: usize) -> usize {
        let total_pages = self.total_pages(record_count);
        if total_pages == 0 {
            1
        } else {
            self.current_page.clamp(1, total_pages)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPage<'a, T> {
    pub slice: Vec<&'a T>,
    pub effective_page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

impl<T> DerivedPage<'_, T> {
    pub fn shows_pagination(&self) -> bool {
        self.total_pages > 0
    }

    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(i64),
    Text(String),
}

impl FilterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_query_value(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Number(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Named server-side constraints. A `Null` value means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<FilterValue>) -> Self {
        self.entries.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.get(name)
    }

    pub fn active(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.active()
            .filter_map(|(name, value)| value.as_query_value().map(|value| (name.to_string(), value)))
            .collect()
    }
}

/// Uniform success/error envelope returned by every API collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationPolicy {
    /// A new request cancels the pending one.
    #[default]
    Replace,
    /// A new request is refused while one is pending.
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleSettings {
    pub items_per_page: usize,
    pub loading_floor_ms: u64,
    pub confirmation_policy: ConfirmationPolicy,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            loading_floor_ms: DEFAULT_LOADING_FLOOR_MS,
            confirmation_policy: ConfirmationPolicy::Replace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Active,
    Inactive,
    Pending,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub registration: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub class_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub shift: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonKind {
    Text,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LessonContent {
    Text {
        body: String,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        duration_minutes: u32,
        #[serde(default)]
        remote_url: Option<String>,
    },
}

impl LessonContent {
    pub fn kind(&self) -> LessonKind {
        match self {
            Self::Text { .. } => LessonKind::Text,
            Self::Video { .. } => LessonKind::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "ordem")]
    pub order: usize,
    pub content: LessonContent,
}

impl Lesson {
    pub fn text(title: &str, body: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            order: 0,
            content: LessonContent::Text {
                body: body.to_string(),
            },
        }
    }

    pub fn video(title: &str, duration_minutes: u32) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            order: 0,
            content: LessonContent::Video {
                duration_minutes,
                remote_url: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "ordem")]
    pub order: usize,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Chapter {
    pub fn new(title: &str) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            order: 0,
            lessons: Vec::new(),
        }
    }
}

/// An in-memory upload waiting to be sent with its lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    pub file_name: String,
    pub size_bytes: u64,
    pub preview_url: String,
    pub attached_at: DateTime<Utc>,
}

impl AttachedFile {
    pub fn new(file_name: &str, size_bytes: u64, preview_url: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            size_bytes,
            preview_url: preview_url.to_string(),
            attached_at: Utc::now(),
        }
    }
}
