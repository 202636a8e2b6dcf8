use crate::errors::{AppError, AppResult};
use crate::models::{
    AttachedFile, Chapter, Lesson, LessonContent, LessonKind, DEFAULT_VIDEO_DURATION_MINUTES,
};
use crate::notify::Notifier;
use std::collections::BTreeMap;
use thiserror::Error;

/// Items kept dense and 1-based: `order == index + 1`.
pub trait Ordered {
    fn order(&self) -> usize;
    fn set_order(&mut self, order: usize);
}

impl Ordered for Lesson {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

impl Ordered for Chapter {
    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}

pub fn renumber<T: Ordered>(collection: &mut [T]) {
    for (index, item) in collection.iter_mut().enumerate() {
        item.set_order(index + 1);
    }
}

/// Side map keyed by `(group_index, item_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxMap<A> {
    entries: BTreeMap<(usize, usize), A>,
}

impl<A> Default for AuxMap<A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<A> AuxMap<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: usize, index: usize) -> Option<&A> {
        self.entries.get(&(group, index))
    }

    pub fn insert(&mut self, group: usize, index: usize, value: A) -> Option<A> {
        self.entries.insert((group, index), value)
    }

    pub fn remove(&mut self, group: usize, index: usize) -> Option<A> {
        self.entries.remove(&(group, index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &A)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    /// Rebuilds the map, moving each key through `remap`; `None` drops the entry.
    fn rekey<F>(self, mut remap: F) -> Self
    where
        F: FnMut(usize, usize) -> Option<(usize, usize)>,
    {
        let entries = self
            .entries
            .into_iter()
            .filter_map(|((group, index), value)| remap(group, index).map(|key| (key, value)))
            .collect();
        Self { entries }
    }
}

fn check_index(len: usize, index: usize) -> AppResult<()> {
    if index >= len {
        return Err(AppError::InvalidInput(format!(
            "index {} out of range for collection of {}",
            index, len
        )));
    }
    Ok(())
}

/// Removes item `index` of group `group` and shifts later aux entries of
/// that group down by one. Other groups are left untouched.
pub fn remove_item<T: Ordered, A>(
    mut collection: Vec<T>,
    aux: AuxMap<A>,
    group: usize,
    index: usize,
) -> AppResult<(Vec<T>, AuxMap<A>)> {
    check_index(collection.len(), index)?;
    collection.remove(index);
    renumber(&mut collection);

    let aux = aux.rekey(|g, j| {
        if g != group || j < index {
            Some((g, j))
        } else if j == index {
            None
        } else {
            Some((g, j - 1))
        }
    });
    Ok((collection, aux))
}

pub fn add_item<T: Ordered>(mut collection: Vec<T>, mut item: T) -> Vec<T> {
    item.set_order(collection.len() + 1);
    collection.push(item);
    collection
}

/// Moves item `from` to position `to` within a group, carrying its aux entry.
pub fn move_item<T: Ordered, A>(
    mut collection: Vec<T>,
    aux: AuxMap<A>,
    group: usize,
    from: usize,
    to: usize,
) -> AppResult<(Vec<T>, AuxMap<A>)> {
    check_index(collection.len(), from)?;
    check_index(collection.len(), to)?;
    if from == to {
        return Ok((collection, aux));
    }

    let item = collection.remove(from);
    collection.insert(to, item);
    renumber(&mut collection);

    let aux = aux.rekey(|g, j| {
        if g != group {
            return Some((g, j));
        }
        let moved = if j == from {
            to
        } else if from < to && j > from && j <= to {
            j - 1
        } else if to < from && j >= to && j < from {
            j + 1
        } else {
            j
        };
        Some((g, moved))
    });
    Ok((collection, aux))
}

/// Removes a whole group: its aux entries are dropped and later groups shift down.
pub fn remove_group<T: Ordered, A>(
    mut groups: Vec<T>,
    aux: AuxMap<A>,
    group: usize,
) -> AppResult<(Vec<T>, AuxMap<A>)> {
    check_index(groups.len(), group)?;
    groups.remove(group);
    renumber(&mut groups);

    let aux = aux.rekey(|g, j| match g.cmp(&group) {
        std::cmp::Ordering::Less => Some((g, j)),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some((g - 1, j)),
    });
    Ok((groups, aux))
}

/// Switches a lesson's kind, resetting kind-specific fields.
pub fn change_kind(mut lesson: Lesson, kind: LessonKind) -> Lesson {
    if lesson.content.kind() == kind {
        return lesson;
    }
    lesson.content = match kind {
        LessonKind::Text => LessonContent::Text {
            body: String::new(),
        },
        LessonKind::Video => LessonContent::Video {
            duration_minutes: DEFAULT_VIDEO_DURATION_MINUTES,
            remote_url: None,
        },
    };
    lesson
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Add at least one chapter before saving.")]
    NoChapters,
    #[error("Chapter {chapter} needs a title.")]
    MissingChapterTitle { chapter: usize },
    #[error("Chapter {chapter} needs at least one lesson.")]
    EmptyChapter { chapter: usize },
    #[error("Lesson {lesson} of chapter {chapter} needs a title.")]
    MissingLessonTitle { chapter: usize, lesson: usize },
    #[error("Lesson {lesson} of chapter {chapter} needs text content.")]
    MissingTextBody { chapter: usize, lesson: usize },
    #[error("Lesson {lesson} of chapter {chapter} needs a video file.")]
    MissingVideo { chapter: usize, lesson: usize },
}

impl From<ValidationIssue> for AppError {
    fn from(value: ValidationIssue) -> Self {
        Self::Validation(value.to_string())
    }
}

/// Caller-side checks before persisting. Positions in messages are 1-based.
pub fn validate_chapters<A>(chapters: &[Chapter], aux: &AuxMap<A>) -> Result<(), ValidationIssue> {
    if chapters.is_empty() {
        return Err(ValidationIssue::NoChapters);
    }
    for (g, chapter) in chapters.iter().enumerate() {
        let chapter_no = g + 1;
        if chapter.title.trim().is_empty() {
            return Err(ValidationIssue::MissingChapterTitle { chapter: chapter_no });
        }
        if chapter.lessons.is_empty() {
            return Err(ValidationIssue::EmptyChapter { chapter: chapter_no });
        }
        for (k, lesson) in chapter.lessons.iter().enumerate() {
            let lesson_no = k + 1;
            if lesson.title.trim().is_empty() {
                return Err(ValidationIssue::MissingLessonTitle {
                    chapter: chapter_no,
                    lesson: lesson_no,
                });
            }
            match &lesson.content {
                LessonContent::Text { body } if body.trim().is_empty() => {
                    return Err(ValidationIssue::MissingTextBody {
                        chapter: chapter_no,
                        lesson: lesson_no,
                    });
                }
                LessonContent::Video { remote_url, .. } => {
                    let has_remote = remote_url
                        .as_deref()
                        .map(str::trim)
                        .is_some_and(|url| !url.is_empty());
                    if aux.get(g, k).is_none() && !has_remote {
                        return Err(ValidationIssue::MissingVideo {
                            chapter: chapter_no,
                            lesson: lesson_no,
                        });
                    }
                }
                LessonContent::Text { .. } => {}
            }
        }
    }
    Ok(())
}

/// Chapter/lesson editor state. Chapters and attachments are always replaced
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    chapters: Vec<Chapter>,
    attachments: AuxMap<AttachedFile>,
}

impl CourseDraft {
    pub fn new(mut chapters: Vec<Chapter>) -> Self {
        renumber(&mut chapters);
        for chapter in &mut chapters {
            renumber(&mut chapter.lessons);
        }
        Self {
            chapters,
            attachments: AuxMap::new(),
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn attachments(&self) -> &AuxMap<AttachedFile> {
        &self.attachments
    }

    pub fn add_chapter(&mut self, chapter: Chapter) {
        let chapters = std::mem::take(&mut self.chapters);
        self.chapters = add_item(chapters, chapter);
    }

    pub fn remove_chapter(&mut self, group: usize) -> AppResult<()> {
        let (chapters, attachments) = remove_group(
            self.chapters.clone(),
            self.attachments.clone(),
            group,
        )?;
        self.chapters = chapters;
        self.attachments = attachments;
        Ok(())
    }

    pub fn add_lesson(&mut self, group: usize, lesson: Lesson) -> AppResult<()> {
        let chapter = self.chapter_mut(group)?;
        let lessons = std::mem::take(&mut chapter.lessons);
        chapter.lessons = add_item(lessons, lesson);
        Ok(())
    }

    pub fn remove_lesson(&mut self, group: usize, index: usize) -> AppResult<()> {
        let lessons = self.chapter(group)?.lessons.clone();
        let (lessons, attachments) = remove_item(lessons, self.attachments.clone(), group, index)?;
        self.chapter_mut(group)?.lessons = lessons;
        self.attachments = attachments;
        Ok(())
    }

    pub fn move_lesson(&mut self, group: usize, from: usize, to: usize) -> AppResult<()> {
        let lessons = self.chapter(group)?.lessons.clone();
        let (lessons, attachments) = move_item(lessons, self.attachments.clone(), group, from, to)?;
        self.chapter_mut(group)?.lessons = lessons;
        self.attachments = attachments;
        Ok(())
    }

    /// Switching to text drops any pending upload for the lesson.
    pub fn change_lesson_kind(&mut self, group: usize, index: usize, kind: LessonKind) -> AppResult<()> {
        let lesson = self.lesson(group, index)?.clone();
        let lesson = change_kind(lesson, kind);
        if kind == LessonKind::Text {
            self.attachments.remove(group, index);
        }
        self.chapter_mut(group)?.lessons[index] = lesson;
        Ok(())
    }

    pub fn attach_file(&mut self, group: usize, index: usize, file: AttachedFile) -> AppResult<()> {
        if self.lesson(group, index)?.content.kind() != LessonKind::Video {
            return Err(AppError::InvalidInput(
                "files can only be attached to video lessons".to_string(),
            ));
        }
        self.attachments.insert(group, index, file);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationIssue> {
        validate_chapters(&self.chapters, &self.attachments)
    }

    /// Runs validation and raises a warning notice on the first issue.
    pub fn validate_or_warn(&self, notifier: &dyn Notifier) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(issue) => {
                tracing::info!(issue = %issue, "course draft rejected before save");
                notifier.warning(&issue.to_string());
                false
            }
        }
    }

    fn chapter(&self, group: usize) -> AppResult<&Chapter> {
        self.chapters
            .get(group)
            .ok_or_else(|| AppError::NotFound(format!("chapter {}", group)))
    }

    fn chapter_mut(&mut self, group: usize) -> AppResult<&mut Chapter> {
        self.chapters
            .get_mut(group)
            .ok_or_else(|| AppError::NotFound(format!("chapter {}", group)))
    }

    fn lesson(&self, group: usize, index: usize) -> AppResult<&Lesson> {
        self.chapter(group)?
            .lessons
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("lesson {} of chapter {}", index, group)))
    }
}
