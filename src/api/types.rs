use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A source file served for practice. `content` is HTML-entity encoded.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CodeFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub number_of_lines: Option<usize>,
    #[serde(default)]
    pub number_of_chars: Option<usize>,
}

impl CodeFile {
    /// Language hint taken from the file extension.
    pub fn language(&self) -> &str {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("js")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub programming_language: Option<String>,
    #[serde(default)]
    pub code_ids: Vec<String>,
    #[serde(default)]
    pub files_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Project {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn position_of(&self, code_id: &str) -> Option<usize> {
        self.code_ids.iter().position(|id| id == code_id)
    }

    /// The adjacent code in the project, or `None` at either end.
    pub fn neighbor(&self, code_id: &str, direction: Direction) -> Option<&str> {
        let idx = self.position_of(code_id)?;
        let target = match direction {
            Direction::Previous => idx.checked_sub(1)?,
            Direction::Next => idx + 1,
        };
        self.code_ids.get(target).map(String::as_str)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// A local file, practised without entity decoding.
pub fn load_local_file(path: &Path) -> io::Result<CodeFile> {
    let content = fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let number_of_lines = content.lines().count();
    let number_of_chars = content.chars().count();
    Ok(CodeFile {
        id: path.display().to_string(),
        content,
        file_name,
        description: path.display().to_string(),
        project_id: None,
        order: None,
        number_of_lines: Some(number_of_lines),
        number_of_chars: Some(number_of_chars),
    })
}
