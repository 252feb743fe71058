use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::annotation::{Annotation, FeedbackBlob};
use crate::text::DocumentId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed annotation file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Document id {0:?} cannot be used as a file name")]
    InvalidDocumentId(DocumentId),
}

/// Where annotation lists live between sessions.
pub trait AnnotationStore {
    /// The stored list for `doc`; empty if nothing was ever saved.
    fn load(&self, doc: &DocumentId) -> Result<Vec<Annotation>, StoreError>;

    /// Replaces the stored list for `doc`.
    fn save(&mut self, doc: &DocumentId, annotations: &[Annotation]) -> Result<(), StoreError>;
}

/// One `<doc-id>.json` file per document holding `{"annotations": [...]}`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, doc: &DocumentId) -> Result<PathBuf, StoreError> {
        let id = doc.as_str();
        let bad = id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\'])
            || id.contains('\0');
        if bad {
            return Err(StoreError::InvalidDocumentId(doc.clone()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

impl AnnotationStore for JsonFileStore {
    fn load(&self, doc: &DocumentId) -> Result<Vec<Annotation>, StoreError> {
        let path = self.path_for(doc)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let blob: FeedbackBlob =
            serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
        debug!("loaded {} annotation(s) from {}", blob.annotations.len(), path.display());
        Ok(blob.annotations)
    }

    fn save(&mut self, doc: &DocumentId, annotations: &[Annotation]) -> Result<(), StoreError> {
        let path = self.path_for(doc)?;
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;

        let blob = FeedbackBlob {
            annotations: annotations.to_vec(),
        };
        let json = serde_json::to_string_pretty(&blob).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        // Whole-blob replace: write beside the target, then rename over it.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        debug!("saved {} annotation(s) to {}", annotations.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;
    use crate::text::Span;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Vec<Annotation> {
        vec![
            Annotation::new("a", Span::new(0, 3), AnnotationKind::Highlight).with_color("#ffeb3b"),
            Annotation::new("b", Span::new(4, 9), AnnotationKind::Comment)
                .with_comment("word choice")
                .with_snippet("quick"),
        ]
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.load(&"essay-1".into()).unwrap(), vec![]);
    }

    #[test]
    fn save_then_load() {
        // Given a store in an empty directory
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("nested"));

        // When a list is saved
        store.save(&"essay-1".into(), &sample()).unwrap();

        // Then it loads back unchanged and no temp file is left behind
        assert_eq!(store.load(&"essay-1".into()).unwrap(), sample());
        let names: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["essay-1.json"]);
    }

    #[test]
    fn save_replaces_whole_list() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        store.save(&"p".into(), &sample()).unwrap();
        store.save(&"p".into(), &sample()[..1]).unwrap();
        assert_eq!(store.load(&"p".into()).unwrap().len(), 1);
    }

    #[test]
    fn file_uses_feedback_wire_shape() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        store.save(&"p".into(), &sample()[..1]).unwrap();

        let raw = fs::read_to_string(dir.path().join("p.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "annotations": [
                    { "id": "a", "type": "highlight", "start": 0, "end": 3, "color": "#ffeb3b" }
                ]
            })
        );
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("p.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.load(&"p".into()),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let store = JsonFileStore::new("/tmp/unused");
        for id in ["", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.path_for(&id.into()),
                Err(StoreError::InvalidDocumentId(_))
            ));
        }
    }
}
