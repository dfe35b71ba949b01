//! Product image bookkeeping for the product form.
//!
//! A product's images come from two places: images already stored on the
//! media service under the product's file key, and files the user has just
//! picked. The form shows them as one preview strip (stored first), lets the
//! user remove any entry by its position in that strip, and on submit decides
//! which file key the product should carry and what needs uploading.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::MediaItem;

/// Upload key used when the product has no file key yet
pub const NEW_FILE_KEY: &str = "create";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "avif"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MediaError {
    #[error("No valid image files selected")]
    NoValidImages,
}

/// Image already stored on the media service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub name: String,
    /// Base64 image content as returned by the media service
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preview<'a> {
    Stored { index: usize, name: &'a str },
    Selected { index: usize, path: &'a Path },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removed {
    Stored(StoredImage),
    Selected(PathBuf),
}

/// Files to send to the media service before saving the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    pub key: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    /// File key to save on the product if no upload happens
    pub file_key: Option<String>,
    pub upload: Option<UploadBatch>,
}

impl SubmissionPlan {
    /// File key to save once the upload (if any) has finished.
    /// A key returned by the media service wins over the planned one.
    pub fn resolve_file_key(&self, uploaded_key: Option<String>) -> Option<String> {
        match (&self.upload, uploaded_key) {
            (Some(_), Some(key)) if !key.is_empty() => Some(key),
            _ => self.file_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaGallery {
    file_key: Option<String>,
    stored: Vec<StoredImage>,
    selected: Vec<PathBuf>,
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

impl MediaGallery {
    pub fn new(file_key: Option<String>) -> Self {
        Self {
            file_key: file_key.filter(|k| !k.is_empty()),
            ..Default::default()
        }
    }

    /// Gallery for a product being edited, seeded with its stored images.
    pub fn from_stored(file_key: Option<String>, items: Vec<MediaItem>) -> Self {
        let mut gallery = Self::new(file_key);
        gallery.stored = items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| StoredImage {
                name: item.name.unwrap_or_else(|| format!("image_{}.jpg", idx)),
                data: item.data,
            })
            .collect();
        gallery
    }

    pub fn file_key(&self) -> Option<&str> {
        self.file_key.as_deref()
    }

    pub fn stored(&self) -> &[StoredImage] {
        &self.stored
    }

    pub fn selected(&self) -> &[PathBuf] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.stored.len() + self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add newly picked files, skipping anything that is not an image.
    ///
    /// Returns how many were added. Fails only when nothing in the batch
    /// was an image, in which case the gallery is unchanged.
    pub fn select_files<I>(&mut self, paths: I) -> Result<usize, MediaError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let images: Vec<PathBuf> = paths.into_iter().filter(|p| is_image_path(p)).collect();
        if images.is_empty() {
            return Err(MediaError::NoValidImages);
        }
        let added = images.len();
        self.selected.extend(images);
        Ok(added)
    }

    /// Preview strip: stored images first, then selected files.
    pub fn previews(&self) -> Vec<Preview<'_>> {
        let stored = self.stored.iter().enumerate().map(|(index, image)| Preview::Stored {
            index,
            name: image.name.as_str(),
        });
        let offset = self.stored.len();
        let selected = self
            .selected
            .iter()
            .enumerate()
            .map(move |(i, path)| Preview::Selected {
                index: offset + i,
                path: path.as_path(),
            });
        stored.chain(selected).collect()
    }

    /// Remove the preview at `index` in the combined strip.
    pub fn remove_preview(&mut self, index: usize) -> Option<Removed> {
        let stored_count = self.stored.len();
        if index < stored_count {
            Some(Removed::Stored(self.stored.remove(index)))
        } else if index - stored_count < self.selected.len() {
            Some(Removed::Selected(self.selected.remove(index - stored_count)))
        } else {
            None
        }
    }

    /// Decide the product's file key and what to upload.
    ///
    /// With no images left the product loses its file key. New files are
    /// uploaded under the current key, or under [`NEW_FILE_KEY`] when the
    /// product has none yet.
    pub fn submission_plan(&self) -> SubmissionPlan {
        if self.is_empty() {
            return SubmissionPlan {
                file_key: None,
                upload: None,
            };
        }

        let upload = (!self.selected.is_empty()).then(|| UploadBatch {
            key: self
                .file_key
                .clone()
                .unwrap_or_else(|| NEW_FILE_KEY.to_string()),
            files: self.selected.clone(),
        });

        SubmissionPlan {
            file_key: self.file_key.clone(),
            upload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(names: &[Option<&str>]) -> Vec<MediaItem> {
        names
            .iter()
            .map(|n| MediaItem {
                name: n.map(str::to_string),
                data: "aGVsbG8=".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_stored_names_default_by_position() {
        let gallery = MediaGallery::from_stored(Some("k1".into()), stored(&[Some("front.png"), None]));
        let names: Vec<_> = gallery.stored().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["front.png", "image_1.jpg"]);
    }

    #[test]
    fn test_select_filters_non_images() {
        let mut gallery = MediaGallery::new(None);
        let added = gallery
            .select_files(vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("notes.txt"),
                PathBuf::from("b.webp"),
            ])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(gallery.len(), 2);

        assert_eq!(
            gallery.select_files(vec![PathBuf::from("readme")]),
            Err(MediaError::NoValidImages)
        );
        assert_eq!(gallery.len(), 2);
    }

    #[test]
    fn test_previews_and_global_removal() {
        let mut gallery =
            MediaGallery::from_stored(Some("k1".into()), stored(&[Some("s0.png"), Some("s1.png")]));
        gallery
            .select_files(vec![PathBuf::from("n0.png"), PathBuf::from("n1.png")])
            .unwrap();

        let previews = gallery.previews();
        assert_eq!(previews.len(), 4);
        assert_eq!(previews[1], Preview::Stored { index: 1, name: "s1.png" });
        assert_eq!(
            previews[2],
            Preview::Selected { index: 2, path: Path::new("n0.png") }
        );

        // Index 3 is the second selected file
        assert_eq!(gallery.remove_preview(3), Some(Removed::Selected(PathBuf::from("n1.png"))));
        // Index 0 is the first stored image
        assert!(matches!(gallery.remove_preview(0), Some(Removed::Stored(s)) if s.name == "s0.png"));
        // Now: [s1.png, n0.png]
        assert_eq!(gallery.remove_preview(1), Some(Removed::Selected(PathBuf::from("n0.png"))));
        assert_eq!(gallery.remove_preview(5), None);
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_plan_without_images_drops_file_key() {
        let mut gallery = MediaGallery::from_stored(Some("k1".into()), stored(&[Some("s0.png")]));
        gallery.remove_preview(0);
        let plan = gallery.submission_plan();
        assert_eq!(plan.file_key, None);
        assert_eq!(plan.upload, None);
        assert_eq!(plan.resolve_file_key(Some("ignored".into())), None);
    }

    #[test]
    fn test_plan_keeps_key_when_only_stored_images() {
        let gallery = MediaGallery::from_stored(Some("k1".into()), stored(&[Some("s0.png")]));
        let plan = gallery.submission_plan();
        assert_eq!(plan.file_key.as_deref(), Some("k1"));
        assert!(plan.upload.is_none());
    }

    #[test]
    fn test_plan_new_product_uploads_under_create_key() {
        let mut gallery = MediaGallery::new(None);
        gallery.select_files(vec![PathBuf::from("n0.png")]).unwrap();

        let plan = gallery.submission_plan();
        let upload = plan.upload.clone().unwrap();
        assert_eq!(upload.key, NEW_FILE_KEY);
        assert_eq!(upload.files, vec![PathBuf::from("n0.png")]);
        assert_eq!(plan.resolve_file_key(Some("fresh-key".into())).as_deref(), Some("fresh-key"));
        assert_eq!(plan.resolve_file_key(None), None);
    }

    #[test]
    fn test_plan_existing_product_uploads_under_its_key() {
        let mut gallery = MediaGallery::new(Some("k9".into()));
        gallery.select_files(vec![PathBuf::from("n0.png")]).unwrap();
        let plan = gallery.submission_plan();
        assert_eq!(plan.upload.unwrap().key, "k9");
    }
}
