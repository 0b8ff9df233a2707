use super::scope::FetchScope;
use crate::domain::media::{MediaItem, MediaUpload};
use crate::domain::page::Page;
use crate::domain::ports::MediaLibraryBox;
use crate::error::{Result, ShopError};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

/// Paginated browse-and-pick over the media library.
///
/// The selection belongs to the loaded page: moving to another page index
/// clears it, and [`MediaSelector::confirm`] only resolves ids present on the
/// current page.
pub struct MediaSelector {
    library: MediaLibraryBox,
    mode: SelectionMode,
    page: Page<MediaItem>,
    selected: Vec<u64>,
    pending_upload: Option<MediaUpload>,
}

impl MediaSelector {
    pub fn new(library: MediaLibraryBox, mode: SelectionMode) -> Self {
        Self {
            library,
            mode,
            page: Page::default(),
            selected: Vec::new(),
            pending_upload: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn page(&self) -> &Page<MediaItem> {
        &self.page
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.page.data
    }

    pub fn selected_ids(&self) -> &[u64] {
        &self.selected
    }

    #[instrument(skip(self, scope))]
    pub async fn load_page(&mut self, page: u32, scope: &FetchScope) -> Result<()> {
        let page = page.max(1);
        let loaded = scope.run(self.library.media_page(page)).await?;
        if page != self.page.current_page {
            self.selected.clear();
        }
        debug!(items = loaded.data.len(), "media page loaded");
        self.page = loaded;
        Ok(())
    }

    pub async fn next_page(&mut self, scope: &FetchScope) -> Result<bool> {
        if !self.page.has_next() {
            return Ok(false);
        }
        self.load_page(self.page.current_page + 1, scope).await?;
        Ok(true)
    }

    pub async fn prev_page(&mut self, scope: &FetchScope) -> Result<bool> {
        if !self.page.has_prev() {
            return Ok(false);
        }
        self.load_page(self.page.current_page - 1, scope).await?;
        Ok(true)
    }

    /// Flips membership of `id`. In single mode, selecting replaces the
    /// previous choice. Returns whether `id` is now selected.
    pub fn toggle(&mut self, id: u64) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return false;
        }
        if self.mode == SelectionMode::Single {
            self.selected.clear();
        }
        self.selected.push(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Hands the selected items of the current page to `on_confirm`.
    pub fn confirm<F>(&self, on_confirm: F) -> Result<usize>
    where
        F: FnOnce(Vec<MediaItem>),
    {
        let items: Vec<MediaItem> = self
            .selected
            .iter()
            .filter_map(|id| self.page.data.iter().find(|m| m.id == *id).cloned())
            .collect();
        if items.is_empty() {
            return Err(ShopError::validation("Select at least one media item."));
        }
        let count = items.len();
        on_confirm(items);
        Ok(count)
    }

    pub fn set_upload(&mut self, upload: MediaUpload) {
        self.pending_upload = Some(upload);
    }

    pub fn pending_upload(&self) -> Option<&MediaUpload> {
        self.pending_upload.as_ref()
    }

    /// Uploads the pending file; on success forgets it and reloads page 1.
    #[instrument(skip(self, scope))]
    pub async fn upload(&mut self, scope: &FetchScope) -> Result<MediaItem> {
        let upload = self
            .pending_upload
            .clone()
            .ok_or_else(|| ShopError::validation("Choose a file to upload."))?;
        let item = scope.run(self.library.upload(upload)).await?;
        info!(id = item.id, "media uploaded");
        self.pending_upload = None;
        self.load_page(1, scope).await?;
        Ok(item)
    }
}
