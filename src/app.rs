use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::{import_files, import_pixels, paths_from_paste, AssetStore, StorageUsage, CLIPBOARD_IMAGE_NAME};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::db::{Database, ImageRecord, LibraryStats, StoreError, Tag};
use crate::ui;
use crate::ui::import_dialog::ImportDialog;
use crate::ui::input::TextInput;
use crate::ui::preview::ImagePreviewState;
use crate::ui::rename_dialog::RenameDialog;
use crate::ui::tag_dialog::{TagDialog, TagDialogMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Searching,
    Importing,
    Tagging,
    Renaming,
    ConfirmDelete,
    Help,
}

/// A library image together with its tags, as shown in the list.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub record: ImageRecord,
    pub tags: Vec<Tag>,
}

pub struct App {
    pub db: Database,
    pub assets: AssetStore,
    /// Result of the last query, newest first
    pub images: Vec<ImageEntry>,
    pub selected_index: usize,
    /// Live search text; empty lists the whole library
    pub query: TextInput,
    pub stats: LibraryStats,
    /// Files and bytes under the storage root, rescanned when the image count changes
    pub storage: StorageUsage,
    pub mode: AppMode,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub import_dialog: Option<ImportDialog>,
    pub tag_dialog: Option<TagDialog>,
    pub rename_dialog: Option<RenameDialog>,
    pub preview: ImagePreviewState,
    pub clipboard: Box<dyn Clipboard>,
}

impl App {
    pub fn new(db: Database, assets: AssetStore) -> Result<Self> {
        let mut app = Self {
            db,
            assets,
            images: Vec::new(),
            selected_index: 0,
            query: TextInput::new(),
            stats: LibraryStats::default(),
            storage: StorageUsage::default(),
            mode: AppMode::Normal,
            should_quit: false,
            status_message: None,
            import_dialog: None,
            tag_dialog: None,
            rename_dialog: None,
            preview: ImagePreviewState::default(),
            clipboard: Box::new(SystemClipboard::default()),
        };

        app.sweep_thumbnails()?;
        app.storage = app.assets.storage_usage();
        app.refresh()?;
        Ok(app)
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Remove cached thumbnails whose image is no longer in the library.
    fn sweep_thumbnails(&self) -> Result<usize> {
        let records = self.db.list_images()?;
        let removed = self
            .assets
            .thumbnails()
            .cleanup_orphans(records.iter().map(|r| Path::new(r.path.as_str())));
        Ok(removed)
    }

    /// Re-run the current query and rebuild the list, keeping the selected
    /// image selected when it is still present.
    pub fn refresh(&mut self) -> Result<()> {
        let selected_id = self.selected_image().map(|e| e.record.id);
        let query = self.query.value().trim().to_string();

        let records = if query.is_empty() {
            self.db.list_images()?
        } else {
            self.db.search(&query)?
        };

        self.images = records
            .into_iter()
            .map(|record| -> Result<ImageEntry, StoreError> {
                let tags = self.db.tags_for_image(record.id)?;
                Ok(ImageEntry { record, tags })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.selected_index = selected_id
            .and_then(|id| self.images.iter().position(|e| e.record.id == id))
            .unwrap_or_else(|| self.selected_index.min(self.images.len().saturating_sub(1)));
        let stats = self.db.stats()?;
        if stats.image_count != self.stats.image_count {
            self.storage = self.assets.storage_usage();
        }
        self.stats = stats;
        Ok(())
    }

    fn select_image_id(&mut self, id: i64) {
        if let Some(index) = self.images.iter().position(|e| e.record.id == id) {
            self.selected_index = index;
        }
    }

    pub fn selected_image(&self) -> Option<&ImageEntry> {
        self.images.get(self.selected_index)
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key)?,
                    Event::Paste(text) => self.handle_paste(&text)?,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.mode {
            AppMode::Normal => self.handle_normal_key(key),
            AppMode::Searching => self.handle_search_key(key),
            AppMode::Importing => self.handle_import_dialog_key(key),
            AppMode::Tagging => self.handle_tag_dialog_key(key),
            AppMode::Renaming => self.handle_rename_dialog_key(key),
            AppMode::ConfirmDelete => self.handle_confirm_delete_key(key),
            AppMode::Help => {
                self.mode = AppMode::Normal;
                Ok(())
            }
        }
    }

    /// Text pasted into the terminal. Outside of text fields it is treated
    /// as a list of files to import (clipboard paste or drag and drop).
    pub fn handle_paste(&mut self, text: &str) -> Result<()> {
        match self.mode {
            AppMode::Searching => {
                self.query.insert_str(text);
                self.refresh()?;
            }
            AppMode::Importing => {
                if let Some(dialog) = self.import_dialog.as_mut() {
                    dialog.input.insert_str(text);
                    dialog.error = None;
                }
            }
            AppMode::Renaming => {
                if let Some(dialog) = self.rename_dialog.as_mut() {
                    dialog.input.insert_str(text);
                }
            }
            AppMode::Tagging => {
                if let Some(dialog) = self.tag_dialog.as_mut() {
                    if dialog.mode == TagDialogMode::AddTag {
                        dialog.input.insert_str(text);
                        dialog.update_suggestions();
                    }
                }
            }
            AppMode::Normal => {
                let paths = paths_from_paste(text);
                if paths.is_empty() {
                    self.status_message = Some("Pasted text does not name any files".to_string());
                } else {
                    self.import(&paths)?;
                }
            }
            AppMode::ConfirmDelete | AppMode::Help => {}
        }
        Ok(())
    }

    fn import(&mut self, paths: &[PathBuf]) -> Result<()> {
        let report = import_files(&self.assets, &self.db, paths);
        let mut message = report.summary();
        if let Some((path, reason)) = report.failed.first() {
            let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            message = format!("{} ({}: {})", message, name, reason);
        }
        self.status_message = Some(message);

        self.refresh()?;
        if let Some(first) = report.imported.first() {
            self.select_image_id(first.id);
        }
        Ok(())
    }

    // --- Clipboard ---

    /// Import whatever the system clipboard holds: image pixels first,
    /// then text naming files.
    fn import_from_clipboard(&mut self) -> Result<()> {
        let pixels = match self.clipboard.image() {
            Ok(pixels) => pixels,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read clipboard image");
                self.status_message = Some(format!("Clipboard error: {}", e));
                return Ok(());
            }
        };

        if let Some(pixels) = pixels {
            match import_pixels(&self.assets, &self.db, &pixels, CLIPBOARD_IMAGE_NAME) {
                Ok(imported) => {
                    tracing::info!(id = imported.id, "imported clipboard image");
                    self.status_message = Some(format!("Imported {}", CLIPBOARD_IMAGE_NAME));
                    self.refresh()?;
                    self.select_image_id(imported.id);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to import clipboard image");
                    self.status_message = Some(format!("Clipboard import failed: {}", e));
                }
            }
            return Ok(());
        }

        let paths = match self.clipboard.text() {
            Ok(text) => text.map(|t| paths_from_paste(&t)).unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read clipboard text");
                Vec::new()
            }
        };
        if paths.is_empty() {
            self.status_message = Some("No image on clipboard".to_string());
            return Ok(());
        }
        self.import(&paths)
    }

    /// Put the selected image's stored path on the system clipboard.
    fn copy_selected_path(&mut self) {
        let Some(entry) = self.selected_image() else {
            return;
        };
        let path = entry.record.path.clone();

        let message = match self.clipboard.set_text(&path) {
            Ok(()) => format!("Copied path: {}", path),
            Err(e) => {
                tracing::warn!(error = %e, "failed to write clipboard");
                format!("Clipboard error: {}", e)
            }
        };
        self.status_message = Some(message);
    }

    // --- Navigation ---

    fn move_down(&mut self) {
        if self.selected_index + 1 < self.images.len() {
            self.selected_index += 1;
        }
    }

    fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn go_to_top(&mut self) {
        self.selected_index = 0;
    }

    fn go_to_bottom(&mut self) {
        self.selected_index = self.images.len().saturating_sub(1);
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        self.status_message = None;

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Char('g') | KeyCode::Home => self.go_to_top(),
            KeyCode::Char('G') | KeyCode::End => self.go_to_bottom(),
            KeyCode::Char('?') => self.mode = AppMode::Help,
            KeyCode::Char('/') => self.mode = AppMode::Searching,
            KeyCode::Esc => {
                if !self.query.is_empty() {
                    self.query.clear();
                    self.refresh()?;
                }
            }
            KeyCode::Char('i') => {
                self.import_dialog = Some(ImportDialog::new());
                self.mode = AppMode::Importing;
            }
            KeyCode::Char('p') => self.import_from_clipboard()?,
            KeyCode::Char('y') => self.copy_selected_path(),
            KeyCode::Char('t') => self.open_tag_dialog()?,
            KeyCode::Char('r') => {
                if let Some(entry) = self.selected_image() {
                    self.rename_dialog = Some(RenameDialog::new(entry.record.id, &entry.record.original_name));
                    self.mode = AppMode::Renaming;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.selected_image().is_some() {
                    self.mode = AppMode::ConfirmDelete;
                }
            }
            _ => {}
        }

        Ok(())
    }

    // --- Search ---

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.query.clear();
                self.mode = AppMode::Normal;
                self.refresh()?;
            }
            KeyCode::Enter => self.mode = AppMode::Normal,
            KeyCode::Down => self.move_down(),
            KeyCode::Up => self.move_up(),
            KeyCode::Left => self.query.move_left(),
            KeyCode::Right => self.query.move_right(),
            KeyCode::Home => self.query.move_home(),
            KeyCode::End => self.query.move_end(),
            KeyCode::Backspace => {
                self.query.backspace();
                self.refresh()?;
            }
            KeyCode::Delete => {
                self.query.delete();
                self.refresh()?;
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.query.insert(c);
                self.refresh()?;
            }
            _ => {}
        }
        Ok(())
    }

    // --- Import ---

    fn handle_import_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let dialog = match self.import_dialog.as_mut() {
            Some(d) => d,
            None => {
                self.mode = AppMode::Normal;
                return Ok(());
            }
        };

        match key.code {
            KeyCode::Esc => {
                self.import_dialog = None;
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => {
                if dialog.input.value().trim().is_empty() {
                    return Ok(());
                }
                let paths = dialog.paths();
                if paths.is_empty() {
                    dialog.error = Some("No such file or directory".to_string());
                    return Ok(());
                }
                self.import_dialog = None;
                self.mode = AppMode::Normal;
                self.import(&paths)?;
            }
            KeyCode::Backspace => dialog.input.backspace(),
            KeyCode::Delete => dialog.input.delete(),
            KeyCode::Left => dialog.input.move_left(),
            KeyCode::Right => dialog.input.move_right(),
            KeyCode::Home => dialog.input.move_home(),
            KeyCode::End => dialog.input.move_end(),
            KeyCode::Char(c) if !c.is_control() => {
                dialog.input.insert(c);
                dialog.error = None;
            }
            _ => {}
        }
        Ok(())
    }

    // --- Tags ---

    fn open_tag_dialog(&mut self) -> Result<()> {
        let Some(entry) = self.selected_image() else {
            return Ok(());
        };
        let (id, name) = (entry.record.id, entry.record.original_name.clone());

        let current = self.db.tags_for_image(id)?;
        let all = self.db.list_tags()?;
        self.tag_dialog = Some(TagDialog::new(id, name, current, all));
        self.mode = AppMode::Tagging;
        Ok(())
    }

    /// Reload the dialog's tag lists and the library list after a change.
    fn reload_tags(&mut self, image_id: i64) -> Result<()> {
        let current = self.db.tags_for_image(image_id)?;
        let all = self.db.list_tags()?;
        if let Some(dialog) = self.tag_dialog.as_mut() {
            dialog.set_tags(current, all);
        }
        self.refresh()
    }

    fn handle_tag_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let dialog = match self.tag_dialog.as_mut() {
            Some(d) => d,
            None => {
                self.mode = AppMode::Normal;
                return Ok(());
            }
        };
        let image_id = dialog.image_id;

        match dialog.mode {
            TagDialogMode::ViewTags => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.tag_dialog = None;
                    self.mode = AppMode::Normal;
                }
                KeyCode::Char('j') | KeyCode::Down => dialog.move_down(),
                KeyCode::Char('k') | KeyCode::Up => dialog.move_up(),
                KeyCode::Char('a') => dialog.enter_add_mode(),
                KeyCode::Char('d') | KeyCode::Delete => {
                    if let Some(tag) = dialog.selected_current_tag().cloned() {
                        self.db.unlink_tag(image_id, tag.id)?;
                        tracing::info!(image_id, tag = %tag.name, "removed tag");
                        self.reload_tags(image_id)?;
                        self.status_message = Some(format!("Removed tag: {}", tag.name));
                    }
                }
                _ => {}
            },
            TagDialogMode::AddTag => match key.code {
                KeyCode::Esc => dialog.enter_view_mode(),
                KeyCode::Down => dialog.move_down(),
                KeyCode::Up => dialog.move_up(),
                KeyCode::Tab => dialog.complete(),
                KeyCode::Backspace => dialog.backspace(),
                KeyCode::Enter => {
                    let Some(name) = dialog.tag_to_add() else {
                        return Ok(());
                    };
                    let message = match self.db.tag_image(image_id, &name) {
                        Ok(true) => {
                            tracing::info!(image_id, tag = %name, "added tag");
                            format!("Added tag: {}", name)
                        }
                        Ok(false) => format!("Already tagged: {}", name),
                        Err(StoreError::EmptyTagName) => "Tag name cannot be empty".to_string(),
                        Err(e) => return Err(e.into()),
                    };
                    self.reload_tags(image_id)?;
                    if let Some(d) = self.tag_dialog.as_mut() {
                        d.enter_view_mode();
                    }
                    self.status_message = Some(message);
                }
                KeyCode::Char(c) if !c.is_control() => dialog.handle_char(c),
                _ => {}
            },
        }

        Ok(())
    }

    // --- Rename ---

    fn handle_rename_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let dialog = match self.rename_dialog.as_mut() {
            Some(d) => d,
            None => {
                self.mode = AppMode::Normal;
                return Ok(());
            }
        };

        match key.code {
            KeyCode::Esc => {
                self.rename_dialog = None;
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => {
                let image_id = dialog.image_id;
                let new_name = match dialog.new_name() {
                    Ok(name) => name,
                    Err(message) => {
                        dialog.error = Some(message);
                        return Ok(());
                    }
                };

                self.rename_dialog = None;
                self.mode = AppMode::Normal;

                let Some(new_name) = new_name else {
                    self.status_message = Some("Name unchanged".to_string());
                    return Ok(());
                };
                if self.db.update_image(image_id, None, Some(&new_name))? {
                    tracing::info!(image_id, name = %new_name, "renamed image");
                    self.status_message = Some(format!("Renamed to {}", new_name));
                } else {
                    self.status_message = Some("Image no longer exists".to_string());
                }
                self.refresh()?;
            }
            KeyCode::Backspace => dialog.input.backspace(),
            KeyCode::Delete => dialog.input.delete(),
            KeyCode::Left => dialog.input.move_left(),
            KeyCode::Right => dialog.input.move_right(),
            KeyCode::Home => dialog.input.move_home(),
            KeyCode::End => dialog.input.move_end(),
            KeyCode::Char(c) if !c.is_control() => {
                dialog.input.insert(c);
                dialog.error = None;
            }
            _ => {}
        }
        Ok(())
    }

    // --- Delete ---

    fn handle_confirm_delete_key(&mut self, key: KeyEvent) -> Result<()> {
        self.mode = AppMode::Normal;
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.delete_selected(),
            _ => Ok(()),
        }
    }

    fn delete_selected(&mut self) -> Result<()> {
        let Some(entry) = self.selected_image() else {
            return Ok(());
        };
        let (id, name, path) = (
            entry.record.id,
            entry.record.original_name.clone(),
            PathBuf::from(&entry.record.path),
        );

        self.db.delete_image(id)?;
        if let Err(e) = self.assets.delete_image_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete image file");
        }
        tracing::info!(id, path = %path.display(), "deleted image");

        self.status_message = Some(format!("Deleted {}", name));
        self.refresh()
    }
}
