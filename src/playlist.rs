// SPDX-License-Identifier: MPL-2.0
//! Playlist model: the ordered list of videos and the current-index cursor.
//!
//! The entry list is fixed at construction; only the cursor moves, and only
//! through [`Playlist::advance`]. Navigation is not cyclic — stepping past
//! either end is refused rather than wrapped.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A single playlist entry: the name shown in the UI and the file it plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    display_name: String,
    source_path: PathBuf,
}

impl VideoEntry {
    pub fn new(display_name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            source_path: source_path.into(),
        }
    }

    /// The name supplied on the command line for this video.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Path to the video file.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// File name component of the source path, for window titles.
    pub fn file_name(&self) -> &str {
        self.source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("Unknown")
    }
}

/// Builds the entry list from the raw command-line arguments.
///
/// Arguments must form a non-empty, even-length sequence of
/// (display name, file path) pairs. Returns `Error::Arguments` otherwise;
/// the caller reports usage and exits before any window is created.
pub fn entries_from_args(args: &[String]) -> Result<Vec<VideoEntry>> {
    if args.len() < 2 {
        return Err(Error::Arguments(
            "at least one \"name\" path pair is required".to_string(),
        ));
    }
    if args.len() % 2 != 0 {
        return Err(Error::Arguments(format!(
            "arguments must form \"name\" path pairs, got {} arguments",
            args.len()
        )));
    }

    Ok(args
        .chunks_exact(2)
        .map(|pair| VideoEntry::new(pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Ordered, fixed set of videos with a movable cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    entries: Vec<VideoEntry>,
    current: usize,
}

impl Playlist {
    /// Creates a playlist positioned at the first entry.
    ///
    /// Fails with [`Error::EmptyPlaylist`] when `entries` is empty, so a
    /// constructed playlist always has a valid current entry.
    pub fn new(entries: Vec<VideoEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyPlaylist);
        }
        Ok(Self {
            entries,
            current: 0,
        })
    }

    /// The entry under the cursor.
    pub fn current(&self) -> &VideoEntry {
        &self.entries[self.current]
    }

    /// Zero-based cursor position.
    pub fn index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a previous entry exists.
    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Whether a next entry exists.
    pub fn has_next(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Moves the cursor by `delta` entries.
    ///
    /// Returns `true` and updates the cursor when the target is in bounds;
    /// returns `false` and leaves the cursor untouched otherwise. Stepping
    /// past either end is a refused move, not an error.
    pub fn advance(&mut self, delta: isize) -> bool {
        let target = self.current as isize + delta;
        if target < 0 || target as usize >= self.entries.len() {
            return false;
        }
        self.current = target as usize;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries(count: usize) -> Vec<VideoEntry> {
        (0..count)
            .map(|i| VideoEntry::new(format!("Video {}", i), format!("/videos/{}.mp4", i)))
            .collect()
    }

    #[test]
    fn new_playlist_starts_at_first_entry() {
        let playlist = Playlist::new(sample_entries(3)).expect("construction failed");
        assert_eq!(playlist.index(), 0);
        assert_eq!(playlist.current().display_name(), "Video 0");
        assert!(!playlist.has_previous());
        assert!(playlist.has_next());
    }

    #[test]
    fn empty_entries_are_rejected() {
        let result = Playlist::new(Vec::new());
        assert!(matches!(result, Err(Error::EmptyPlaylist)));
    }

    #[test]
    fn single_entry_has_no_neighbors() {
        let playlist = Playlist::new(sample_entries(1)).expect("construction failed");
        assert!(!playlist.has_previous());
        assert!(!playlist.has_next());
    }

    #[test]
    fn advance_forward_moves_cursor() {
        let mut playlist = Playlist::new(sample_entries(3)).expect("construction failed");
        assert!(playlist.advance(1));
        assert_eq!(playlist.index(), 1);
        assert_eq!(playlist.current().display_name(), "Video 1");
    }

    #[test]
    fn advance_backward_from_first_is_refused() {
        let mut playlist = Playlist::new(sample_entries(3)).expect("construction failed");
        assert!(!playlist.advance(-1));
        assert_eq!(playlist.index(), 0);
    }

    #[test]
    fn advance_forward_from_last_is_refused() {
        let mut playlist = Playlist::new(sample_entries(2)).expect("construction failed");
        assert!(playlist.advance(1));
        assert!(!playlist.advance(1));
        assert_eq!(playlist.index(), 1);
    }

    #[test]
    fn navigation_is_not_cyclic() {
        let mut playlist = Playlist::new(sample_entries(2)).expect("construction failed");
        for _ in 0..5 {
            playlist.advance(-1);
        }
        assert_eq!(playlist.index(), 0);
    }

    #[test]
    fn walking_forward_visits_entries_in_argument_order() {
        let mut playlist = Playlist::new(sample_entries(4)).expect("construction failed");
        for i in 1..4 {
            assert!(playlist.advance(1));
            assert_eq!(playlist.current().display_name(), format!("Video {}", i));
            assert_eq!(playlist.has_previous(), i > 0);
            assert_eq!(playlist.has_next(), i < 3);
        }
    }

    #[test]
    fn file_name_returns_basename() {
        let entry = VideoEntry::new("Intro", "/tmp/media/a.mp4");
        assert_eq!(entry.file_name(), "a.mp4");
    }

    #[test]
    fn entries_from_args_builds_pairs_in_order() {
        let args = vec![
            "Intro".to_string(),
            "a.mp4".to_string(),
            "Main".to_string(),
            "b.mp4".to_string(),
        ];
        let entries = entries_from_args(&args).expect("pairing failed");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name(), "Intro");
        assert_eq!(entries[0].source_path(), Path::new("a.mp4"));
        assert_eq!(entries[1].display_name(), "Main");
    }

    #[test]
    fn entries_from_args_rejects_empty() {
        let result = entries_from_args(&[]);
        assert!(matches!(result, Err(Error::Arguments(_))));
    }

    #[test]
    fn entries_from_args_rejects_single_argument() {
        let result = entries_from_args(&["OnlyOne".to_string()]);
        assert!(matches!(result, Err(Error::Arguments(_))));
    }

    #[test]
    fn entries_from_args_rejects_odd_count() {
        let args = vec![
            "A".to_string(),
            "a.mp4".to_string(),
            "Dangling".to_string(),
        ];
        let result = entries_from_args(&args);
        assert!(matches!(result, Err(Error::Arguments(_))));
    }
}
