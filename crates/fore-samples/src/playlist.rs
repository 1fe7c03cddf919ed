//! An editable playlist of tracks with a requested play count each.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fore_core::{Observable, ObservableImp, Observer};
use parking_lot::Mutex;

const TARGET: &str = "fore_samples::playlist";

/// Fewest plays a track can request.
pub const MIN_PLAYS_REQUESTED: u32 = 1;
/// Most plays a track can request.
pub const MAX_PLAYS_REQUESTED: u32 = 4;

/// One entry in a [`Playlist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    pub id: u64,
    pub plays_requested: u32,
}

impl Track {
    pub fn can_increase_plays(&self) -> bool {
        self.plays_requested < MAX_PLAYS_REQUESTED
    }

    pub fn can_decrease_plays(&self) -> bool {
        self.plays_requested > MIN_PLAYS_REQUESTED
    }
}

struct PlaylistInner {
    tracks: Mutex<Vec<Track>>,
    next_id: AtomicU64,
    observable: ObservableImp,
}

/// Ordered list of tracks.
///
/// Every operation that takes an index leaves the playlist untouched when
/// the index is out of range.
#[derive(Clone)]
pub struct Playlist {
    inner: Arc<PlaylistInner>,
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playlist")
            .field("tracks", &*self.inner.tracks.lock())
            .finish()
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PlaylistInner {
                tracks: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                observable: ObservableImp::new(),
            }),
        }
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.inner.tracks.lock().len()
    }

    pub fn track(&self, index: usize) -> Option<Track> {
        self.inner.tracks.lock().get(index).copied()
    }

    /// Snapshot of every track.
    pub fn tracks(&self) -> Vec<Track> {
        self.inner.tracks.lock().clone()
    }

    /// Sum of the plays requested across all tracks.
    pub fn total_plays_requested(&self) -> u32 {
        self.inner.tracks.lock().iter().map(|t| t.plays_requested).sum()
    }

    pub fn can_increase_plays(&self, index: usize) -> bool {
        self.track(index).is_some_and(|t| t.can_increase_plays())
    }

    pub fn can_decrease_plays(&self, index: usize) -> bool {
        self.track(index).is_some_and(|t| t.can_decrease_plays())
    }

    /// Append one track requesting a single play.
    pub fn add_new_track(&self) -> Track {
        self.add_multiple_new_tracks(1)[0]
    }

    /// Append `count` tracks. Returns the tracks added.
    pub fn add_multiple_new_tracks(&self, count: usize) -> Vec<Track> {
        let added: Vec<Track> = (0..count)
            .map(|_| Track {
                id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
                plays_requested: MIN_PLAYS_REQUESTED,
            })
            .collect();
        if added.is_empty() {
            return added;
        }
        self.inner.tracks.lock().extend_from_slice(&added);
        tracing::debug!(target: TARGET, added = added.len(), "tracks added");
        self.notify_observers();
        added
    }

    /// Remove the track at `index`, returning it.
    pub fn remove_track(&self, index: usize) -> Option<Track> {
        let removed = {
            let mut tracks = self.inner.tracks.lock();
            (index < tracks.len()).then(|| tracks.remove(index))
        };
        if removed.is_some() {
            self.notify_observers();
        }
        removed
    }

    /// Remove every track.
    pub fn remove_all_tracks(&self) {
        let had_tracks = {
            let mut tracks = self.inner.tracks.lock();
            let had_tracks = !tracks.is_empty();
            tracks.clear();
            had_tracks
        };
        if had_tracks {
            self.notify_observers();
        }
    }

    pub fn increase_plays_for_track(&self, index: usize) -> bool {
        self.update_track(index, |track| {
            if !track.can_increase_plays() {
                return false;
            }
            track.plays_requested += 1;
            true
        })
    }

    pub fn decrease_plays_for_track(&self, index: usize) -> bool {
        self.update_track(index, |track| {
            if !track.can_decrease_plays() {
                return false;
            }
            track.plays_requested -= 1;
            true
        })
    }

    fn update_track(&self, index: usize, update: impl FnOnce(&mut Track) -> bool) -> bool {
        let changed = self
            .inner
            .tracks
            .lock()
            .get_mut(index)
            .is_some_and(update);
        if changed {
            self.notify_observers();
        }
        changed
    }
}

impl Observable for Playlist {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.add_observer(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.remove_observer(observer);
    }

    fn notify_observers(&self) {
        self.inner.observable.notify_observers();
    }

    fn has_observers(&self) -> bool {
        self.inner.observable.has_observers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_add_and_remove_tracks() {
        let playlist = Playlist::new();
        let first = playlist.add_new_track();
        let more = playlist.add_multiple_new_tracks(3);

        assert_eq!(playlist.track_count(), 4);
        assert_eq!(more.len(), 3);
        assert!(more.iter().all(|t| t.id != first.id));

        assert_eq!(playlist.remove_track(0), Some(first));
        assert_eq!(playlist.remove_track(10), None);
        assert_eq!(playlist.track_count(), 3);

        playlist.remove_all_tracks();
        assert_eq!(playlist.track_count(), 0);
    }

    #[test]
    fn test_plays_are_bounded() {
        let playlist = Playlist::new();
        playlist.add_new_track();

        assert!(!playlist.can_decrease_plays(0));
        assert!(!playlist.decrease_plays_for_track(0));

        for _ in 0..10 {
            playlist.increase_plays_for_track(0);
        }
        assert_eq!(playlist.track(0).map(|t| t.plays_requested), Some(MAX_PLAYS_REQUESTED));
        assert!(!playlist.can_increase_plays(0));
        assert!(playlist.can_decrease_plays(0));
        assert_eq!(playlist.total_plays_requested(), MAX_PLAYS_REQUESTED);
    }

    #[test]
    fn test_out_of_range_changes_nothing() {
        let playlist = Playlist::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        playlist.add_observer(&observer);

        assert!(!playlist.increase_plays_for_track(0));
        assert_eq!(playlist.remove_track(0), None);
        playlist.remove_all_tracks();
        playlist.add_multiple_new_tracks(0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
