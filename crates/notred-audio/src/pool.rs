//! Fixed-capacity voice pool
//!
//! Slots are allocated once at startup and recycled; a `SourceId` is the
//! slot index. When every slot is busy, [`VoicePool::acquire`] steals the
//! active voice with the lowest priority score (fader volume × priority).

use std::collections::VecDeque;

use crate::types::{EventId, SourceId};
use crate::voice::{Voice, VoiceOwner};

/// A voice taken from another owner to satisfy an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictedVoice {
    pub id: SourceId,
    pub owner: VoiceOwner,
    pub event: Option<EventId>,
}

/// Result of a successful allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub id: SourceId,
    /// Set when the slot was stolen; the caller must detach it from its
    /// previous owner before reusing it
    pub evicted: Option<EvictedVoice>,
}

#[derive(Debug)]
pub struct VoicePool {
    voices: Vec<Voice>,
    in_use: Vec<bool>,
    free: VecDeque<SourceId>,
    /// Active slots in activation order
    active: Vec<SourceId>,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        let voices = (0..max_voices).map(|i| Voice::new(i as SourceId)).collect();
        Self {
            voices,
            in_use: vec![false; max_voices],
            free: (0..max_voices as SourceId).collect(),
            active: Vec::with_capacity(max_voices),
        }
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Active source IDs in activation order
    pub fn active_ids(&self) -> &[SourceId] {
        &self.active
    }

    pub fn is_active(&self, id: SourceId) -> bool {
        self.in_use.get(id as usize).copied().unwrap_or(false)
    }

    /// An active voice
    pub fn get(&self, id: SourceId) -> Option<&Voice> {
        if self.is_active(id) {
            self.voices.get(id as usize)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: SourceId) -> Option<&mut Voice> {
        if self.is_active(id) {
            self.voices.get_mut(id as usize)
        } else {
            None
        }
    }

    /// Every active voice (slot order)
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice> + '_ {
        let in_use = &self.in_use;
        self.voices.iter().enumerate().filter(move |(i, _)| in_use[*i]).map(|(_, v)| v)
    }

    pub fn active_voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> + '_ {
        let in_use = &self.in_use;
        self.voices
            .iter_mut()
            .enumerate()
            .filter(move |(i, _)| in_use[*i])
            .map(|(_, v)| v)
    }

    /// Active voices that have finished and can be reclaimed
    pub fn finished_ids(&self) -> Vec<SourceId> {
        self.active
            .iter()
            .copied()
            .filter(|&id| self.voices[id as usize].is_finished())
            .collect()
    }

    /// Take a free slot, evicting the lowest-priority voice if none is free
    ///
    /// Returns `None` only when the pool has no slots at all.
    pub fn acquire(&mut self) -> Option<Acquired> {
        if let Some(id) = self.free.pop_front() {
            self.in_use[id as usize] = true;
            self.active.push(id);
            return Some(Acquired { id, evicted: None });
        }

        let Some(position) = self.lowest_priority_position() else {
            log::warn!("Voice pool has no slots, cannot allocate a voice");
            return None;
        };

        let id = self.active.remove(position);
        let victim = &mut self.voices[id as usize];
        log::debug!(
            "Evicting voice {} (score {:.3}, state {})",
            id,
            victim.priority_score(),
            victim.state()
        );
        victim.stop_now(true, true);
        let evicted = EvictedVoice {
            id,
            owner: victim.owner(),
            event: victim.event(),
        };
        victim.release();
        self.active.push(id);
        Some(Acquired {
            id,
            evicted: Some(evicted),
        })
    }

    /// Index into `active` of the voice with the strictly smallest score;
    /// ties go to the earliest activated
    fn lowest_priority_position(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (position, &id) in self.active.iter().enumerate() {
            let score = self.voices[id as usize].priority_score();
            match best {
                Some((_, lowest)) if score >= lowest => {}
                _ => best = Some((position, score)),
            }
        }
        best.map(|(position, _)| position)
    }

    /// Return an active slot to the free list
    pub fn release(&mut self, id: SourceId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        self.voices[id as usize].release();
        self.in_use[id as usize] = false;
        self.active.retain(|&active| active != id);
        self.free.push_back(id);
        true
    }

    /// Hard-stop and free every active voice
    pub fn release_all(&mut self) -> Vec<SourceId> {
        let ids = std::mem::take(&mut self.active);
        for &id in &ids {
            let voice = &mut self.voices[id as usize];
            voice.stop_now(false, true);
            voice.release();
            self.in_use[id as usize] = false;
            self.free.push_back(id);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{PcmStream, SoundConfig};
    use crate::types::StereoSample;
    use crate::voice::{PlayState, STOPPING_FADE_MS};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn bind(pool: &mut VoicePool, id: SourceId, priority: u8) {
        let mut config = SoundConfig::for_asset(1);
        config.priority = priority;
        config.looping = true;
        let data: Arc<[StereoSample]> = vec![StereoSample::mono(0.1); 4800].into();
        let voice = pool.get_mut(id).unwrap();
        voice.initialize(Arc::new(config), Box::new(PcmStream::new(data, 48000)), 48000);
        voice.play();
        voice.update(0.001);
    }

    #[test]
    fn test_ids_are_distinct_until_full() {
        let mut pool = VoicePool::new(8);
        let mut seen = HashSet::new();
        for _ in 0..8 {
            let acquired = pool.acquire().unwrap();
            assert!(acquired.evicted.is_none());
            assert!(seen.insert(acquired.id));
        }
        assert_eq!(pool.active_count(), 8);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_evicts_lowest_score() {
        let mut pool = VoicePool::new(2);
        let a = pool.acquire().unwrap().id;
        let b = pool.acquire().unwrap().id;
        bind(&mut pool, a, 64);
        bind(&mut pool, b, 200);

        // Fade A down to 0.1
        let voice_a = pool.get_mut(a).unwrap();
        voice_a.stop();
        voice_a.update(STOPPING_FADE_MS * 0.9 / 1000.0);
        assert!((voice_a.fade_volume() - 0.1).abs() < 1e-3);

        let acquired = pool.acquire().unwrap();
        assert_eq!(acquired.id, a);
        assert_eq!(acquired.evicted.map(|e| e.id), Some(a));
        assert_eq!(pool.get(b).unwrap().state(), PlayState::Playing);
        assert_eq!(pool.get(a).unwrap().state(), PlayState::Stopped);
    }

    #[test]
    fn test_eviction_tie_goes_to_oldest() {
        let mut pool = VoicePool::new(3);
        let ids: Vec<_> = (0..3).map(|_| pool.acquire().unwrap().id).collect();
        for &id in &ids {
            bind(&mut pool, id, 100);
        }
        assert_eq!(pool.acquire().unwrap().id, ids[0]);
        // The stolen slot is now the newest activation
        assert_eq!(pool.active_ids(), &[ids[1], ids[2], ids[0]]);
        bind(&mut pool, ids[0], 100);
        assert_eq!(pool.acquire().unwrap().id, ids[1]);
    }

    #[test]
    fn test_eviction_notifies_victim() {
        let mut pool = VoicePool::new(1);
        let id = pool.acquire().unwrap().id;
        bind(&mut pool, id, 10);
        let notified = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&notified);
        pool.get_mut(id).unwrap().set_completion_callback(Box::new(move |_| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }));

        pool.acquire().unwrap();
        assert!(notified.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_empty_pool_fails() {
        let mut pool = VoicePool::new(0);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_release_recycles_slot() {
        let mut pool = VoicePool::new(2);
        let id = pool.acquire().unwrap().id;
        assert!(pool.release(id));
        assert!(!pool.release(id));
        assert!(pool.get(id).is_none());
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn test_finished_ids() {
        let mut pool = VoicePool::new(2);
        let a = pool.acquire().unwrap().id;
        let b = pool.acquire().unwrap().id;
        bind(&mut pool, a, 64);
        bind(&mut pool, b, 64);
        pool.get_mut(b).unwrap().stop_now(false, true);
        assert_eq!(pool.finished_ids(), vec![b]);
        assert_eq!(pool.active_voices().count(), 2);
    }
}
