//! Tagged one-shot timers.
//!
//! A timer is a `(deadline, tag)` pair. Expiry hands the tag back to the
//! owner, which re-validates its own state before acting; nothing here
//! holds references into that state.

use embassy_time::Instant;
use heapless::Vec;
use log::warn;

/// What a timer was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerTag {
    /// Long-press hold window of the key at this index.
    LongPress(u8),
    /// End of the debounce window of the key at this index.
    Settle(u8),
    UpdateCombo,
    PairingCombo,
    DialIdle,
    DialLongPress,
    Backoff,
}

/// Fixed-capacity set of armed timers, at most one per tag.
#[derive(Debug)]
pub struct TimerQueue<const N: usize> {
    entries: Vec<(Instant, TimerTag), N>,
}

impl<const N: usize> Default for TimerQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TimerQueue<N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Arm `tag` to fire at `deadline`, cancelling any pending timer with
    /// the same tag first. Returns `false` if the queue is full.
    pub fn arm(&mut self, tag: TimerTag, deadline: Instant) -> bool {
        self.cancel(tag);
        if self.entries.push((deadline, tag)).is_err() {
            warn!("timer queue full, dropping {:?}", tag);
            return false;
        }
        true
    }

    /// Cancel a pending timer. Returns whether one was armed.
    pub fn cancel(&mut self, tag: TimerTag) -> bool {
        match self.entries.iter().position(|(_, t)| *t == tag) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, tag: TimerTag) -> bool {
        self.deadline(tag).is_some()
    }

    pub fn deadline(&self, tag: TimerTag) -> Option<Instant> {
        self.entries
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(deadline, _)| *deadline)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|(deadline, _)| *deadline).min()
    }

    /// Remove and return the earliest timer due at `now`, with its deadline.
    ///
    /// Timers with equal deadlines come out in the order they were armed.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerTag, Instant)> {
        let mut earliest: Option<(usize, Instant)> = None;
        for (i, (deadline, _)) in self.entries.iter().enumerate() {
            if *deadline > now {
                continue;
            }
            match earliest {
                Some((_, best)) if best <= *deadline => {}
                _ => earliest = Some((i, *deadline)),
            }
        }
        earliest.map(|(i, _)| {
            let (deadline, tag) = self.entries.remove(i);
            (tag, deadline)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
