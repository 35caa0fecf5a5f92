use serde::{Deserialize, Serialize};

use crate::{Interval, SampleIndex};

/// Where a trial onset index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnsetSource {
    /// End of a detected beginning-protocol event.
    Event(Interval),
    /// No qualifying event; the protocol is assumed to fill its window.
    WindowFallback,
    /// First stimulus-onset edge of a trigger channel.
    Trigger,
    /// No trigger edge found; the record starts at its first row.
    RecordStart,
}

/// First sample of real-trial data in one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOnset {
    pub index: SampleIndex,
    pub source: OnsetSource,
}

impl TrialOnset {
    pub fn is_fallback(&self) -> bool {
        matches!(
            self.source,
            OnsetSource::WindowFallback | OnsetSource::RecordStart
        )
    }
}

/// Picks the event that ends a beginning protocol of `window` samples.
#[derive(Debug, Clone, Copy)]
pub struct OnsetResolver {
    window: SampleIndex,
}

impl OnsetResolver {
    pub fn new(window: SampleIndex) -> Self {
        Self { window }
    }

    pub fn window(&self) -> SampleIndex {
        self.window
    }

    /// Intervals that end inside the window, in list order.
    pub fn beginning_intervals<'a>(
        &self,
        intervals: &'a [Interval],
    ) -> impl Iterator<Item = &'a Interval> + 'a {
        let window = self.window;
        intervals.iter().filter(move |interval| interval.end <= window)
    }

    /// Onset at the end of the last interval inside the window. The protocol
    /// asks for three events but any count is accepted.
    pub fn last_event(&self, intervals: &[Interval]) -> TrialOnset {
        self.pick(self.beginning_intervals(intervals).last().copied())
    }

    /// Onset at the end of the longest interval inside the window, the
    /// earliest one winning ties.
    pub fn longest_event(&self, intervals: &[Interval]) -> TrialOnset {
        let longest = self
            .beginning_intervals(intervals)
            .fold(None::<&Interval>, |best, candidate| match best {
                Some(best) if best.len() >= candidate.len() => Some(best),
                _ => Some(candidate),
            })
            .copied();
        self.pick(longest)
    }

    fn pick(&self, event: Option<Interval>) -> TrialOnset {
        match event {
            Some(interval) => TrialOnset {
                index: interval.end,
                source: OnsetSource::Event(interval),
            },
            None => TrialOnset {
                index: self.window,
                source: OnsetSource::WindowFallback,
            },
        }
    }
}
