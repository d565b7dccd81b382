// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Event sources: where a day's events come from.
//!
//! A source hands out a lazy, finite stream per day. Calling `events` again
//! for the same day restarts the stream from the beginning.

use gdeltnet_core::{DayKey, Event, MonthKey, Result};
use std::collections::BTreeMap;

/// Stream of events for one day. An `Err` item is an upstream read fault
/// that invalidates the whole day.
pub type EventStream<'a> = Box<dyn Iterator<Item = Result<Event>> + Send + 'a>;

/// Capability of producing per-day event streams.
pub trait EventSource: Send + Sync {
    /// Days of `month` for which input is available, in order.
    fn days(&self, month: MonthKey) -> Vec<DayKey>;

    /// Events of `day`. Fails if the day's input cannot be opened at all.
    fn events(&self, day: DayKey) -> Result<EventStream<'_>>;
}

/// Events held in memory, keyed by day.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventSource {
    days: BTreeMap<DayKey, Vec<Event>>,
}

impl InMemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events to `day`. Registering a day with no events is allowed
    /// and yields an all-zero day matrix.
    pub fn push_day<I>(&mut self, day: DayKey, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        self.days.entry(day).or_default().extend(events);
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

impl EventSource for InMemoryEventSource {
    fn days(&self, month: MonthKey) -> Vec<DayKey> {
        self.days
            .keys()
            .filter(|day| day.month() == month)
            .copied()
            .collect()
    }

    fn events(&self, day: DayKey) -> Result<EventStream<'_>> {
        let events = self.days.get(&day).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Box::new(events.iter().cloned().map(Ok)))
    }
}
