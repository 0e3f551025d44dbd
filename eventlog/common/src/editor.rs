/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Log editor
//!
//! Every operation returns a new log and leaves its input untouched. Sequence numbers of the
//! result are renumbered contiguously from zero. Digests are carried over as given; use
//! [`rehash`] to recompute them from the event data.

use log::debug;

use crate::algorithm::hash;
use crate::error::EditError;
use crate::model::{Event, EventLog};

fn check_event(log: &EventLog, event: &Event) -> Result<(), EditError> {
    event.check_digests().map_err(EditError::InvalidEvent)?;
    match event.algorithms().find(|alg| !log.algorithms.contains(alg)) {
        Some(alg) => Err(EditError::AlgorithmNotDeclared(alg.to_string())),
        None => Ok(()),
    }
}

fn check_index(log: &EventLog, index: usize) -> Result<(), EditError> {
    if index >= log.events.len() {
        return Err(EditError::IndexOutOfRange { index, len: log.events.len() });
    }
    Ok(())
}

/// Insert `event` so that it ends up at position `index` (`0..=len`)
pub fn insert(log: &EventLog, index: usize, event: Event) -> Result<EventLog, EditError> {
    if index > log.events.len() {
        return Err(EditError::IndexOutOfRange { index, len: log.events.len() });
    }
    check_event(log, &event)?;

    let mut edited = log.clone();
    edited.events.insert(index, event);
    edited.renumber();
    debug!("Inserted event at {}, log now holds {} events", index, edited.events.len());
    Ok(edited)
}

/// Remove the event at `index`
pub fn remove(log: &EventLog, index: usize) -> Result<EventLog, EditError> {
    check_index(log, index)?;

    let mut edited = log.clone();
    edited.events.remove(index);
    edited.renumber();
    debug!("Removed event at {}, log now holds {} events", index, edited.events.len());
    Ok(edited)
}

/// Replace the event at `index` with `event`
pub fn replace(log: &EventLog, index: usize, event: Event) -> Result<EventLog, EditError> {
    check_index(log, index)?;
    check_event(log, &event)?;

    let mut edited = log.clone();
    edited.events[index] = event;
    edited.renumber();
    Ok(edited)
}

/// Recompute the digests of the event at `index` as the hash of its event data
///
/// The event keeps the same set of algorithms. This matches how firmware measures data
/// events; events whose digest covers something other than their data (PE images, for
/// example) must be given explicit digests instead.
pub fn rehash(log: &EventLog, index: usize) -> Result<EventLog, EditError> {
    check_index(log, index)?;

    let mut edited = log.clone();
    let event = &mut edited.events[index];
    event.digests = event
        .digests
        .iter()
        .map(|digest| hash(digest.algorithm(), &event.event_data))
        .collect::<Result<Vec<_>, _>>()?;
    edited.renumber();
    Ok(edited)
}
