//! Single-vehicle tour with incrementally maintained objective and events.
//!
//! `events[i]` is the cumulative travel cost from the first node to the node
//! at position `i`, which doubles as the arrival time at that position. Every
//! mutator validates its arguments before touching state, updates the
//! objective by the exact cost delta of the edges it touched, and recomputes
//! only the suffix of the event array that can have changed.

use serde::Serialize;

use crate::error::{PlannerError, Result};
use crate::geometry::Coord;
use crate::traits::{DEPOT, InstanceProvider};

/// Directed edge between two consecutive tour positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from_pos: usize,
    pub from: usize,
    pub to_pos: usize,
    pub to: usize,
}

/// Shape of a tour as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TourState {
    Empty,
    PartialOpenPath,
    /// Starts and ends at the depot with at least one node in between.
    ClosedLoop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tour {
    nodes: Vec<usize>,
    events: Vec<u64>,
    obj: u64,
    closed: bool,
}

impl Tour {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // End operations
    // ========================================================================

    pub fn push_back<I>(&mut self, node: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        check_node(node, instance)?;
        let delta = match self.nodes.last() {
            Some(&last) => edge_cost(instance, last, node)?,
            None => 0,
        };
        let time = self.events.last().map_or(0, |&t| t + delta as u64);

        self.nodes.push(node);
        self.events.push(time);
        Ok(self.finish(delta))
    }

    pub fn push_front<I>(&mut self, node: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        check_node(node, instance)?;
        let delta = match self.nodes.first() {
            Some(&first) => edge_cost(instance, node, first)?,
            None => 0,
        };

        self.nodes.insert(0, node);
        self.recompute_events_from(0, instance)?;
        Ok(self.finish(delta))
    }

    pub fn pop_back<I>(&mut self, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if len == 0 {
            return Err(PlannerError::EmptyTour);
        }
        let delta = if len >= 2 {
            -edge_cost(instance, self.nodes[len - 2], self.nodes[len - 1])?
        } else {
            0
        };

        self.nodes.pop();
        self.events.pop();
        Ok(self.finish(delta))
    }

    pub fn pop_front<I>(&mut self, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if len == 0 {
            return Err(PlannerError::EmptyTour);
        }
        let delta = if len >= 2 {
            -edge_cost(instance, self.nodes[0], self.nodes[1])?
        } else {
            0
        };

        self.nodes.remove(0);
        self.recompute_events_from(0, instance)?;
        Ok(self.finish(delta))
    }

    // ========================================================================
    // Single-node operations
    // ========================================================================

    /// Inserts `node` so that it ends up at position `pos`.
    ///
    /// Positions `0` and `len` delegate to [`Tour::push_front`] and
    /// [`Tour::push_back`].
    pub fn insert_node<I>(&mut self, node: usize, pos: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if pos > len {
            return Err(PlannerError::PositionOutOfRange { pos, len });
        }
        if pos == 0 {
            return self.push_front(node, instance);
        }
        if pos == len {
            return self.push_back(node, instance);
        }

        let delta = self.insertion_delta(node, pos, instance)?;
        self.nodes.insert(pos, node);
        self.recompute_events_from(pos, instance)?;
        Ok(self.finish(delta))
    }

    /// Removes the node at `pos`. The inverse of [`Tour::insert_node`].
    pub fn remove_node<I>(&mut self, pos: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if len == 0 {
            return Err(PlannerError::EmptyTour);
        }
        if pos >= len {
            return Err(PlannerError::PositionOutOfRange { pos, len });
        }
        if pos == 0 {
            return self.pop_front(instance);
        }
        if pos == len - 1 {
            return self.pop_back(instance);
        }
        if len < 3 {
            return Err(PlannerError::TourTooShort { len });
        }

        let (a, b, c) = (self.nodes[pos - 1], self.nodes[pos], self.nodes[pos + 1]);
        let delta = edge_cost(instance, a, c)? - edge_cost(instance, a, b)? - edge_cost(instance, b, c)?;

        self.nodes.remove(pos);
        self.recompute_events_from(pos, instance)?;
        Ok(self.finish(delta))
    }

    /// Objective change if `node` were inserted at `pos`, without mutating.
    pub fn insertion_delta<I>(&self, node: usize, pos: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        check_node(node, instance)?;
        let len = self.nodes.len();
        if pos > len {
            return Err(PlannerError::PositionOutOfRange { pos, len });
        }
        if len == 0 {
            return Ok(0);
        }
        if pos == 0 {
            return edge_cost(instance, node, self.nodes[0]);
        }
        if pos == len {
            return edge_cost(instance, self.nodes[len - 1], node);
        }

        let (a, c) = (self.nodes[pos - 1], self.nodes[pos]);
        Ok(edge_cost(instance, a, node)? + edge_cost(instance, node, c)? - edge_cost(instance, a, c)?)
    }

    // ========================================================================
    // Block operations
    // ========================================================================

    /// Inserts `block` so that it occupies positions `pos_i..=pos_e`.
    pub fn insert_subtour<I>(&mut self, block: &[usize], pos_i: usize, pos_e: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if pos_i >= pos_e || pos_i > len || block.len() != pos_e - pos_i + 1 {
            return Err(PlannerError::InvalidRange { pos_i, pos_e, len });
        }
        check_nodes(block, instance)?;

        let delta = self.splice_delta(pos_i, pos_i, block, instance)?;
        self.nodes.splice(pos_i..pos_i, block.iter().copied());
        self.recompute_events_from(pos_i, instance)?;
        Ok(self.finish(delta))
    }

    /// Replaces positions `pos_i..=pos_e` with `block`.
    pub fn replace_subtour<I>(&mut self, block: &[usize], pos_i: usize, pos_e: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if pos_i >= pos_e || pos_e >= len || block.is_empty() {
            return Err(PlannerError::InvalidRange { pos_i, pos_e, len });
        }
        check_nodes(block, instance)?;

        let delta = self.splice_delta(pos_i, pos_e + 1, block, instance)?;
        self.nodes.splice(pos_i..=pos_e, block.iter().copied());
        self.recompute_events_from(pos_i, instance)?;
        Ok(self.finish(delta))
    }

    /// Removes positions `pos_i..=pos_e`.
    pub fn remove_subtour<I>(&mut self, pos_i: usize, pos_e: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if pos_i >= pos_e || pos_e >= len {
            return Err(PlannerError::InvalidRange { pos_i, pos_e, len });
        }

        let delta = self.splice_delta(pos_i, pos_e + 1, &[], instance)?;
        self.nodes.drain(pos_i..=pos_e);
        self.recompute_events_from(pos_i, instance)?;
        Ok(self.finish(delta))
    }

    /// Reverses positions `pos_i..=pos_e` in place.
    ///
    /// The objective is adjusted by the cost delta of the touched edges, so
    /// it stays exact for asymmetric matrices.
    pub fn reverse_subtour<I>(&mut self, pos_i: usize, pos_e: usize, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let len = self.nodes.len();
        if pos_i > pos_e || pos_e >= len {
            return Err(PlannerError::InvalidRange { pos_i, pos_e, len });
        }

        let reversed: Vec<usize> = self.nodes[pos_i..=pos_e].iter().rev().copied().collect();
        let delta = self.splice_delta(pos_i, pos_e + 1, &reversed, instance)?;
        self.nodes[pos_i..=pos_e].reverse();
        self.recompute_events_from(pos_i, instance)?;
        Ok(self.finish(delta))
    }

    pub fn reverse_tour<I>(&mut self, instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        if self.nodes.is_empty() {
            return Ok(0);
        }
        self.reverse_subtour(0, self.nodes.len() - 1, instance)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn obj(&self) -> u64 {
        self.obj
    }

    pub fn tour(&self) -> &[usize] {
        &self.nodes
    }

    /// First position holding `node`.
    pub fn pos_for_node(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    pub fn node_at_pos(&self, pos: usize) -> Result<usize> {
        self.nodes.get(pos).copied().ok_or(PlannerError::PositionOutOfRange {
            pos,
            len: self.nodes.len(),
        })
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn events(&self) -> &[u64] {
        &self.events
    }

    pub fn is_complete(&self) -> bool {
        self.closed
    }

    pub fn state(&self) -> TourState {
        if self.nodes.is_empty() {
            TourState::Empty
        } else if self.closed {
            TourState::ClosedLoop
        } else {
            TourState::PartialOpenPath
        }
    }

    /// First position whose arrival time is exactly `time`.
    pub fn event_index(&self, time: u64) -> Option<usize> {
        let idx = self.events.partition_point(|&e| e < time);
        (self.events.get(idx) == Some(&time)).then_some(idx)
    }

    /// Node reached at exactly `time`.
    pub fn node_at_event(&self, time: u64) -> Option<usize> {
        self.event_index(time).map(|pos| self.nodes[pos])
    }

    /// Last position reached at or before `time`.
    pub fn last_event_at_or_before(&self, time: u64) -> Option<usize> {
        self.events.partition_point(|&e| e <= time).checked_sub(1)
    }

    /// Edge from position `i` to position `i + 1`.
    pub fn edge(&self, i: usize) -> Result<Edge> {
        if i + 1 >= self.nodes.len() {
            return Err(PlannerError::PositionOutOfRange {
                pos: i,
                len: self.nodes.len(),
            });
        }
        Ok(Edge {
            from_pos: i,
            from: self.nodes[i],
            to_pos: i + 1,
            to: self.nodes[i + 1],
        })
    }

    /// Edge being traversed at `time`, or `None` once the tour has ended.
    pub fn edge_at_event(&self, time: u64) -> Option<Edge> {
        self.last_event_at_or_before(time)
            .and_then(|pos| self.edge(pos).ok())
    }

    /// Interpolated position of the vehicle at `time`.
    ///
    /// Before the final event the vehicle moves linearly along its current
    /// edge; afterwards it rests on its last node. A zero-cost edge keeps it
    /// on the edge's tail.
    pub fn position_at<I>(&self, time: u64, instance: &I) -> Result<Option<Coord>>
    where
        I: InstanceProvider + ?Sized,
    {
        let Some(pos) = self.last_event_at_or_before(time) else {
            return Ok(None);
        };
        let here = instance.coordinate(self.nodes[pos])?;
        if pos + 1 == self.nodes.len() {
            return Ok(Some(here));
        }

        let next = self.nodes[pos + 1];
        let cost = instance.cost(self.nodes[pos], next)?;
        if cost == 0 {
            return Ok(Some(here));
        }
        let fraction = (time - self.events[pos]) as f64 / f64::from(cost);
        Ok(Some(here.lerp(instance.coordinate(next)?, fraction)))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Cost change of replacing `nodes[pos_i..removed_end]` with `block`,
    /// counting the edges to the surviving neighbours on either side.
    fn splice_delta<I>(&self, pos_i: usize, removed_end: usize, block: &[usize], instance: &I) -> Result<i64>
    where
        I: InstanceProvider + ?Sized,
    {
        let start = pos_i.saturating_sub(1);
        let end = (removed_end + 1).min(self.nodes.len());

        let old_window = &self.nodes[start..end];
        let new_window: Vec<usize> = self.nodes[start..pos_i]
            .iter()
            .chain(block)
            .chain(&self.nodes[removed_end..end])
            .copied()
            .collect();

        Ok(path_cost(&new_window, instance)? - path_cost(old_window, instance)?)
    }

    fn recompute_events_from<I>(&mut self, pos: usize, instance: &I) -> Result<()>
    where
        I: InstanceProvider + ?Sized,
    {
        let start = pos.min(self.nodes.len()).min(self.events.len());
        self.events.truncate(start);
        for i in start..self.nodes.len() {
            let time = match i {
                0 => 0,
                _ => self.events[i - 1] + u64::from(instance.cost(self.nodes[i - 1], self.nodes[i])?),
            };
            self.events.push(time);
        }
        Ok(())
    }

    fn finish(&mut self, delta: i64) -> i64 {
        self.obj = (self.obj as i64 + delta) as u64;
        self.closed = self.nodes.len() >= 3
            && self.nodes.first() == Some(&DEPOT)
            && self.nodes.last() == Some(&DEPOT);
        debug_assert_eq!(self.obj, self.events.last().copied().unwrap_or(0));
        delta
    }
}

fn check_node<I>(node: usize, instance: &I) -> Result<()>
where
    I: InstanceProvider + ?Sized,
{
    if node >= instance.n() {
        return Err(PlannerError::NodeOutOfRange {
            node,
            count: instance.n(),
        });
    }
    Ok(())
}

fn check_nodes<I>(nodes: &[usize], instance: &I) -> Result<()>
where
    I: InstanceProvider + ?Sized,
{
    nodes.iter().try_for_each(|&node| check_node(node, instance))
}

fn edge_cost<I>(instance: &I, from: usize, to: usize) -> Result<i64>
where
    I: InstanceProvider + ?Sized,
{
    instance.cost(from, to).map(i64::from)
}

fn path_cost<I>(nodes: &[usize], instance: &I) -> Result<i64>
where
    I: InstanceProvider + ?Sized,
{
    nodes
        .windows(2)
        .map(|pair| edge_cost(instance, pair[0], pair[1]))
        .sum()
}
