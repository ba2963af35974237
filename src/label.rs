use std::ops::Index;

use crate::network::{DepartureIndex, PathfindingCost, RouteStopIndex, Timestamp};

/// Handle of a [`PathElement`] inside a [`Labels`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LabelId(u32);

/// How a label's route stop was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrival {
    /// Access, egress, footpath or in-station transfer.
    Walk,
    /// Alighting from the given departure.
    Ride { departure: DepartureIndex },
}

/// An arrival label. Never modified once pushed; better arrivals get new labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathElement {
    pub coming_from: Option<LabelId>,
    /// `None` for the egress label, which leaves the network.
    pub to_route_stop: Option<RouteStopIndex>,
    pub arrival_time: Timestamp,
    pub arrival_cost: PathfindingCost,
    pub transfer_count: u32,
    pub arrival: Arrival,
}

impl PathElement {
    pub fn is_transfer(&self) -> bool { self.arrival == Arrival::Walk }
}

/// Append-only store for the labels of one search, so that parents can be shared between many arrivals.
#[derive(Debug, Default)]
pub struct Labels {
    elements: Vec<PathElement>,
}

impl Labels {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, element: PathElement) -> LabelId {
        let id = LabelId(self.elements.len() as u32);
        self.elements.push(element);
        id
    }

    pub fn get(&self, id: LabelId) -> Option<&PathElement> { self.elements.get(id.0 as usize) }

    pub fn root_of(&self, mut id: LabelId) -> LabelId {
        while let Some(parent) = self[id].coming_from {
            id = parent;
        }
        id
    }

    /// Labels from the root down to `id`.
    pub fn path_to(&self, id: LabelId) -> Vec<LabelId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self[current].coming_from {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn clear(&mut self) { self.elements.clear(); }

    pub fn len(&self) -> usize { self.elements.len() }

    pub fn is_empty(&self) -> bool { self.elements.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> { self.elements.iter() }
}

impl Index<LabelId> for Labels {
    type Output = PathElement;

    fn index(&self, id: LabelId) -> &PathElement { &self.elements[id.0 as usize] }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(coming_from: Option<LabelId>, arrival_time: Timestamp) -> PathElement {
        PathElement {
            coming_from,
            to_route_stop: Some(0),
            arrival_time,
            arrival_cost: arrival_time as PathfindingCost,
            transfer_count: 0,
            arrival: Arrival::Walk,
        }
    }

    #[test]
    fn path_is_returned_root_first() {
        let mut labels = Labels::new();
        let root = labels.push(walk(None, 0));
        let other_root = labels.push(walk(None, 5));
        let middle = labels.push(walk(Some(root), 10));
        let leaf = labels.push(PathElement { arrival: Arrival::Ride { departure: 3 }, ..walk(Some(middle), 20) });

        assert_eq!(labels.path_to(leaf), vec![root, middle, leaf]);
        assert_eq!(labels.path_to(other_root), vec![other_root]);
        assert_eq!(labels.root_of(leaf), root);
        assert!(labels[middle].is_transfer());
        assert!(!labels[leaf].is_transfer());
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut labels = Labels::new();
        let root = labels.push(walk(None, 0));
        assert_eq!(labels.len(), 1);
        labels.clear();
        assert!(labels.is_empty());
        assert!(labels.get(root).is_none());
    }
}
