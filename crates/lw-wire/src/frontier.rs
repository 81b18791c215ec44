use core::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FrontierEntry {
    pub cost: f32,
    pub idx: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: lower cost first, ties broken by lower row-major index.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

/// Min-priority frontier with lazy deletion: superseded entries stay in the
/// heap and are skipped by the caller when popped.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
}

impl Frontier {
    pub fn push(&mut self, idx: usize, cost: f32) {
        self.heap.push(FrontierEntry { cost, idx });
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Frontier;

    #[test]
    fn pops_in_cost_then_index_order() {
        let mut f = Frontier::default();
        f.push(7, 0.5);
        f.push(3, 0.25);
        f.push(9, 0.25);
        f.push(1, 2.0);
        f.push(0, 0.5);

        let order: Vec<usize> = std::iter::from_fn(|| f.pop()).map(|e| e.idx).collect();
        assert_eq!(order, vec![3, 9, 0, 7, 1]);
        assert!(f.is_empty());
        assert_eq!(f.len(), 0);
    }
}
