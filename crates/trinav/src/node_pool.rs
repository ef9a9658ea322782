//! Node pool and open-set queue implementations for cell searches
//!

use glam::Vec3;

use crate::tri_cell::CellRef;

/// Node flags for search state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const OPEN: NodeFlags = NodeFlags(0x01);
    pub const CLOSED: NodeFlags = NodeFlags(0x02);

    pub fn contains(&self, flag: NodeFlags) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: NodeFlags) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: NodeFlags) {
        self.0 &= !flag.0;
    }
}

/// Node index type
pub type NodeIndex = u32;

/// Null node index constant
pub const NULL_IDX: NodeIndex = NodeIndex::MAX;

/// Scale applied to costs before the integer comparison of the open set
const COST_SCALE: f32 = 1000.0;

/// Transient search node bound to one cell
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Cell the node corresponds to
    pub cell: CellRef,
    /// Index to parent node
    pub parent: NodeIndex,
    /// Wall of `cell` the search entered through (`None` for the root)
    pub entry_wall: Option<u8>,
    /// Position the local cost is measured from
    pub pos: Vec3,
    /// Cost from the parent to this node
    pub g_local: f32,
    /// Cost from the start to this node
    pub g: f32,
    /// Estimated cost from this node to the goal
    pub h: f32,
    /// Edge hops from the root
    pub depth: u32,
    /// Node flags
    pub flags: NodeFlags,
    /// Position in the open heap while open
    heap_index: usize,
}

impl SearchNode {
    fn new(cell: CellRef) -> Self {
        Self {
            cell,
            parent: NULL_IDX,
            entry_wall: None,
            pos: Vec3::ZERO,
            g_local: 0.0,
            g: 0.0,
            h: 0.0,
            depth: 0,
            flags: NodeFlags(0),
            heap_index: usize::MAX,
        }
    }

    /// Total estimated cost through this node
    #[inline]
    pub fn f(&self) -> f32 {
        self.g + self.h
    }

    pub fn is_open(&self) -> bool {
        self.flags.contains(NodeFlags::OPEN)
    }

    pub fn is_closed(&self) -> bool {
        self.flags.contains(NodeFlags::CLOSED)
    }
}

/// Pool of search nodes with a cell lookup table.
///
/// Nodes are never freed individually; the whole pool is cleared when the
/// owning search is reset so the allocations can be reused.
#[derive(Debug, Clone)]
pub struct NodePool {
    /// Node storage
    nodes: Vec<SearchNode>,
    /// First node index for each hash bucket
    first: Vec<NodeIndex>,
    /// Next node index in hash chain
    next: Vec<NodeIndex>,
    /// Hash table size (power of two)
    hash_size: usize,
}

impl NodePool {
    /// Creates a new node pool
    pub fn new(hash_size: usize) -> Self {
        let hash_size = hash_size.max(1).next_power_of_two();
        Self {
            nodes: Vec::new(),
            first: vec![NULL_IDX; hash_size],
            next: Vec::new(),
            hash_size,
        }
    }

    /// Clears the node pool
    pub fn clear(&mut self) {
        self.first.fill(NULL_IDX);
        self.next.clear();
        self.nodes.clear();
    }

    /// Finds the node for a cell
    pub fn find(&self, cell: CellRef) -> Option<NodeIndex> {
        let mut idx = self.first[self.bucket(cell)];
        while idx != NULL_IDX {
            if self.nodes[idx as usize].cell == cell {
                return Some(idx);
            }
            idx = self.next[idx as usize];
        }
        None
    }

    /// Gets the node for a cell, allocating a fresh one if needed.
    ///
    /// Returns the index and whether the node was newly allocated.
    pub fn get_or_insert(&mut self, cell: CellRef) -> (NodeIndex, bool) {
        if let Some(idx) = self.find(cell) {
            return (idx, false);
        }

        let idx = self.nodes.len() as NodeIndex;
        self.nodes.push(SearchNode::new(cell));

        let bucket = self.bucket(cell);
        self.next.push(self.first[bucket]);
        self.first[bucket] = idx;

        (idx, true)
    }

    #[inline]
    pub fn get(&self, idx: NodeIndex) -> &SearchNode {
        &self.nodes[idx as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: NodeIndex) -> &mut SearchNode {
        &mut self.nodes[idx as usize]
    }

    /// Walks parent links from `idx` back to the root and returns the cells
    /// in root-to-leaf order
    pub fn path_to(&self, idx: NodeIndex, out: &mut Vec<CellRef>) {
        out.clear();
        let mut current = idx;
        while current != NULL_IDX {
            let node = self.get(current);
            out.push(node.cell);
            current = node.parent;
        }
        out.reverse();
    }

    /// Gets the current node count
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn bucket(&self, cell: CellRef) -> usize {
        let a = cell.id() as usize;
        (a ^ (a >> 16)) & (self.hash_size - 1)
    }
}

/// Min-heap of open nodes ordered by total cost.
///
/// Costs are compared after rounding to a fixed precision; ties go to the
/// node with the lower cost so far.
#[derive(Debug, Clone, Default)]
pub struct NodeQueue {
    heap: Vec<NodeIndex>,
}

impl NodeQueue {
    /// Creates a new node queue
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Clears the queue
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Checks if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Gets the top node (minimum cost)
    pub fn peek(&self) -> Option<NodeIndex> {
        self.heap.first().copied()
    }

    /// Pushes a node onto the queue and flags it open
    pub fn push(&mut self, pool: &mut NodePool, idx: NodeIndex) {
        let node = pool.get_mut(idx);
        node.flags.insert(NodeFlags::OPEN);
        node.flags.remove(NodeFlags::CLOSED);

        self.heap.push(idx);
        let pos = self.heap.len() - 1;
        pool.get_mut(idx).heap_index = pos;
        self.bubble_up(pool, pos);
    }

    /// Pops the top node and flags it closed
    pub fn pop(&mut self, pool: &mut NodePool) -> Option<NodeIndex> {
        if self.heap.is_empty() {
            return None;
        }

        let result = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            pool.get_mut(self.heap[0]).heap_index = 0;
            self.trickle_down(pool, 0);
        }

        let node = pool.get_mut(result);
        node.heap_index = usize::MAX;
        node.flags.remove(NodeFlags::OPEN);
        node.flags.insert(NodeFlags::CLOSED);
        Some(result)
    }

    /// Restores heap order after a node's cost decreased
    pub fn modify(&mut self, pool: &mut NodePool, idx: NodeIndex) {
        let pos = pool.get(idx).heap_index;
        if pos < self.heap.len() && self.heap[pos] == idx {
            self.bubble_up(pool, pos);
            let pos = pool.get(idx).heap_index;
            self.trickle_down(pool, pos);
        }
    }

    /// Ordering used by the heap
    fn less(pool: &NodePool, a: NodeIndex, b: NodeIndex) -> bool {
        let a = pool.get(a);
        let b = pool.get(b);
        let fa = (a.f() * COST_SCALE).round() as i64;
        let fb = (b.f() * COST_SCALE).round() as i64;
        if fa != fb {
            return fa < fb;
        }
        a.g < b.g
    }

    /// Bubbles a node up the heap
    fn bubble_up(&mut self, pool: &mut NodePool, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !Self::less(pool, self.heap[i], self.heap[parent]) {
                break;
            }
            self.swap(pool, i, parent);
            i = parent;
        }
    }

    /// Trickles a node down the heap
    fn trickle_down(&mut self, pool: &mut NodePool, mut i: usize) {
        let size = self.heap.len();
        loop {
            let child1 = 2 * i + 1;
            if child1 >= size {
                break;
            }

            let child2 = child1 + 1;
            let mut min_child = child1;
            if child2 < size && Self::less(pool, self.heap[child2], self.heap[child1]) {
                min_child = child2;
            }

            if !Self::less(pool, self.heap[min_child], self.heap[i]) {
                break;
            }

            self.swap(pool, i, min_child);
            i = min_child;
        }
    }

    fn swap(&mut self, pool: &mut NodePool, a: usize, b: usize) {
        self.heap.swap(a, b);
        pool.get_mut(self.heap[a]).heap_index = a;
        pool.get_mut(self.heap[b]).heap_index = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_pool() {
        let mut pool = NodePool::new(8);

        // Test allocation
        let cell1 = CellRef::new(1);
        let (idx1, fresh) = pool.get_or_insert(cell1);
        assert!(fresh);
        assert_eq!(pool.get(idx1).cell, cell1);
        assert_eq!(pool.get(idx1).parent, NULL_IDX);

        // Test finding
        assert_eq!(pool.find(cell1), Some(idx1));
        let (again, fresh) = pool.get_or_insert(cell1);
        assert_eq!(again, idx1);
        assert!(!fresh);

        // Colliding buckets still resolve
        let cell9 = CellRef::new(9);
        let (idx9, _) = pool.get_or_insert(cell9);
        assert_ne!(idx9, idx1);
        assert_eq!(pool.find(cell9), Some(idx9));
        assert_eq!(pool.len(), 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.find(cell1), None);
    }

    #[test]
    fn test_path_to() {
        let mut pool = NodePool::new(8);
        let (a, _) = pool.get_or_insert(CellRef::new(4));
        let (b, _) = pool.get_or_insert(CellRef::new(7));
        let (c, _) = pool.get_or_insert(CellRef::new(2));
        pool.get_mut(b).parent = a;
        pool.get_mut(c).parent = b;

        let mut path = Vec::new();
        pool.path_to(c, &mut path);
        assert_eq!(path, vec![CellRef::new(4), CellRef::new(7), CellRef::new(2)]);
    }

    #[test]
    fn test_node_queue() {
        let mut pool = NodePool::new(16);
        let mut queue = NodeQueue::new();

        fn push(pool: &mut NodePool, queue: &mut NodeQueue, id: u32, g: f32, h: f32) -> NodeIndex {
            let (idx, _) = pool.get_or_insert(CellRef::new(id));
            pool.get_mut(idx).g = g;
            pool.get_mut(idx).h = h;
            queue.push(pool, idx);
            idx
        }

        push(&mut pool, &mut queue, 1, 5.0, 0.0);
        push(&mut pool, &mut queue, 2, 3.0, 0.0);
        let third = push(&mut pool, &mut queue, 3, 7.0, 0.0);
        // Same total as node 1 but cheaper so far
        push(&mut pool, &mut queue, 4, 1.0, 4.0);

        assert!(pool.get(third).is_open());

        // Lower node 3 below everything else
        pool.get_mut(third).g = 0.5;
        queue.modify(&mut pool, third);

        let mut order = Vec::new();
        while let Some(idx) = queue.pop(&mut pool) {
            order.push(pool.get(idx).cell.id());
        }
        assert_eq!(order, vec![3, 2, 4, 1]);
        assert!(queue.is_empty());
        assert!(pool.get(third).is_closed());
    }
}
