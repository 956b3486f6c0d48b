//! An in-memory CLRS B-tree over [`Value`], used as the primary-key index.
//!
//! ## Input
//! A minimum degree `t >= 2` at construction; `Value`s that implement a total
//! order (see [`crate::value::Value`]) thereafter.
//!
//! ## Performance
//! O(t · log_t n) per operation; fan-out bounded to `[t, 2t]` children.
//!
//! ## Error Conditions
//! None at the API surface — `insert`/`remove` on well-formed trees cannot
//! fail; `deserialize` can, on a truncated or malformed byte stream.
use std::io::Read;

use crate::error::EngineResult;
use crate::value::{Value, read_u64};

#[derive(Debug, Clone)]
struct Node {
    keys: Vec<Value>,
    children: Vec<Node>,
}

impl Node {
    fn leaf() -> Node {
        Node {
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn is_full(&self, t: usize) -> bool {
        self.keys.len() == 2 * t - 1
    }

    /// Index of the first key >= value (a lower bound); if it equals `value`
    /// exactly the search has found it.
    fn lower_bound(&self, value: &Value) -> usize {
        self.keys.partition_point(|k| k < value)
    }

    fn search(&self, value: &Value) -> bool {
        let i = self.lower_bound(value);
        if i < self.keys.len() && &self.keys[i] == value {
            return true;
        }
        if self.is_leaf() {
            return false;
        }
        self.children[i].search(value)
    }

    /// Splits the full child at `children[i]` around its median key, which
    /// moves up into `self`.
    fn split_child(&mut self, i: usize, t: usize) {
        let mut right = Node::leaf();
        let median;
        {
            let left = &mut self.children[i];
            median = left.keys.remove(t - 1);
            right.keys = left.keys.split_off(t - 1);
            if !left.is_leaf() {
                right.children = left.children.split_off(t);
            }
        }
        self.keys.insert(i, median);
        self.children.insert(i + 1, right);
    }

    fn insert_non_full(&mut self, value: Value, t: usize) {
        if self.is_leaf() {
            let i = self.lower_bound(&value);
            self.keys.insert(i, value);
            return;
        }
        let mut i = self.lower_bound(&value);
        if self.children[i].is_full(t) {
            self.split_child(i, t);
            if value > self.keys[i] {
                i += 1;
            }
        }
        self.children[i].insert_non_full(value, t);
    }

    fn predecessor(&self) -> Value {
        let mut node = self;
        while !node.is_leaf() {
            node = node.children.last().expect("non-leaf has children");
        }
        node.keys.last().expect("non-empty subtree").clone()
    }

    fn successor(&self) -> Value {
        let mut node = self;
        while !node.is_leaf() {
            node = node.children.first().expect("non-leaf has children");
        }
        node.keys.first().expect("non-empty subtree").clone()
    }

    /// Merges `children[i+1]` and the separator key `keys[i]` into
    /// `children[i]`, removing both from `self`.
    fn merge(&mut self, i: usize) {
        let separator = self.keys.remove(i);
        let right = self.children.remove(i + 1);
        let left = &mut self.children[i];
        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);
    }

    fn borrow_from_prev(&mut self, i: usize) {
        let separator = self.keys[i - 1].clone();
        let moved_child = if !self.children[i - 1].is_leaf() {
            self.children[i - 1].children.pop()
        } else {
            None
        };
        let borrowed_key = self.children[i - 1]
            .keys
            .pop()
            .expect("sibling has >= t keys");
        self.children[i].keys.insert(0, separator);
        if let Some(c) = moved_child {
            self.children[i].children.insert(0, c);
        }
        self.keys[i - 1] = borrowed_key;
    }

    fn borrow_from_next(&mut self, i: usize) {
        let separator = self.keys[i].clone();
        let moved_child = if !self.children[i + 1].is_leaf() {
            Some(self.children[i + 1].children.remove(0))
        } else {
            None
        };
        let borrowed_key = self.children[i + 1].keys.remove(0);
        self.children[i].keys.push(separator);
        if let Some(c) = moved_child {
            self.children[i].children.push(c);
        }
        self.keys[i] = borrowed_key;
    }

    /// Ensures `children[i]` has at least `t` keys before descending into it,
    /// by borrowing from a sibling or merging with one.
    fn fill(&mut self, i: usize, t: usize) {
        if i != 0 && self.children[i - 1].keys.len() >= t {
            self.borrow_from_prev(i);
        } else if i != self.children.len() - 1 && self.children[i + 1].keys.len() >= t {
            self.borrow_from_next(i);
        } else if i != self.children.len() - 1 {
            self.merge(i);
        } else {
            self.merge(i - 1);
        }
    }

    fn remove(&mut self, value: &Value, t: usize) {
        let i = self.lower_bound(value);
        if i < self.keys.len() && &self.keys[i] == value {
            if self.is_leaf() {
                self.keys.remove(i);
            } else if self.children[i].keys.len() >= t {
                let pred = self.children[i].predecessor();
                self.keys[i] = pred.clone();
                self.children[i].remove(&pred, t);
            } else if self.children[i + 1].keys.len() >= t {
                let succ = self.children[i + 1].successor();
                self.keys[i] = succ.clone();
                self.children[i + 1].remove(&succ, t);
            } else {
                self.merge(i);
                self.children[i].remove(value, t);
            }
            return;
        }

        if self.is_leaf() {
            // Not present; removing a non-existent key is a no-op.
            return;
        }

        // `was_last` captures whether `i` indexed the rightmost child before
        // `fill` possibly merges it away. The source's original condition
        // here (`flag && idx > keys.size()`) could never be true because
        // `flag` already implied `idx == keys.size()`; the corrected rule
        // re-checks the child array's bounds *after* fill runs, since a
        // merge at the last index shifts the target down to `i - 1`.
        let was_last = i == self.children.len() - 1;
        if self.children[i].keys.len() < t {
            self.fill(i, t);
        }
        if was_last && i >= self.children.len() {
            self.children[i - 1].remove(value, t);
        } else {
            self.children[i].remove(value, t);
        }
    }

    fn in_order(&self, out: &mut Vec<Value>) {
        if self.is_leaf() {
            out.extend(self.keys.iter().cloned());
            return;
        }
        for i in 0..self.keys.len() {
            self.children[i].in_order(out);
            out.push(self.keys[i].clone());
        }
        self.children[self.keys.len()].in_order(out);
    }

    fn serialize(&self, buf: &mut Vec<u8>) {
        buf.push(if self.is_leaf() { 1 } else { 0 });
        buf.extend_from_slice(&(self.keys.len() as u64).to_le_bytes());
        for k in &self.keys {
            k.encode_tagged(buf);
        }
        if !self.is_leaf() {
            buf.extend_from_slice(&(self.children.len() as u64).to_le_bytes());
            for c in &self.children {
                c.serialize(buf);
            }
        }
    }

    fn deserialize(r: &mut impl Read) -> EngineResult<Node> {
        let mut flag = [0u8; 1];
        r.read_exact(&mut flag)?;
        let is_leaf = flag[0] != 0;
        let key_count = read_u64(r)?;
        let mut keys = Vec::with_capacity(key_count as usize);
        for _ in 0..key_count {
            keys.push(Value::decode_tagged(r)?);
        }
        let children = if is_leaf {
            Vec::new()
        } else {
            let child_count = read_u64(r)?;
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                children.push(Node::deserialize(r)?);
            }
            children
        };
        Ok(Node { keys, children })
    }
}

/// An ordered index of [`Value`]s with CLRS split/merge/borrow/fill semantics.
#[derive(Debug, Clone)]
pub struct BTree {
    root: Node,
    t: usize,
}

impl BTree {
    /// `t` is the minimum degree; every non-root node holds `[t-1, 2t-1]`
    /// keys. The default used throughout this engine is `t = 3`.
    pub fn new(t: usize) -> BTree {
        assert!(t >= 2, "minimum degree must be at least 2");
        BTree {
            root: Node::leaf(),
            t,
        }
    }

    pub fn degree(&self) -> usize {
        self.t
    }

    pub fn is_empty(&self) -> bool {
        self.root.keys.is_empty() && self.root.is_leaf()
    }

    pub fn insert(&mut self, value: Value) {
        if self.root.is_full(self.t) {
            let old_root = std::mem::replace(&mut self.root, Node::leaf());
            self.root.children.push(old_root);
            self.root.split_child(0, self.t);
        }
        self.root.insert_non_full(value, self.t);
    }

    pub fn search(&self, value: &Value) -> bool {
        self.root.search(value)
    }

    pub fn remove(&mut self, value: &Value) {
        if self.is_empty() {
            return;
        }
        self.root.remove(value, self.t);
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            self.root = self.root.children.remove(0);
        }
    }

    /// Keys in ascending order.
    pub fn in_order(&self) -> Vec<Value> {
        let mut out = Vec::new();
        self.root.in_order(&mut out);
        out
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.t as u64).to_le_bytes());
        self.root.serialize(buf);
    }

    pub fn deserialize(r: &mut impl Read) -> EngineResult<BTree> {
        let t = read_u64(r)? as usize;
        let root = Node::deserialize(r)?;
        Ok(BTree { root, t })
    }

    /// Checks the structural invariants (used by tests): all leaves at equal
    /// depth, key counts within bounds, keys sorted.
    #[cfg(test)]
    fn check_invariants(&self) -> bool {
        fn depth(node: &Node) -> Option<usize> {
            if node.is_leaf() {
                return Some(0);
            }
            let mut d = None;
            for c in &node.children {
                let cd = depth(c)?;
                match d {
                    None => d = Some(cd),
                    Some(prev) if prev != cd => return None,
                    _ => {}
                }
            }
            d.map(|x| x + 1)
        }
        fn check(node: &Node, t: usize, is_root: bool) -> bool {
            if !is_root && (node.keys.len() < t - 1 || node.keys.len() > 2 * t - 1) {
                return false;
            }
            if node.keys.windows(2).any(|w| w[0] > w[1]) {
                return false;
            }
            if !node.is_leaf() && node.children.len() != node.keys.len() + 1 {
                return false;
            }
            node.children.iter().all(|c| check(c, t, false))
        }
        depth(&self.root).is_some() && check(&self.root, self.t, true)
    }
}
