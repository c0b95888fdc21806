//! O(1) LRU ordering over page keys.
//!
//! Design:
//! - HashMap<key, Link> stores doubly-linked pointers (prev/next by key).
//! - head = MRU, tail = LRU.
//! - touch() moves a key to head, push_front() inserts at head, remove() unlinks.
//! - iter_lru() walks from tail towards head (eviction scan order).
//!
//! Only ordering lives here; the pool decides which key may be evicted.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct LruList {
    links: HashMap<u64, Link>,
    head: Option<u64>, // Most-recently used
    tail: Option<u64>, // Least-recently used
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<u64>,
    next: Option<u64>,
}

impl LruList {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            links: HashMap::with_capacity(cap.max(1)),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub(crate) fn contains(&self, key: u64) -> bool {
        self.links.contains_key(&key)
    }

    /// Insert as MRU; an existing key is moved instead.
    pub(crate) fn push_front(&mut self, key: u64) {
        if self.links.contains_key(&key) {
            self.touch(key);
            return;
        }
        self.links.insert(key, Link::default());
        self.attach_front(key);
    }

    /// Move to MRU. Unknown keys are ignored.
    pub(crate) fn touch(&mut self, key: u64) {
        if !self.links.contains_key(&key) || self.head == Some(key) {
            return;
        }
        self.detach(key);
        self.attach_front(key);
    }

    pub(crate) fn remove(&mut self, key: u64) -> bool {
        if !self.links.contains_key(&key) {
            return false;
        }
        self.detach(key);
        self.links.remove(&key);
        true
    }

    /// Keys from LRU to MRU.
    pub(crate) fn iter_lru(&self) -> LruIter<'_> {
        LruIter {
            list: self,
            cur: self.tail,
        }
    }

    #[cfg(test)]
    fn keys_mru(&self) -> Vec<u64> {
        let mut v: Vec<u64> = self.iter_lru().collect();
        v.reverse();
        v
    }

    // ---------------- internal helpers ----------------

    fn detach(&mut self, key: u64) {
        let Link { prev, next } = match self.links.get(&key) {
            Some(l) => *l,
            None => return,
        };

        if self.head == Some(key) {
            self.head = next;
        }
        if self.tail == Some(key) {
            self.tail = prev;
        }

        if let Some(p) = prev {
            if let Some(pl) = self.links.get_mut(&p) {
                pl.next = next;
            }
        }
        if let Some(n) = next {
            if let Some(nl) = self.links.get_mut(&n) {
                nl.prev = prev;
            }
        }

        if let Some(l) = self.links.get_mut(&key) {
            *l = Link::default();
        }
    }

    fn attach_front(&mut self, key: u64) {
        let old_head = self.head;
        if let Some(l) = self.links.get_mut(&key) {
            l.prev = None;
            l.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(hl) = self.links.get_mut(&h) {
                hl.prev = Some(key);
            }
        }
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }
}

pub(crate) struct LruIter<'a> {
    list: &'a LruList,
    cur: Option<u64>,
}

impl Iterator for LruIter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let key = self.cur?;
        self.cur = self.list.links.get(&key).and_then(|l| l.prev);
        Some(key)
    }
}
