use std::collections::HashMap;

/// Globally unique resource identifier.
/// A single flat 64-bit namespace; every live id has exactly one kind.
pub type Id = u64;

/// Zero is reserved as the invalid sentinel; no resource ever has it.
pub const INVALID_ID: Id = 0;

/// Parse a decimal-string id.
///
/// The JSON protocol prefers numeric ids but accepts decimal strings for
/// interoperability. Returns `None` for non-digit characters or overflow;
/// an empty string parses to the invalid sentinel.
pub fn parse_id_str(s: &str) -> Option<Id> {
    if s.is_empty() {
        return Some(INVALID_ID);
    }
    let mut v: Id = 0;
    for c in s.bytes() {
        if !c.is_ascii_digit() {
            return None;
        }
        v = v.checked_mul(10)?.checked_add(Id::from(c - b'0'))?;
    }
    Some(v)
}

/// The kind of scene resource an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pane,
    Layer,
    DrawItem,
    Buffer,
    Geometry,
    Transform,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pane => "pane",
            Self::Layer => "layer",
            Self::DrawItem => "drawItem",
            Self::Buffer => "buffer",
            Self::Geometry => "geometry",
            Self::Transform => "transform",
        }
    }
}

/// Tracks every live id and its kind, and mints fresh ids on demand.
///
/// Caller-supplied ids go through `reserve`; engine-allocated ids come from
/// `allocate`, whose monotonic counter skips anything already reserved.
#[derive(Debug, Default)]
pub struct IdRegistry {
    kinds: HashMap<Id, ResourceKind>,
    by_kind: HashMap<ResourceKind, Vec<Id>>,
    next_id: Id,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            by_kind: HashMap::new(),
            next_id: 1,
        }
    }

    /// Claim a caller-supplied id. Fails on zero or an id that is already live.
    pub fn reserve(&mut self, id: Id, kind: ResourceKind) -> bool {
        if id == INVALID_ID || self.kinds.contains_key(&id) {
            return false;
        }
        self.kinds.insert(id, kind);
        self.by_kind.entry(kind).or_default().push(id);
        true
    }

    /// Mint a fresh non-colliding id and record it under `kind`.
    pub fn allocate(&mut self, kind: ResourceKind) -> Id {
        while self.kinds.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.kinds.insert(id, kind);
        self.by_kind.entry(kind).or_default().push(id);
        id
    }

    /// Release an id. No-op if it is not live.
    pub fn release(&mut self, id: Id) {
        if let Some(kind) = self.kinds.remove(&id) {
            if let Some(ids) = self.by_kind.get_mut(&kind) {
                ids.retain(|&i| i != id);
            }
        }
    }

    pub fn exists(&self, id: Id) -> bool {
        self.kinds.contains_key(&id)
    }

    pub fn kind_of(&self, id: Id) -> Option<ResourceKind> {
        self.kinds.get(&id).copied()
    }

    /// Live ids of one kind, in the order they were registered.
    pub fn list(&self, kind: ResourceKind) -> &[Id] {
        self.by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total number of live ids across all kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
