//! The two connectivity layers of a layout problem.
//!
//! [`StrongConnections`] are direct pin-to-pin wires. They are stored keyed in
//! both directions so either order answers a lookup in O(1).
//! [`WeakConnections`] record a pin's membership in a net.
//!
//! Both relations keep insertion order, which is the order every algorithm
//! downstream iterates them in.

use indexmap::IndexMap;
use schemapack_common::{NetId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One directed strong-connection entry as stored and serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongEntry {
    /// First pin of the key.
    pub a: PinId,
    /// Second pin of the key.
    pub b: PinId,
    /// Whether the pins are wired together.
    pub connected: bool,
}

/// Symmetric pin-to-pin connection relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StrongEntry>", into = "Vec<StrongEntry>")]
pub struct StrongConnections {
    entries: IndexMap<(PinId, PinId), bool>,
}

impl StrongConnections {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `a` and `b` together, storing both key orders.
    pub fn connect(&mut self, a: PinId, b: PinId) {
        self.entries.insert((a.clone(), b.clone()), true);
        self.entries.insert((b, a), true);
    }

    /// Stores a single directed entry exactly as given.
    ///
    /// Used when copying a relation; [`connect`](Self::connect) is the
    /// normal way to add a wire.
    pub fn insert_entry(&mut self, a: PinId, b: PinId, connected: bool) {
        self.entries.insert((a, b), connected);
    }

    /// Returns `true` if either key order is stored as connected.
    pub fn is_connected(&self, a: &PinId, b: &PinId) -> bool {
        let forward = self.entries.get(&(a.clone(), b.clone()));
        let backward = self.entries.get(&(b.clone(), a.clone()));
        forward.copied().unwrap_or(false) || backward.copied().unwrap_or(false)
    }

    /// Iterates every stored entry, connected or not, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&PinId, &PinId, bool)> {
        self.entries.iter().map(|((a, b), &c)| (a, b, c))
    }

    /// Iterates the connected entries in insertion order.
    ///
    /// Each wire appears twice, once per key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&PinId, &PinId)> {
        self.entries
            .iter()
            .filter(|&(_, &c)| c)
            .map(|((a, b), _)| (a, b))
    }

    /// Returns `true` if at least one entry is connected.
    pub fn any_connected(&self) -> bool {
        self.entries.values().any(|&c| c)
    }

    /// Returns `true` if the directed key `(a, b)` is stored, whatever its value.
    pub fn contains_key(&self, a: &PinId, b: &PinId) -> bool {
        self.entries.contains_key(&(a.clone(), b.clone()))
    }

    /// Number of stored directed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy holding only the entries whose both endpoints are in `pins`.
    pub fn restricted_to(&self, pins: &HashSet<PinId>) -> StrongConnections {
        let entries = self
            .entries
            .iter()
            .filter(|((a, b), _)| pins.contains(a) && pins.contains(b))
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        StrongConnections { entries }
    }
}

impl From<Vec<StrongEntry>> for StrongConnections {
    fn from(list: Vec<StrongEntry>) -> Self {
        let entries = list
            .into_iter()
            .map(|e| ((e.a, e.b), e.connected))
            .collect();
        StrongConnections { entries }
    }
}

impl From<StrongConnections> for Vec<StrongEntry> {
    fn from(conns: StrongConnections) -> Self {
        conns
            .entries
            .into_iter()
            .map(|((a, b), connected)| StrongEntry { a, b, connected })
            .collect()
    }
}

/// One pin-to-net membership entry as stored and serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakEntry {
    /// The member pin.
    pub pin: PinId,
    /// The net it joins.
    pub net: NetId,
    /// Whether the membership holds.
    pub connected: bool,
}

/// Pin-to-net membership relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WeakEntry>", into = "Vec<WeakEntry>")]
pub struct WeakConnections {
    entries: IndexMap<(PinId, NetId), bool>,
}

impl WeakConnections {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `pin` belongs to `net`.
    pub fn connect(&mut self, pin: PinId, net: NetId) {
        self.entries.insert((pin, net), true);
    }

    /// Stores an entry exactly as given.
    pub fn insert_entry(&mut self, pin: PinId, net: NetId, connected: bool) {
        self.entries.insert((pin, net), connected);
    }

    /// Returns `true` if `pin` is recorded as a member of `net`.
    pub fn is_member(&self, pin: &PinId, net: &NetId) -> bool {
        self.entries
            .get(&(pin.clone(), net.clone()))
            .copied()
            .unwrap_or(false)
    }

    /// Iterates every stored entry in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&PinId, &NetId, bool)> {
        self.entries.iter().map(|((p, n), &c)| (p, n, c))
    }

    /// Iterates the true memberships in insertion order.
    pub fn memberships(&self) -> impl Iterator<Item = (&PinId, &NetId)> {
        self.entries
            .iter()
            .filter(|&(_, &c)| c)
            .map(|((p, n), _)| (p, n))
    }

    /// Pins that are members of `net`, in insertion order.
    pub fn members_of<'a>(&'a self, net: &'a NetId) -> impl Iterator<Item = &'a PinId> + 'a {
        self.memberships()
            .filter(move |(_, n)| *n == net)
            .map(|(p, _)| p)
    }

    /// Nets that `pin` belongs to, in insertion order.
    pub fn nets_of<'a>(&'a self, pin: &'a PinId) -> impl Iterator<Item = &'a NetId> + 'a {
        self.memberships()
            .filter(move |(p, _)| *p == pin)
            .map(|(_, n)| n)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy holding only the entries whose pin is in `pins`.
    pub fn restricted_to(&self, pins: &HashSet<PinId>) -> WeakConnections {
        let entries = self
            .entries
            .iter()
            .filter(|((p, _), _)| pins.contains(p))
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        WeakConnections { entries }
    }
}

impl From<Vec<WeakEntry>> for WeakConnections {
    fn from(list: Vec<WeakEntry>) -> Self {
        let entries = list
            .into_iter()
            .map(|e| ((e.pin, e.net), e.connected))
            .collect();
        WeakConnections { entries }
    }
}

impl From<WeakConnections> for Vec<WeakEntry> {
    fn from(conns: WeakConnections) -> Self {
        conns
            .entries
            .into_iter()
            .map(|((pin, net), connected)| WeakEntry {
                pin,
                net,
                connected,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(s: &str) -> PinId {
        PinId::from(s)
    }

    #[test]
    fn connect_stores_both_orders() {
        let mut strong = StrongConnections::new();
        strong.connect(pin("A.p1"), pin("B.p1"));
        assert_eq!(strong.len(), 2);
        assert!(strong.contains_key(&pin("A.p1"), &pin("B.p1")));
        assert!(strong.contains_key(&pin("B.p1"), &pin("A.p1")));
        let pairs: Vec<_> = strong.pairs().collect();
        assert_eq!(pairs[0], (&pin("A.p1"), &pin("B.p1")));
        assert_eq!(pairs[1], (&pin("B.p1"), &pin("A.p1")));
    }

    #[test]
    fn either_order_is_authoritative() {
        let mut strong = StrongConnections::new();
        strong.insert_entry(pin("A.p1"), pin("B.p1"), true);
        assert!(strong.is_connected(&pin("B.p1"), &pin("A.p1")));
        assert!(!strong.is_connected(&pin("A.p1"), &pin("C.p1")));
    }

    #[test]
    fn false_entries_are_not_pairs() {
        let mut strong = StrongConnections::new();
        strong.insert_entry(pin("A.p1"), pin("B.p1"), false);
        assert!(!strong.any_connected());
        assert_eq!(strong.pairs().count(), 0);
        assert_eq!(strong.entries().count(), 1);
    }

    #[test]
    fn restriction_keeps_only_internal_entries() {
        let mut strong = StrongConnections::new();
        strong.connect(pin("A.p1"), pin("B.p1"));
        strong.connect(pin("A.p2"), pin("C.p1"));
        let pins: HashSet<PinId> = [pin("A.p1"), pin("B.p1"), pin("A.p2")].into();
        let restricted = strong.restricted_to(&pins);
        assert_eq!(restricted.len(), 2);
        assert!(restricted.is_connected(&pin("A.p1"), &pin("B.p1")));
        assert!(!restricted.is_connected(&pin("A.p2"), &pin("C.p1")));
    }

    #[test]
    fn net_membership_queries() {
        let mut weak = WeakConnections::new();
        weak.connect(pin("A.p1"), NetId::from("GND"));
        weak.connect(pin("B.p2"), NetId::from("GND"));
        weak.connect(pin("A.p1"), NetId::from("VCC"));
        let gnd = NetId::from("GND");
        let members: Vec<&str> = weak.members_of(&gnd).map(|p| p.as_str()).collect();
        assert_eq!(members, vec!["A.p1", "B.p2"]);
        let a = pin("A.p1");
        assert_eq!(weak.nets_of(&a).count(), 2);
        assert!(weak.is_member(&a, &NetId::from("VCC")));
    }

    #[test]
    fn serialized_as_entry_list() {
        let mut strong = StrongConnections::new();
        strong.connect(pin("A.p1"), pin("B.p1"));
        let json = serde_json::to_value(&strong).unwrap();
        assert_eq!(json.as_array().map(|a| a.len()), Some(2));
        let restored: StrongConnections = serde_json::from_value(json).unwrap();
        assert_eq!(restored, strong);
    }
}
