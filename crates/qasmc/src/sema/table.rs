//! Symbol table
//!
//! Symbols live in an arena owned by the table and are never removed from
//! it. Lookups go through kind-oriented subtables, each a multimap from
//! interned name to the ids filed under that name (oldest first). Erasing a
//! binding only unfiles it; the arena slot and the declaration history keep
//! it reachable for diagnostics.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::ops::Index;

use string_interner::DefaultStringInterner;
use thiserror::Error;
use tracing::{debug, trace};

use super::context::{ContextId, ContextTree};
use super::symbol::{IndexKey, Name, Symbol, SymbolId, SymbolScope};
use super::value::ValueId;
use crate::types::SymbolKind;

/// Kind-oriented partition of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtable {
    /// Catch-all: references, pragmas, synthesized names
    Generic,
    Global,
    Local,
    Calibration,
    Gate,
    GateParam,
    Qubit,
    Defcal,
    DefcalGroup,
    Angle,
    Function,
    Undefined,
}

impl Subtable {
    pub const COUNT: usize = 12;

    /// Lookup priority when no ambient state says otherwise
    pub const DEFAULT_ORDER: [Subtable; Subtable::COUNT] = [
        Subtable::Local,
        Subtable::GateParam,
        Subtable::Gate,
        Subtable::Qubit,
        Subtable::Function,
        Subtable::Defcal,
        Subtable::DefcalGroup,
        Subtable::Global,
        Subtable::Angle,
        Subtable::Calibration,
        Subtable::Undefined,
        Subtable::Generic,
    ];

    fn slot(self) -> usize {
        match self {
            Subtable::Generic => 0,
            Subtable::Global => 1,
            Subtable::Local => 2,
            Subtable::Calibration => 3,
            Subtable::Gate => 4,
            Subtable::GateParam => 5,
            Subtable::Qubit => 6,
            Subtable::Defcal => 7,
            Subtable::DefcalGroup => 8,
            Subtable::Angle => 9,
            Subtable::Function => 10,
            Subtable::Undefined => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Subtable::Generic => "generic",
            Subtable::Global => "global",
            Subtable::Local => "local",
            Subtable::Calibration => "calibration",
            Subtable::Gate => "gate",
            Subtable::GateParam => "gate-param",
            Subtable::Qubit => "qubit",
            Subtable::Defcal => "defcal",
            Subtable::DefcalGroup => "defcal-group",
            Subtable::Angle => "angle",
            Subtable::Function => "function",
            Subtable::Undefined => "undefined",
        }
    }

    /// Subtable a fresh, non-reference binding is filed in
    pub fn for_kind(kind: SymbolKind, context: ContextId, scope: SymbolScope) -> Subtable {
        if kind.is_gate() {
            return Subtable::Gate;
        }
        if kind.is_defcal() {
            return Subtable::Defcal;
        }
        if kind.is_callable() {
            return Subtable::Function;
        }
        match kind {
            SymbolKind::DefcalGroup => return Subtable::DefcalGroup,
            SymbolKind::GateQubitParam => return Subtable::GateParam,
            SymbolKind::Undefined => return Subtable::Undefined,
            SymbolKind::Pragma
            | SymbolKind::BinaryOp
            | SymbolKind::UnaryOp
            | SymbolKind::TimeUnit => return Subtable::Generic,
            _ => {}
        }
        if context == ContextId::CALIBRATION {
            return Subtable::Calibration;
        }
        if kind.is_qubit() {
            return Subtable::Qubit;
        }
        match (kind, scope) {
            (SymbolKind::Angle, SymbolScope::Global) => Subtable::Angle,
            (_, SymbolScope::Global) => Subtable::Global,
            (_, SymbolScope::Local) => Subtable::Local,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("symbol '{name}' already defined in this context")]
    Duplicate { name: String, existing: SymbolId },

    #[error("symbol {0} is not filed in any subtable")]
    NotFiled(SymbolId),

    #[error("symbol {0} is still reachable from a live symbol")]
    Reachable(SymbolId),

    #[error("symbol {0} belongs to a live context")]
    ContextAlive(SymbolId),
}

/// Outcome of disambiguating several same-named candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub symbol: SymbolId,
    /// Several unrelated contexts competed and the most recent one won
    pub ambiguous: bool,
}

type NameMap = HashMap<Name, Vec<SymbolId>>;

pub struct SymbolTable {
    names: DefaultStringInterner,
    arena: Vec<Symbol>,
    tables: Vec<NameMap>,
    history: NameMap,
    groups: HashMap<SymbolId, Vec<SymbolId>>,
    /// Filed symbols per owning context, in creation order
    owned: HashMap<ContextId, Vec<SymbolId>>,
    /// Symbols naming the key as predecessor or reference base
    referrers: HashMap<SymbolId, Vec<SymbolId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            names: DefaultStringInterner::default(),
            arena: Vec::new(),
            tables: (0..Subtable::COUNT).map(|_| HashMap::new()).collect(),
            history: HashMap::new(),
            groups: HashMap::new(),
            owned: HashMap::new(),
            referrers: HashMap::new(),
        }
    }

    // ==================== Names ====================

    pub fn intern(&mut self, name: &str) -> Name {
        self.names.get_or_intern(name)
    }

    /// Interned handle for `name` if it was ever seen
    pub fn find_name(&self, name: &str) -> Option<Name> {
        self.names.get(name)
    }

    pub fn resolve(&self, name: Name) -> &str {
        self.names.resolve(name).unwrap_or("<unnamed>")
    }

    pub fn name_of(&self, id: SymbolId) -> &str {
        self.resolve(self[id].name())
    }

    // ==================== Arena ====================

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.arena.get(id.index())
    }

    /// Total symbols ever created, filed or not
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.arena
            .iter()
            .enumerate()
            .map(|(ix, sym)| (SymbolId::from_index(ix), sym))
    }

    fn map(&self, subtable: Subtable) -> &NameMap {
        &self.tables[subtable.slot()]
    }

    fn map_mut(&mut self, subtable: Subtable) -> &mut NameMap {
        &mut self.tables[subtable.slot()]
    }

    // ==================== Insertion ====================

    /// Create and file a binding in the subtable its kind belongs to
    pub fn insert(
        &mut self,
        name: &str,
        bits: u32,
        kind: SymbolKind,
        context: ContextId,
        scope: SymbolScope,
    ) -> Result<SymbolId, TableError> {
        let name = self.intern(name);
        let subtable = Subtable::for_kind(kind, context, scope);
        self.add(Symbol::new(name, kind, bits, context, scope), subtable)
    }

    /// File a prepared symbol.
    ///
    /// Fails if a non-reference symbol with the same name, width and kind
    /// is already filed for the same context. Overloadable kinds skip the
    /// check.
    pub fn add(&mut self, symbol: Symbol, subtable: Subtable) -> Result<SymbolId, TableError> {
        if !symbol.is_reference() && !symbol.kind().is_overloadable() {
            if let Some(existing) = self.find_exact_in_context(
                symbol.name(),
                symbol.bits(),
                symbol.kind(),
                symbol.context(),
            ) {
                return Err(TableError::Duplicate {
                    name: self.resolve(symbol.name()).to_string(),
                    existing,
                });
            }
        }

        let id = SymbolId::from_index(self.arena.len());
        let name = symbol.name();
        symbol.set_home(Some(subtable));
        if let Some(reference) = symbol.reference() {
            if let Some(base) = self.arena.get(reference.base.index()) {
                base.add_reference(reference.index.clone(), id);
            }
            self.referrers.entry(reference.base).or_default().push(id);
        } else {
            self.history.entry(name).or_default().push(id);
        }
        if let Some(previous) = symbol.predecessor() {
            self.referrers.entry(previous).or_default().push(id);
        }
        self.owned.entry(symbol.context()).or_default().push(id);
        debug!(
            symbol = %id,
            name = self.resolve(name),
            kind = %symbol.kind(),
            bits = symbol.bits(),
            context = %symbol.context(),
            table = subtable.name(),
            "insert"
        );
        self.arena.push(symbol);
        self.map_mut(subtable).entry(name).or_default().push(id);
        Ok(id)
    }

    fn find_exact_in_context(
        &self,
        name: Name,
        bits: u32,
        kind: SymbolKind,
        context: ContextId,
    ) -> Option<SymbolId> {
        self.tables
            .iter()
            .filter_map(|map| map.get(&name))
            .flatten()
            .copied()
            .find(|id| {
                let sym = &self[*id];
                !sym.is_reference()
                    && sym.bits() == bits
                    && sym.kind() == kind
                    && sym.context() == context
            })
    }

    /// Record `member` as an overload owned by a defcal group
    pub fn add_group_member(&mut self, group: SymbolId, member: SymbolId) {
        self.groups.entry(group).or_default().push(member);
    }

    pub fn group_members(&self, group: SymbolId) -> &[SymbolId] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    // ==================== Lookup ====================

    /// Exact match on name, width and kind, in any context. Scope-aware
    /// callers go through [`lookup_exact`](Self::lookup_exact) instead.
    pub fn lookup(&self, name: &str, bits: u32, kind: SymbolKind) -> Option<SymbolId> {
        self.lookup_exact(name, bits, kind).first().copied()
    }

    /// Every filed binding matching name, width and kind, newest first
    /// within each subtable of the default order
    pub fn lookup_exact(&self, name: &str, bits: u32, kind: SymbolKind) -> Vec<SymbolId> {
        let mut found = self.lookup_range(name);
        found.retain(|id| self[*id].bits() == bits && self[*id].kind() == kind);
        found
    }

    /// Most recent binding of `name` in one subtable
    pub fn lookup_in(&self, name: &str, subtable: Subtable) -> Option<SymbolId> {
        let name = self.find_name(name)?;
        self.map(subtable).get(&name)?.last().copied()
    }

    /// Name-only lookup: most recent binding in the first subtable that
    /// has one
    pub fn lookup_any(&self, name: &str) -> Option<SymbolId> {
        Subtable::DEFAULT_ORDER
            .iter()
            .find_map(|t| self.lookup_in(name, *t))
    }

    /// Every binding of `name`, in default subtable priority
    pub fn lookup_range(&self, name: &str) -> Vec<SymbolId> {
        self.lookup_range_ordered(name, &Subtable::DEFAULT_ORDER)
    }

    /// Every binding of `name` across `order`, newest first within each
    /// subtable. Subtables missing from `order` are not searched.
    pub fn lookup_range_ordered(&self, name: &str, order: &[Subtable]) -> Vec<SymbolId> {
        let Some(name) = self.find_name(name) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for subtable in order {
            let Some(ids) = self.map(*subtable).get(&name) else {
                continue;
            };
            for id in ids.iter().rev() {
                if seen.insert(*id) {
                    found.push(*id);
                }
            }
        }
        trace!(name = self.resolve(name), candidates = found.len(), "lookup range");
        found
    }

    /// Pick one binding among same-named candidates.
    ///
    /// Candidates owned by the current context win, then those owned by the
    /// nearest ancestor. The calibration context counts as an ancestor just
    /// below global while `calibration_visible` is set. Among the remaining
    /// live candidates, the one from the most recently created context wins,
    /// and the pick is flagged ambiguous if more than one context competed.
    /// If every candidate's context is dead the newest candidate is returned
    /// so the caller can report it out of scope.
    pub fn select(
        &self,
        candidates: &[SymbolId],
        tree: &ContextTree,
        calibration_visible: bool,
    ) -> Option<Selection> {
        let newest = candidates.iter().max().copied()?;
        let live: Vec<SymbolId> = candidates
            .iter()
            .copied()
            .filter(|id| tree.is_alive(self[*id].context()))
            .collect();
        if live.is_empty() {
            return Some(Selection {
                symbol: newest,
                ambiguous: false,
            });
        }

        let mut chain: Vec<ContextId> = tree.ancestors(tree.current()).collect();
        if calibration_visible && !chain.contains(&ContextId::CALIBRATION) {
            let at = chain.len().saturating_sub(1);
            chain.insert(at, ContextId::CALIBRATION);
        }
        for ctx in chain {
            if let Some(id) = live.iter().find(|id| self[**id].context() == ctx) {
                return Some(Selection {
                    symbol: *id,
                    ambiguous: false,
                });
            }
        }

        let mut contexts: Vec<ContextId> = live.iter().map(|id| self[*id].context()).collect();
        contexts.sort_unstable();
        contexts.dedup();
        let latest = contexts.last().copied()?;
        let symbol = live
            .iter()
            .copied()
            .find(|id| self[*id].context() == latest)?;
        Some(Selection {
            symbol,
            ambiguous: contexts.len() > 1,
        })
    }

    // ==================== History ====================

    /// Every non-reference binding ever created under `name`, oldest first,
    /// including erased and shadowed ones
    pub fn history(&self, name: &str) -> &[SymbolId] {
        self.find_name(name)
            .and_then(|n| self.history.get(&n))
            .map_or(&[], Vec::as_slice)
    }

    pub fn history_of(&self, id: SymbolId) -> &[SymbolId] {
        self.history
            .get(&self[id].name())
            .map_or(&[], Vec::as_slice)
    }

    // ==================== Values ====================

    /// Attached value, resolved through reference chains to the base
    pub fn value_of(&self, id: SymbolId) -> Option<ValueId> {
        let base = self.base_of(id);
        self[base].own_value()
    }

    /// Attach a value. Values live on the base symbol, so attaching through
    /// a reference updates what every view of the base sees.
    pub fn set_value(&self, id: SymbolId, value: ValueId) {
        let base = self.base_of(id);
        self[base].set_value(Some(value));
    }

    /// Follow reference links down to the non-reference symbol
    pub fn base_of(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        while let Some(reference) = self[current].reference() {
            current = reference.base;
        }
        current
    }

    // ==================== Re-filing and erasure ====================

    /// Move a symbol to another subtable without changing its identity
    pub fn transfer(&mut self, id: SymbolId, to: Subtable) -> Result<(), TableError> {
        let from = self[id].home().ok_or(TableError::NotFiled(id))?;
        if from == to {
            return Ok(());
        }
        let name = self[id].name();
        self.unfile(id, from, name);
        self.map_mut(to).entry(name).or_default().push(id);
        self[id].set_home(Some(to));
        debug!(symbol = %id, from = from.name(), to = to.name(), "transfer");
        Ok(())
    }

    fn unfile(&mut self, id: SymbolId, from: Subtable, name: Name) {
        let map = self.map_mut(from);
        if let Some(ids) = map.get_mut(&name) {
            ids.retain(|x| *x != id);
            if ids.is_empty() {
                map.remove(&name);
            }
        }
    }

    /// Whether a live symbol still points at `id` as predecessor or base
    pub fn is_reachable(&self, id: SymbolId, tree: &ContextTree) -> bool {
        self.referrers.get(&id).is_some_and(|ids| {
            ids.iter().any(|r| {
                let sym = &self[*r];
                sym.home().is_some() && tree.is_alive(sym.context())
            })
        })
    }

    fn check_reclaimable(&self, id: SymbolId, tree: &ContextTree) -> Result<(), TableError> {
        let sym = &self[id];
        if sym.home().is_none() {
            return Err(TableError::NotFiled(id));
        }
        if sym.is_builtin() || tree.is_alive(sym.context()) {
            return Err(TableError::ContextAlive(id));
        }
        if self.is_reachable(id, tree) {
            return Err(TableError::Reachable(id));
        }
        Ok(())
    }

    /// Remove the most recent local binding of (name, bits, kind) whose
    /// owning context is dead and which nothing live still refers to.
    ///
    /// Returns `Ok(None)` if no such binding is filed at all.
    pub fn erase_local(
        &mut self,
        name: &str,
        bits: u32,
        kind: SymbolKind,
        tree: &ContextTree,
    ) -> Result<Option<SymbolId>, TableError> {
        let matching: Vec<SymbolId> = self
            .lookup_range(name)
            .into_iter()
            .filter(|id| {
                let sym = &self[*id];
                sym.bits() == bits && sym.kind() == kind && sym.scope() == SymbolScope::Local
            })
            .collect();
        let Some(first) = matching.first().copied() else {
            return Ok(None);
        };
        let Some(id) = matching
            .iter()
            .copied()
            .find(|id| self.check_reclaimable(*id, tree).is_ok())
        else {
            let reason = self.check_reclaimable(first, tree).err();
            return Err(reason.unwrap_or(TableError::NotFiled(first)));
        };
        self.erase(id);
        Ok(Some(id))
    }

    /// Unfile every reclaimable symbol owned by a dead context.
    ///
    /// Only the symbols the context owns are visited. References go first
    /// so their bases become unreachable. A symbol of an older dead context
    /// that was kept alive only by a released one is released with it.
    pub fn release_context(&mut self, context: ContextId, tree: &ContextTree) -> Vec<SymbolId> {
        let Some(mut owned) = self.owned.remove(&context) else {
            return Vec::new();
        };
        owned.retain(|id| self[*id].home().is_some());
        owned.sort_by_key(|id| (!self[*id].is_reference(), std::cmp::Reverse(*id)));

        let mut released = Vec::new();
        let mut pending = owned.clone();
        pending.reverse();
        while let Some(id) = pending.pop() {
            if self[id].home().is_none() || self.check_reclaimable(id, tree).is_err() {
                continue;
            }
            self.erase(id);
            released.push(id);
            let sym = &self[id];
            let targets = sym.predecessor().into_iter().chain(sym.reference().map(|r| r.base));
            pending.extend(targets.filter(|t| self[*t].context() != context));
        }

        owned.retain(|id| self[*id].home().is_some());
        if !owned.is_empty() {
            self.owned.insert(context, owned);
        }
        if !released.is_empty() {
            debug!(context = %context, count = released.len(), "release context");
        }
        released
    }

    fn erase(&mut self, id: SymbolId) {
        let Some(home) = self[id].home() else {
            return;
        };
        for (_, reference) in self[id].references() {
            self.erase(reference);
        }
        let name = self[id].name();
        self.unfile(id, home, name);
        self[id].set_home(None);
        if let Some(reference) = self[id].reference().cloned() {
            self[reference.base].remove_reference(&reference.index);
        }
        trace!(symbol = %id, "erase");
    }

    // ==================== Inspection ====================

    /// Filed symbols in one subtable, in creation order
    pub fn entries(&self, subtable: Subtable) -> Vec<SymbolId> {
        let mut ids: Vec<SymbolId> = self.map(subtable).values().flatten().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_filed_in(&self, id: SymbolId, subtable: Subtable) -> bool {
        self.get(id).is_some_and(|s| s.home() == Some(subtable))
    }

    /// Deterministic listing of every filed symbol
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (id, sym) in self.iter() {
            let Some(home) = sym.home() else {
                continue;
            };
            let _ = write!(
                out,
                "{:>5} {:<16} {:<20} {:>5} {:<12} {:<6} {}",
                id.to_string(),
                self.resolve(sym.name()),
                sym.kind().name(),
                sym.bits(),
                sym.context().to_string(),
                sym.scope().to_string(),
                home.name(),
            );
            if let Some(previous) = sym.predecessor() {
                let _ = write!(out, " shadows={}", previous);
            }
            if let Some(reference) = sym.reference() {
                let _ = write!(out, " base={}", reference.base);
            }
            if let Some(value) = self.value_of(id) {
                let _ = write!(out, " value={}", value);
            }
            out.push('\n');
        }
        out
    }

    /// Key for the reference symbol of `base[index]`
    pub fn indexed_name(&self, base: SymbolId, index: &IndexKey) -> String {
        format!("{}[{}]", self.name_of(base), index)
    }
}

impl Index<SymbolId> for SymbolTable {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.arena[id.index()]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
