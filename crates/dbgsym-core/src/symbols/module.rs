//! # Module registry
//!
//! Storage for one loaded module's debug information: the node arena, interned
//! names, the name index used by type lookup, and the flat list of type nodes in
//! creation order.
//!
//! ## Thread Safety
//!
//! `Module` does no locking. Concurrent readers are fine (`&Module`); building
//! requires `&mut Module`, so a module shared between threads must be wrapped by
//! the caller (the engine keeps all modules behind one mutex).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use super::{ExeSymbol, LocationResolver, ModuleTag, Name, SymId, Symbol};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::types::SymTag;

/// Type and symbol registry of one module.
pub struct Module
{
    tag: ModuleTag,
    base: u64,
    config: RegistryConfig,
    symbols: Vec<Symbol>,
    /// Type nodes in creation order; drives enumeration.
    types: Vec<SymId>,
    /// Named type nodes, chained per name in creation order.
    names: HashMap<Name, SmallVec<[SymId; 2]>>,
    strings: HashSet<Name>,
    resolver: Option<Arc<dyn LocationResolver>>,
    root: SymId,
}

impl Module
{
    /// Create an empty registry for the module loaded at `base`.
    ///
    /// The module root (`SymTagExe`, named `name`) is allocated immediately and
    /// always receives handle 1.
    #[must_use]
    pub fn new(name: &str, base: u64, config: RegistryConfig) -> Self
    {
        let tag = ModuleTag::next();
        let root = SymId::new(tag, 0);
        let mut module = Self {
            tag,
            base,
            config,
            symbols: Vec::new(),
            types: Vec::new(),
            names: HashMap::new(),
            strings: HashSet::new(),
            resolver: None,
            root,
        };
        let name = module.intern(name);
        module.symbols.push(Symbol::Exe(ExeSymbol {
            name,
            children: Vec::new(),
        }));
        debug!(module = %module.root_name(), base = format_args!("{base:#x}"), "created module registry");
        module
    }

    /// Registry with default limits.
    #[must_use]
    pub fn with_defaults(name: &str, base: u64) -> Self
    {
        Self::new(name, base, RegistryConfig::default())
    }

    /// Base address the module is loaded at.
    #[must_use]
    pub fn base(&self) -> u64
    {
        self.base
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig
    {
        &self.config
    }

    #[must_use]
    pub fn tag(&self) -> ModuleTag
    {
        self.tag
    }

    /// The module root node.
    #[must_use]
    pub fn root(&self) -> SymId
    {
        self.root
    }

    fn root_name(&self) -> &str
    {
        self.symbols.first().and_then(Symbol::name).unwrap_or_default()
    }

    /// Number of nodes allocated so far (root included).
    #[must_use]
    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    /// Always false: the root exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    /// Type nodes in creation order.
    #[must_use]
    pub fn types(&self) -> &[SymId]
    {
        &self.types
    }

    /// Install the resolver used for deferred variable locations.
    pub fn set_location_resolver(&mut self, resolver: impl LocationResolver + 'static)
    {
        self.resolver = Some(Arc::new(resolver));
    }

    pub(crate) fn location_resolver(&self) -> Option<&Arc<dyn LocationResolver>>
    {
        self.resolver.as_ref()
    }

    /// Look up a node of this module.
    pub fn symbol(&self, id: SymId) -> RegistryResult<&Symbol>
    {
        self.check_owner(id)?;
        self.symbols.get(id.index()).ok_or(RegistryError::InvalidHandle(id.handle().raw()))
    }

    pub(crate) fn symbol_mut(&mut self, id: SymId) -> RegistryResult<&mut Symbol>
    {
        self.check_owner(id)?;
        self.symbols
            .get_mut(id.index())
            .ok_or(RegistryError::InvalidHandle(id.handle().raw()))
    }

    /// Tag of a node of this module.
    pub fn tag_of(&self, id: SymId) -> RegistryResult<SymTag>
    {
        self.symbol(id).map(Symbol::tag)
    }

    pub(crate) fn check_owner(&self, id: SymId) -> RegistryResult<()>
    {
        if id.module() == self.tag {
            Ok(())
        } else {
            Err(RegistryError::ForeignSymbol)
        }
    }

    /// Fail unless `id` belongs to this module and carries `expected`.
    pub(crate) fn expect_tag(&self, id: SymId, expected: SymTag) -> RegistryResult<()>
    {
        let found = self.tag_of(id)?;
        if found == expected {
            Ok(())
        } else {
            Err(RegistryError::UnexpectedTag { expected, found })
        }
    }

    /// Fail unless `id` belongs to this module and is a type node.
    pub(crate) fn expect_type(&self, id: SymId) -> RegistryResult<()>
    {
        let symbol = self.symbol(id)?;
        if symbol.is_type() {
            Ok(())
        } else {
            Err(RegistryError::NotAType(symbol.tag()))
        }
    }

    /// Intern `name` in the module's string pool.
    pub(crate) fn intern(&mut self, name: &str) -> Name
    {
        if let Some(existing) = self.strings.get(name) {
            return existing.clone();
        }
        let interned: Name = Arc::from(name);
        self.strings.insert(interned.clone());
        interned
    }

    pub(crate) fn exhausted(&self) -> RegistryError
    {
        RegistryError::ArenaExhausted {
            limit: self.config.symbol_limit,
        }
    }

    /// Allocate a node in the arena.
    pub(crate) fn alloc(&mut self, symbol: Symbol) -> RegistryResult<SymId>
    {
        if self.symbols.len() >= self.config.symbol_limit {
            return Err(self.exhausted());
        }
        let index = u32::try_from(self.symbols.len()).map_err(|_| self.exhausted())?;
        self.symbols.try_reserve(1).map_err(|_| self.exhausted())?;
        self.symbols.push(symbol);
        Ok(SymId::new(self.tag, index))
    }

    /// Allocate a type node and register it in the flat type list and, when
    /// named, in the name index.
    pub(crate) fn add_type(&mut self, symbol: Symbol) -> RegistryResult<SymId>
    {
        self.types.try_reserve(1).map_err(|_| self.exhausted())?;
        let name = symbol.name_ref().cloned();
        let id = self.alloc(symbol)?;
        self.types.push(id);
        if let Some(name) = name {
            self.names.entry(name).or_default().push(id);
        }
        Ok(id)
    }

    /// Allocate `symbol` and append it to `parent`'s child list.
    ///
    /// `expected` is the parent kind reported when `parent` cannot hold
    /// children. The child slot is reserved before the node is allocated, so a
    /// failure leaves the parent's list exactly as it was.
    pub(crate) fn add_child(&mut self, parent: SymId, expected: SymTag, symbol: Symbol) -> RegistryResult<SymId>
    {
        let exhausted = self.exhausted();
        let found = self.tag_of(parent)?;
        let children = self
            .symbol_mut(parent)?
            .children_mut()
            .ok_or(RegistryError::UnexpectedTag { expected, found })?;
        children.try_reserve(1).map_err(|_| exhausted)?;
        let id = self.alloc(symbol)?;
        if let Some(children) = self.symbol_mut(parent)?.children_mut() {
            children.push(id);
        }
        Ok(id)
    }

    /// Same-named type nodes, in creation order.
    pub(crate) fn named(&self, name: &str) -> &[SymId]
    {
        self.names.get(name).map_or(&[], |chain| chain.as_slice())
    }
}

impl fmt::Debug for Module
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Module")
            .field("name", &self.root_name())
            .field("base", &format_args!("{:#x}", self.base))
            .field("symbols", &self.symbols.len())
            .field("types", &self.types.len())
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}
