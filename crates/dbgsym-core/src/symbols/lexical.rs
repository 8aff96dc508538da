//! Lexical symbol constructors.
//!
//! Compilands, functions, blocks, variables, labels and the other code/data
//! occurrences that hang off the module root. None of these are types: they
//! get handles but never appear in the flat type list or the name index.

use tracing::trace;

use super::{
    BlockSymbol, CompilandSymbol, CustomSymbol, DataPayload, DataSymbol, FunctionSymbol, Location, Module,
    PointKind, PointSymbol, PublicSymbol, SymId, Symbol, ThunkSymbol,
};
use crate::error::{RegistryError, RegistryResult};
use crate::types::{Address, DataKind, SymTag, Variant};

impl Module
{
    /// Create a compilation unit under the module root.
    pub fn new_compiland(&mut self, name: &str, address: Address) -> RegistryResult<SymId>
    {
        let name = self.intern(name);
        trace!(compiland = %name, %address, "new compiland");
        let root = self.root();
        self.add_child(
            root,
            SymTag::Exe,
            Symbol::Compiland(CompilandSymbol {
                container: root,
                name,
                address,
                children: Vec::new(),
            }),
        )
    }

    /// Create a global (`is_static == false`) or file-static variable.
    ///
    /// Without a compiland the variable is attached to the module root.
    pub fn new_global_variable(
        &mut self,
        compiland: Option<SymId>,
        name: &str,
        is_static: bool,
        location: Location,
        data_type: Option<SymId>,
    ) -> RegistryResult<SymId>
    {
        let container = self.scope(compiland)?;
        self.check_type_ref(data_type)?;
        let kind = if is_static { DataKind::FileStatic } else { DataKind::Global };
        let name = self.intern(name);
        trace!(variable = %name, ?kind, ?location, "new global variable");
        self.add_child(
            container,
            SymTag::Compiland,
            Symbol::Data(DataSymbol {
                container,
                name: Some(name),
                data_type,
                payload: DataPayload::Variable { kind, location },
            }),
        )
    }

    /// Create a function.
    pub fn new_function(
        &mut self,
        compiland: Option<SymId>,
        name: &str,
        address: Address,
        size: u64,
        signature: Option<SymId>,
    ) -> RegistryResult<SymId>
    {
        let container = self.scope(compiland)?;
        self.check_signature(signature)?;
        let name = self.intern(name);
        trace!(function = %name, %address, size, "new function");
        self.add_child(
            container,
            SymTag::Compiland,
            Symbol::Function(FunctionSymbol {
                container,
                name,
                address,
                size,
                signature,
                children: Vec::new(),
            }),
        )
    }

    /// Create an inline site nested in a function, another inline site or a block.
    pub fn new_inline_site(
        &mut self,
        parent: SymId,
        name: &str,
        address: Address,
        size: u64,
        signature: Option<SymId>,
    ) -> RegistryResult<SymId>
    {
        self.expect_code_scope(parent, true)?;
        self.check_signature(signature)?;
        let name = self.intern(name);
        trace!(inline_site = %name, %address, size, "new inline site");
        self.add_child(
            parent,
            SymTag::Function,
            Symbol::InlineSite(FunctionSymbol {
                container: parent,
                name,
                address,
                size,
                signature,
                children: Vec::new(),
            }),
        )
    }

    /// Open a lexical block inside `function`, nested in `parent_block` when given.
    pub fn open_block(
        &mut self,
        function: SymId,
        parent_block: Option<SymId>,
        address: Address,
        size: u64,
    ) -> RegistryResult<SymId>
    {
        self.expect_code_scope(function, false)?;
        let container = self.block_scope(function, parent_block)?;
        trace!(%address, size, "open block");
        self.add_child(
            container,
            SymTag::Function,
            Symbol::Block(BlockSymbol {
                container,
                address,
                size,
                children: Vec::new(),
            }),
        )
    }

    /// Add a local, parameter or static local to a function (or one of its blocks).
    pub fn add_function_local(
        &mut self,
        function: SymId,
        block: Option<SymId>,
        kind: DataKind,
        location: Location,
        data_type: Option<SymId>,
        name: &str,
    ) -> RegistryResult<SymId>
    {
        if !matches!(kind, DataKind::Local | DataKind::Param | DataKind::StaticLocal) {
            return Err(RegistryError::InvalidDataKind(kind));
        }
        self.expect_code_scope(function, false)?;
        let container = self.block_scope(function, block)?;
        self.check_type_ref(data_type)?;
        let name = self.intern(name);
        trace!(local = %name, ?kind, ?location, "add function local");
        self.add_child(
            container,
            SymTag::Function,
            Symbol::Data(DataSymbol {
                container,
                name: Some(name),
                data_type,
                payload: DataPayload::Variable { kind, location },
            }),
        )
    }

    /// Add a label or debug start/end point `offset` bytes into `function`.
    pub fn add_function_point(
        &mut self,
        function: SymId,
        kind: PointKind,
        offset: u64,
        name: Option<&str>,
    ) -> RegistryResult<SymId>
    {
        self.expect_code_scope(function, false)?;
        let name = name.map(|name| self.intern(name));
        trace!(point = ?kind, offset, "add function point");
        self.add_child(
            function,
            SymTag::Function,
            Symbol::Point(PointSymbol {
                kind,
                parent: function,
                name,
                offset,
            }),
        )
    }

    /// Create a public (exported or linker-visible) symbol.
    pub fn new_public(
        &mut self,
        compiland: Option<SymId>,
        name: &str,
        is_function: bool,
        address: Address,
        size: u64,
    ) -> RegistryResult<SymId>
    {
        let container = self.scope(compiland)?;
        let name = self.intern(name);
        trace!(public = %name, %address, is_function, "new public symbol");
        self.add_child(
            container,
            SymTag::Compiland,
            Symbol::Public(PublicSymbol {
                container,
                name,
                address,
                size,
                is_function,
            }),
        )
    }

    pub fn new_thunk(
        &mut self,
        compiland: Option<SymId>,
        name: &str,
        ordinal: u32,
        address: Address,
        size: u64,
    ) -> RegistryResult<SymId>
    {
        let container = self.scope(compiland)?;
        let name = self.intern(name);
        trace!(thunk = %name, %address, ordinal, "new thunk");
        self.add_child(
            container,
            SymTag::Compiland,
            Symbol::Thunk(ThunkSymbol {
                container,
                name,
                address,
                size,
                ordinal,
            }),
        )
    }

    /// Create a named constant whose value is stored inline.
    pub fn new_constant(
        &mut self,
        compiland: Option<SymId>,
        name: &str,
        data_type: Option<SymId>,
        value: Variant,
    ) -> RegistryResult<SymId>
    {
        let container = self.scope(compiland)?;
        self.check_type_ref(data_type)?;
        let name = self.intern(name);
        trace!(constant = %name, %value, "new constant");
        self.add_child(
            container,
            SymTag::Compiland,
            Symbol::Data(DataSymbol {
                container,
                name: Some(name),
                data_type,
                payload: DataPayload::Constant(value),
            }),
        )
    }

    /// Create a module-level custom symbol.
    pub fn new_custom(&mut self, name: &str, address: Address, size: u64) -> RegistryResult<SymId>
    {
        let name = self.intern(name);
        let root = self.root();
        self.add_child(
            root,
            SymTag::Exe,
            Symbol::Custom(CustomSymbol {
                container: root,
                name,
                address,
                size,
            }),
        )
    }

    fn scope(&self, compiland: Option<SymId>) -> RegistryResult<SymId>
    {
        match compiland {
            Some(compiland) => {
                self.expect_tag(compiland, SymTag::Compiland)?;
                Ok(compiland)
            }
            None => Ok(self.root()),
        }
    }

    fn expect_code_scope(&self, id: SymId, allow_block: bool) -> RegistryResult<()>
    {
        match self.tag_of(id)? {
            SymTag::Function | SymTag::InlineSite => Ok(()),
            SymTag::Block if allow_block => Ok(()),
            found => Err(RegistryError::UnexpectedTag {
                expected: SymTag::Function,
                found,
            }),
        }
    }

    /// `block` when it is nested (through blocks and inline sites) in
    /// `function`, `function` itself when no block is given.
    fn block_scope(&self, function: SymId, block: Option<SymId>) -> RegistryResult<SymId>
    {
        let Some(block) = block else {
            return Ok(function);
        };
        self.expect_tag(block, SymTag::Block)?;

        let mut current = block;
        while let Some(parent) = self.symbol(current)?.lexical_parent() {
            if parent == function {
                return Ok(block);
            }
            match self.tag_of(parent)? {
                SymTag::Block | SymTag::InlineSite => current = parent,
                _ => break,
            }
        }
        Err(RegistryError::ScopeMismatch {
            block: block.handle().raw(),
            function: function.handle().raw(),
        })
    }

    fn check_signature(&self, signature: Option<SymId>) -> RegistryResult<()>
    {
        signature.map_or(Ok(()), |signature| self.expect_tag(signature, SymTag::FunctionType))
    }

    fn check_type_ref(&self, data_type: Option<SymId>) -> RegistryResult<()>
    {
        data_type.map_or(Ok(()), |data_type| self.expect_type(data_type))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::BasicType;

    fn module() -> Module
    {
        Module::with_defaults("app.exe", 0x40_0000)
    }

    #[test]
    fn test_compiland_hangs_off_root()
    {
        let mut module = module();
        let unit = module.new_compiland("main.c", Address::new(0x1000)).unwrap();
        let root = module.symbol(module.root()).unwrap();
        assert_eq!(root.children(), Some(&[unit][..]));
        assert_eq!(module.symbol(unit).unwrap().lexical_parent(), Some(module.root()));
    }

    #[test]
    fn test_lexical_symbols_are_not_types()
    {
        let mut module = module();
        let unit = module.new_compiland("main.c", Address::ZERO).unwrap();
        let function = module
            .new_function(Some(unit), "main", Address::new(0x1000), 0x40, None)
            .unwrap();
        module.open_block(function, None, Address::new(0x1010), 0x10).unwrap();
        module
            .new_global_variable(Some(unit), "counter", false, Location::Absolute(0x3000), None)
            .unwrap();

        assert!(module.types().is_empty());
        assert!(module.named("main").is_empty());
    }

    #[test]
    fn test_nested_blocks_and_locals()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let function = module.new_function(None, "f", Address::new(0x2000), 0x80, None).unwrap();
        let outer = module.open_block(function, None, Address::new(0x2008), 0x40).unwrap();
        let inner = module.open_block(function, Some(outer), Address::new(0x2010), 0x10).unwrap();
        let local = module
            .add_function_local(
                function,
                Some(inner),
                DataKind::Local,
                Location::RegisterRelative { register: 6, offset: -8 },
                Some(int),
                "i",
            )
            .unwrap();

        assert_eq!(module.symbol(inner).unwrap().lexical_parent(), Some(outer));
        assert_eq!(module.symbol(local).unwrap().lexical_parent(), Some(inner));
        assert_eq!(module.symbol(outer).unwrap().children(), Some(&[inner][..]));
    }

    #[test]
    fn test_block_of_another_function_is_rejected()
    {
        let mut module = module();
        let first = module.new_function(None, "first", Address::new(0x1000), 0x40, None).unwrap();
        let second = module.new_function(None, "second", Address::new(0x2000), 0x40, None).unwrap();
        let block = module.open_block(first, None, Address::new(0x1008), 0x10).unwrap();
        let mismatch = RegistryError::ScopeMismatch {
            block: block.handle().raw(),
            function: second.handle().raw(),
        };

        assert_eq!(
            module.open_block(second, Some(block), Address::new(0x2008), 0x8),
            Err(mismatch.clone())
        );
        assert_eq!(
            module.add_function_local(second, Some(block), DataKind::Local, Location::Unavailable, None, "x"),
            Err(mismatch)
        );
        assert_eq!(module.symbol(block).unwrap().children(), Some(&[][..]));
        assert_eq!(module.symbol(second).unwrap().children(), Some(&[][..]));
    }

    #[test]
    fn test_block_inside_inline_site_belongs_to_outer_function()
    {
        let mut module = module();
        let outer = module.new_function(None, "outer", Address::new(0x100), 0x100, None).unwrap();
        let site = module.new_inline_site(outer, "helper", Address::new(0x120), 0x20, None).unwrap();
        let inner = module.open_block(site, None, Address::new(0x124), 0x8).unwrap();

        let nested = module.open_block(outer, Some(inner), Address::new(0x126), 0x2).unwrap();
        assert_eq!(module.symbol(nested).unwrap().lexical_parent(), Some(inner));
    }

    #[test]
    fn test_variable_type_must_be_a_type()
    {
        let mut module = module();
        let function = module.new_function(None, "f", Address::ZERO, 1, None).unwrap();
        assert_eq!(
            module.new_global_variable(None, "g", false, Location::Absolute(0), Some(function)),
            Err(RegistryError::NotAType(SymTag::Function))
        );
    }

    #[test]
    fn test_local_requires_function_scoped_kind()
    {
        let mut module = module();
        let function = module.new_function(None, "f", Address::ZERO, 1, None).unwrap();
        assert_eq!(
            module.add_function_local(function, None, DataKind::Global, Location::Unavailable, None, "g"),
            Err(RegistryError::InvalidDataKind(DataKind::Global))
        );
    }

    #[test]
    fn test_points_require_a_function()
    {
        let mut module = module();
        let unit = module.new_compiland("a.c", Address::ZERO).unwrap();
        assert_eq!(
            module.add_function_point(unit, PointKind::Label, 4, Some("out")),
            Err(RegistryError::UnexpectedTag {
                expected: SymTag::Function,
                found: SymTag::Compiland,
            })
        );
    }

    #[test]
    fn test_inline_site_inside_block()
    {
        let mut module = module();
        let function = module.new_function(None, "outer", Address::new(0x100), 0x100, None).unwrap();
        let block = module.open_block(function, None, Address::new(0x110), 0x20).unwrap();
        let site = module
            .new_inline_site(block, "inlined", Address::new(0x118), 8, None)
            .unwrap();
        assert_eq!(module.tag_of(site), Ok(SymTag::InlineSite));
        assert_eq!(module.symbol(site).unwrap().lexical_parent(), Some(block));
    }

    #[test]
    fn test_signature_must_be_function_type()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        assert!(matches!(
            module.new_function(None, "f", Address::ZERO, 1, Some(int)),
            Err(RegistryError::UnexpectedTag { expected: SymTag::FunctionType, .. })
        ));
    }
}
