//! Name resolution.

use tracing::debug;

use super::{Module, SymId};
use crate::error::{set_last_error, LastError, RegistryError, RegistryResult};
use crate::types::SymTag;

impl Module
{
    /// First type named `name` (in creation order) whose tag matches `filter`.
    ///
    /// `None` accepts any tag. A miss is an ordinary outcome: it returns
    /// [`RegistryError::NameNotFound`] and sets the thread's last error to
    /// `ERROR_INVALID_NAME`.
    pub fn find_type_by_name(&self, name: &str, filter: Option<SymTag>) -> RegistryResult<SymId>
    {
        let found = self
            .named(name)
            .iter()
            .copied()
            .find(|&id| filter.is_none_or(|wanted| self.tag_of(id) == Ok(wanted)));

        match found {
            Some(id) => Ok(id),
            None => {
                debug!(name, filter = ?filter, "type lookup missed");
                set_last_error(LastError::InvalidName);
                Err(RegistryError::NameNotFound(name.to_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::error::{clear_last_error, last_error};
    use crate::types::{BasicType, UdtKind};

    #[test]
    fn test_filter_selects_among_same_named_types()
    {
        let mut module = Module::with_defaults("m", 0);
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let udt = module.new_udt(Some("node"), 16, UdtKind::Struct).unwrap();
        let alias = module.new_typedef(udt, "node").unwrap();

        assert_eq!(module.find_type_by_name("node", None), Ok(udt));
        assert_eq!(module.find_type_by_name("node", Some(SymTag::Typedef)), Ok(alias));
        assert_eq!(module.find_type_by_name("int", Some(SymTag::BaseType)), Ok(int));
    }

    #[test]
    fn test_miss_sets_invalid_name()
    {
        let module = Module::with_defaults("m", 0);
        clear_last_error();
        assert_eq!(
            module.find_type_by_name("missing", None),
            Err(RegistryError::NameNotFound("missing".to_owned()))
        );
        assert_eq!(last_error(), LastError::InvalidName);
    }
}
