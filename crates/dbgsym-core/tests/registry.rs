//! Registry construction, handles, enumeration and name lookup

use std::ops::ControlFlow;

use dbgsym_core::error::{clear_last_error, last_error, LastError};
use dbgsym_core::prelude::*;
use dbgsym_utils::init_test_logging;

fn module() -> Module
{
    init_test_logging();
    Module::with_defaults("registry.dll", 0x1000_0000)
}

fn handle(module: &Module, id: SymId) -> u32
{
    module.symbol_to_handle(id).unwrap().raw()
}

fn member_named(module: &Module, udt: SymId, name: &str) -> SymId
{
    let children = module.symbol(udt).unwrap().children().unwrap();
    children
        .iter()
        .copied()
        .find(|&child| module.symbol(child).unwrap().name() == Some(name))
        .unwrap()
}

#[test]
fn test_same_base_type_twice_returns_same_handle()
{
    let mut module = module();
    let first = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let second = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    assert_eq!(handle(&module, first), handle(&module, second));
}

#[test]
fn test_base_type_with_other_size_is_distinct()
{
    let mut module = module();
    let narrow = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let wide = module.new_base_type(Some("int32"), BasicType::Int, 8).unwrap();
    let other_kind = module.new_base_type(Some("int32"), BasicType::UInt, 4).unwrap();
    assert_ne!(handle(&module, narrow), handle(&module, wide));
    assert_ne!(handle(&module, narrow), handle(&module, other_kind));
}

#[test]
fn test_point_members_and_type_lookup()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let point = module.new_udt(Some("Point"), 8, UdtKind::Struct).unwrap();
    module.add_udt_member(point, Some("x"), int32, 0, 0, 0).unwrap();
    module.add_udt_member(point, Some("y"), int32, 4, 0, 0).unwrap();

    assert_eq!(module.get_info(point, QueryKind::ChildrenCount), Ok(TypeInfo::U32(2)));

    let y = member_named(&module, point, "y");
    assert_eq!(
        module.get_info(y, QueryKind::TypeId),
        Ok(TypeInfo::U32(handle(&module, int32)))
    );
    assert_eq!(module.get_info(y, QueryKind::Offset), Ok(TypeInfo::U32(4)));
}

#[test]
fn test_duplicate_member_name_keeps_one_member()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let udt = module.new_udt(Some("S"), 4, UdtKind::Struct).unwrap();
    module.add_udt_member(udt, Some("x"), int32, 0, 0, 0).unwrap();
    module.add_udt_member(udt, Some("x"), int32, 0, 0, 0).unwrap();

    let children = module.symbol(udt).unwrap().children().unwrap();
    let named_x = children
        .iter()
        .filter(|&&child| module.symbol(child).unwrap().name() == Some("x"))
        .count();
    assert_eq!(named_x, 1);
}

#[test]
fn test_handle_bijection()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let udt = module.new_udt(Some("S"), 8, UdtKind::Struct).unwrap();
    let member = module.add_udt_member(udt, Some("a"), int32, 0, 0, 0).unwrap();
    let pointer = module.new_pointer(udt, 8).unwrap();
    let unit = module.new_compiland("s.c", Address::ZERO).unwrap();
    let created = [module.root(), int32, udt, member, pointer, unit];

    for id in created {
        let handle = module.symbol_to_handle(id).unwrap();
        assert_eq!(module.handle_to_symbol(handle), Ok(id));
    }

    let count = u32::try_from(module.len()).unwrap();
    assert!(module.handle_to_symbol_raw(0).is_err());
    assert!(module.handle_to_symbol_raw(count + 1).is_err());
    assert!(module.handle_to_symbol_raw(count).is_ok());
}

#[test]
fn test_ids_from_another_module_are_rejected()
{
    let mut first = module();
    let second = module();
    let int32 = first.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    assert_eq!(second.symbol_to_handle(int32), Err(RegistryError::ForeignSymbol));
}

#[test]
fn test_enumeration_visits_types_in_order()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let point = module.new_udt(Some("Point"), 8, UdtKind::Struct).unwrap();
    module.add_udt_member(point, Some("x"), int32, 0, 0, 0).unwrap();
    let array = module.new_array(0, 10, int32, int32).unwrap();
    let alias = module.new_typedef(point, "POINT").unwrap();
    module.new_compiland("main.c", Address::ZERO).unwrap();

    let mut visited = Vec::new();
    let flow = module.enumerate_types(|record| {
        visited.push((record.type_index, record.size, record.tag));
        ControlFlow::Continue(())
    });

    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(
        visited,
        vec![
            (handle(&module, int32), 4, SymTag::BaseType),
            (handle(&module, point), 8, SymTag::Udt),
            (handle(&module, array), 40, SymTag::ArrayType),
            (handle(&module, alias), 8, SymTag::Typedef),
        ]
    );
}

#[test]
fn test_enumeration_honours_early_stop()
{
    let mut module = module();
    for size in 1..=16 {
        module.new_base_type(None, BasicType::UInt, size).unwrap();
    }

    let mut visits = 0;
    let flow = module.enumerate_types(|_| {
        visits += 1;
        ControlFlow::Break(())
    });
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(visits, 1);

    let mut wide_visits = 0;
    let flow = module.enumerate_types_wide(|_| {
        wide_visits += 1;
        ControlFlow::Break(())
    });
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(wide_visits, 1);
}

#[test]
fn test_best_effort_size_defaults_to_zero()
{
    let mut module = module();
    let signature = module.new_function_signature(None, 0).unwrap();

    let mut sizes = Vec::new();
    let _ = module.enumerate_types(|record| {
        sizes.push((record.type_index, record.size));
        ControlFlow::Continue(())
    });
    assert_eq!(sizes, vec![(handle(&module, signature), 0)]);
}

#[test]
fn test_color_enum_scenario()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let color = module.new_enum(Some("Color"), int32).unwrap();
    module.add_enum_constant(color, "Red", 0).unwrap();
    module.add_enum_constant(color, "Green", 1).unwrap();

    assert_eq!(module.get_info(color, QueryKind::Length), Ok(TypeInfo::U64(4)));
    assert_eq!(module.find_type_by_name("Color", Some(SymTag::Enum)), Ok(color));

    clear_last_error();
    assert!(module.find_type_by_name("Color", Some(SymTag::Udt)).is_err());
    assert_eq!(last_error(), LastError::InvalidName);
}

#[test]
fn test_enum_constants()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let color = module.new_enum(Some("Color"), int32).unwrap();
    let green = module.add_enum_constant(color, "Green", 1).unwrap();

    assert_eq!(module.get_info(green, QueryKind::Value), Ok(TypeInfo::Value(Variant::I4(1))));
    assert_eq!(
        module.get_info(green, QueryKind::DataKind),
        Ok(TypeInfo::U32(DataKind::Constant.raw()))
    );
    assert_eq!(
        module.get_info(green, QueryKind::LexicalParent),
        Ok(TypeInfo::U32(handle(&module, color)))
    );
    assert_eq!(module.get_info(green, QueryKind::Length), Ok(TypeInfo::U64(4)));
}

#[test]
fn test_lookup_without_filter_returns_first_created()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("handle"), BasicType::UInt, 4).unwrap();
    let alias = module.new_typedef(int32, "handle").unwrap();
    assert_eq!(module.find_type_by_name("handle", None), Ok(int32));
    assert_eq!(module.find_type_by_name("handle", Some(SymTag::Typedef)), Ok(alias));
}

#[test]
fn test_unnamed_types_are_not_indexed()
{
    let mut module = module();
    module.new_udt(None, 4, UdtKind::Union).unwrap();
    assert!(module.find_type_by_name("", None).is_err());
}

#[test]
fn test_udt_size_policy_both_orderings()
{
    let mut module = module();
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();

    // Size first, then members: the later size wins.
    let early = module.new_udt(Some("Early"), 0, UdtKind::Struct).unwrap();
    assert_eq!(module.set_udt_size(early, 8), Ok(true));
    module.add_udt_member(early, Some("a"), int32, 0, 0, 0).unwrap();
    assert_eq!(module.get_info(early, QueryKind::Length), Ok(TypeInfo::U64(8)));

    // Members first, then size: the original size is kept.
    let late = module.new_udt(Some("Late"), 8, UdtKind::Struct).unwrap();
    module.add_udt_member(late, Some("a"), int32, 0, 0, 0).unwrap();
    assert_eq!(module.set_udt_size(late, 16), Ok(false));
    assert_eq!(module.get_info(late, QueryKind::Length), Ok(TypeInfo::U64(8)));
}

#[test]
fn test_arena_limit_keeps_registry_consistent()
{
    init_test_logging();
    let config = RegistryConfig::default().with_symbol_limit(3);
    let mut module = Module::new("tiny.dll", 0, config);
    let int32 = module.new_base_type(Some("int32"), BasicType::Int, 4).unwrap();
    let udt = module.new_udt(Some("S"), 4, UdtKind::Struct).unwrap();

    let error = module.add_udt_member(udt, Some("x"), int32, 0, 0, 0).unwrap_err();
    assert_eq!(error.last_error(), LastError::NotEnoughMemory);
    assert_eq!(module.get_info(udt, QueryKind::ChildrenCount), Ok(TypeInfo::U32(0)));
    assert!(module.new_pointer(int32, 8).is_err());
    assert_eq!(module.types().len(), 2);
}
