//! Process-wide message map.
//!
//! These functions operate on a single [`MessageMap`] shared by the whole
//! process. Configuration (`configure`, `define_type`, `set_catalog`, `reset`)
//! takes an exclusive lock, so concurrent first configurers never build two
//! roots. Queries take a shared lock that may be re-entered, so message
//! callbacks can themselves call [`get_message`] or [`get_type_message`].
//!
//! Queries issued from inside a `configure` closure would wait on the
//! exclusive lock held by that same call and deadlock; build first, query
//! afterwards.
//!
//! [`reset`] is meant for test isolation. Do not call it while other threads
//! are still querying.

use crate::catalog::Catalog;
use crate::engine::{Resolution, TypeStore};
use crate::map::MessageMap;
use crate::types::TypeDef;
use crate::value::{TypeName, Value};
use crate::Error;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

static REGISTRY: Lazy<RwLock<MessageMap>> = Lazy::new(|| RwLock::new(MessageMap::new()));

/// Populate the subtree for `root_type` in the process-wide map.
///
/// # Example
/// ```
/// use missive::{MapCatalog, MessageLeaf, TypeDef, record};
///
/// missive::define_type(TypeDef::new("Disk")).unwrap();
/// missive::set_catalog(MapCatalog::new().with("DISK_FULL", "disk {0} is full")).unwrap();
/// missive::configure("Disk", |disks| {
///     disks.add_type("Disk", MessageLeaf::catalog("DISK_FULL").arg_field("name"))
/// })
/// .unwrap();
///
/// let msg = missive::get_message(&record!("Disk" { name: "sda" })).unwrap();
/// assert_eq!(msg, "disk sda is full");
/// ```
pub fn configure(
    root_type: impl Into<TypeName>,
    configure: impl FnOnce(&mut TypeStore) -> Result<(), Error>,
) -> Result<(), Error> {
    REGISTRY.write().configure(root_type, configure)
}

pub fn define_type(def: TypeDef) -> Result<(), Error> {
    REGISTRY.write().define_type(def)
}

/// Install the process-wide catalog. A second call fails with [`Error::CatalogAlreadySet`].
pub fn set_catalog(catalog: impl Catalog + 'static) -> Result<(), Error> {
    REGISTRY.write().set_catalog(catalog)
}

/// Message for `value`; `""` when nothing matches.
pub fn get_message(value: &Value) -> Result<String, Error> {
    REGISTRY.read_recursive().message(value)
}

/// Message for a type without an instance.
pub fn get_type_message(ty: impl Into<TypeName>) -> Result<String, Error> {
    REGISTRY.read_recursive().type_message(ty)
}

/// Like [`get_message`], with timing and the dispatch path.
pub fn get_message_verbose(value: &Value) -> Result<Resolution, Error> {
    REGISTRY.read_recursive().message_verbose(value)
}

/// Drop the tree, the type table and the catalog.
pub fn reset() {
    REGISTRY.write().reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MapCatalog;
    use crate::engine::MessageLeaf;
    use pretty_assertions::assert_eq;

    fn catalog() -> MapCatalog {
        MapCatalog::parse(
            "
            # entities
            USER = user
            ORDER = order
            NOT_FOUND = {0} not found
            A_MSG = hello
            ",
        )
    }

    #[test]
    #[serial_test::serial]
    fn queries_before_configure_fail() {
        reset();
        assert!(matches!(get_message(&Value::Int(1)), Err(Error::NotConfigured)));
        assert!(matches!(get_type_message("int"), Err(Error::NotConfigured)));
    }

    #[test]
    #[serial_test::serial]
    fn configure_then_query() {
        reset();
        define_type(TypeDef::new("TypeA")).unwrap();
        define_type(TypeDef::new("TypeB")).unwrap();
        set_catalog(catalog()).unwrap();
        configure("TypeA", |a| a.add_type("TypeA", MessageLeaf::catalog("A_MSG"))).unwrap();

        assert_eq!(get_message(&record!("TypeA")).unwrap(), "hello");
        assert_eq!(get_message(&record!("TypeB")).unwrap(), "");

        let verbose = get_message_verbose(&record!("TypeA")).unwrap();
        assert_eq!(verbose.message, "hello");
        assert!(!verbose.steps.is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn callbacks_can_query_the_registry() {
        reset();
        define_type(TypeDef::new("User")).unwrap();
        define_type(TypeDef::new("Order")).unwrap();
        define_type(TypeDef::new("NotFound")).unwrap();
        set_catalog(catalog()).unwrap();

        configure("User", |users| users.add_type("User", TypeStore::inherit().display(MessageLeaf::catalog("USER"))))
            .unwrap();
        configure("Order", |orders| {
            orders.add_type("Order", TypeStore::inherit().display(MessageLeaf::catalog("ORDER")))
        })
        .unwrap();
        configure("NotFound", |errors| {
            errors.add_type(
                "NotFound",
                MessageLeaf::catalog("NOT_FOUND").arg(|v| Ok(get_type_message(v.field("entity")?.as_str()?)?)),
            )
        })
        .unwrap();

        assert_eq!(get_type_message("User").unwrap(), "user");
        assert_eq!(get_message(&record!("NotFound" { entity: "Order" })).unwrap(), "order not found");
    }

    #[test]
    #[serial_test::serial]
    fn concurrent_first_configures_share_one_root() {
        const THREADS: usize = 8;
        reset();
        let names: Vec<String> = (0..THREADS).map(|i| format!("Concurrent{i}")).collect();
        for name in &names {
            define_type(TypeDef::new(name.as_str())).unwrap();
        }
        set_catalog(catalog()).unwrap();

        let handles: Vec<_> = names
            .iter()
            .cloned()
            .map(|name| {
                std::thread::spawn(move || {
                    configure(name.as_str(), |store| store.add_type(name.as_str(), MessageLeaf::catalog("A_MSG")))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        for name in &names {
            assert_eq!(get_message(&Value::Record(Value::record(name.as_str()))).unwrap(), "hello");
            assert_eq!(get_type_message(name.as_str()).unwrap(), "hello");
        }
    }

    #[test]
    #[serial_test::serial]
    fn reset_allows_a_fresh_catalog() {
        reset();
        set_catalog(catalog()).unwrap();
        assert!(matches!(set_catalog(catalog()), Err(Error::CatalogAlreadySet)));
        reset();
        set_catalog(catalog()).unwrap();
    }
}
