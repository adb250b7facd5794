//! Logical path translation

mod common;

use common::*;
use joinwise_orm::{EntityService, ServiceFactory};

#[test]
fn test_empty_and_plain_paths() {
    let service = TestService2::instance("translate-plain").unwrap();
    assert_eq!(service.translate_params("", None), Some(String::new()));
    assert_eq!(service.translate_params("test2", None).as_deref(), Some("test2"));
    assert_eq!(service.translate_params("test2.id", None).as_deref(), Some("test2.id"));
}

#[test]
fn test_parent_paths() {
    let service = TestService2::instance("translate-parents").unwrap();
    assert_eq!(service.translate_params("test2.test.id", None).as_deref(), Some("test2Test.id"));
    assert_eq!(service.translate_params("test2.testB.name", None).as_deref(), Some("test2TestB.name"));
    assert_eq!(service.translate_params("test2.invalid.id", None), None);
    assert_eq!(service.translate_params("test2.test.invalid.id", None), None);
}

#[test]
fn test_child_paths() {
    let service = TestService::instance("translate-children").unwrap();
    assert_eq!(service.translate_params("test.tests.id", None).as_deref(), Some("testTest2.id"));
    assert_eq!(service.translate_params("test.tests.invalid.id", None), None);
}

#[test]
fn test_nested_paths() {
    let service = TestService3::instance("translate-nested").unwrap();
    assert_eq!(
        service.translate_params("test3.test.testB.name", None).as_deref(),
        Some("test3Test2TestB.name")
    );
    assert_eq!(
        service.translate_params("test3.test.id", Some("t")).as_deref(),
        Some("tTest2.id")
    );
}
