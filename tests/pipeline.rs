//! Normalize, relevance and deduplicating persist, end to end
//!
//! Runs raw records through the same path a collection run uses, against
//! both store backends.

mod common;

use common::raw;
use semisupply::{
    CollectionService, DeduplicatingPersister, IngestOutcome, InvalidReason, MemoryStore,
    Normalizer, OpenStore, RelevanceValidator, SaveOutcome, SqliteStore, SupplierScale,
    SupplierStore,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn foo_semi_co_end_to_end() {
    let input = json!({
        "company_name": " Foo Semi Co ",
        "country": "usa",
        "employee_count": 1200,
        "main_products": "chips, sensors"
    });

    let record = Normalizer::new().clean(&raw("manual", input.clone()));
    assert_eq!(record.company_name, "Foo Semi Co");
    assert_eq!(record.country, "美国");
    assert_eq!(record.scale, SupplierScale::Large);
    assert_eq!(record.products, vec!["chips", "sensors"]);
    assert!(record.warnings.is_empty(), "unexpected warnings: {:?}", record.warnings);
    assert!(RelevanceValidator::new().is_relevant(&record));

    let service = CollectionService::new(Vec::new(), Arc::new(MemoryStore::new())).unwrap();
    assert!(matches!(
        service.ingest_manual(raw("manual", input.clone())).unwrap(),
        IngestOutcome::Inserted(_)
    ));
    assert_eq!(
        service.ingest_manual(raw("manual", input)).unwrap(),
        IngestOutcome::Skipped
    );
    assert_eq!(service.store().count().unwrap(), 1);
}

#[test]
fn normalization_is_deterministic() {
    let input = raw(
        "semi",
        json!({
            "company_name": "Acme  Wafer   Ltd",
            "email": " SALES@ACME.COM ",
            "phone": "+86 21 5080 1234",
            "website": "acme.com",
            "country": "PRC",
            "supplier_type": "distributor",
            "annual_revenue": "2500",
            "main_products": ["wafers", "x", "substrates"]
        }),
    );
    let normalizer = Normalizer::new();
    assert_eq!(normalizer.clean(&input), normalizer.clean(&input));
}

#[test]
fn missing_name_is_rejected_before_storage() {
    let service = CollectionService::new(Vec::new(), Arc::new(MemoryStore::new())).unwrap();
    let outcome = service
        .ingest_manual(raw("manual", json!({"country": "china", "main_products": "wafer"})))
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Invalid(InvalidReason::MissingCompanyName));
    assert_eq!(service.store().count().unwrap(), 0);
}

fn assert_dedup_invariant(store: Arc<dyn SupplierStore>) {
    let persister = DeduplicatingPersister::new(store);
    let normalizer = Normalizer::new();
    let clean = |name: &str, country: &str| {
        normalizer.clean(&raw("test", json!({"company_name": name, "country": country})))
    };

    let variants = ["Foo Semi Co", "foo semi co", "  FOO   SEMI  CO ", "Foo\tSemi\nCo"];
    let outcomes: Vec<SaveOutcome> = variants
        .iter()
        .map(|name| persister.save_if_new(&clean(name, "usa")).unwrap())
        .collect();
    assert_eq!(outcomes.iter().filter(|o| o.is_inserted()).count(), 1);
    assert!(outcomes[0].is_inserted());

    // "United States" and "usa" normalize to the same country
    assert_eq!(
        persister.save_if_new(&clean("Foo Semi Co", "United States")).unwrap(),
        SaveOutcome::Duplicate
    );
    // Same name in another country is a different supplier
    assert!(persister.save_if_new(&clean("Foo Semi Co", "china")).unwrap().is_inserted());
    assert_eq!(persister.store().count().unwrap(), 2);
}

#[test]
fn dedup_invariant_memory_store() {
    assert_dedup_invariant(Arc::new(MemoryStore::new()));
}

#[test]
fn dedup_invariant_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("suppliers.db")).unwrap();
    assert_dedup_invariant(Arc::new(store));
}

#[test]
fn stored_suppliers_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("suppliers.db");
    let input = json!({
        "company_name": "Shenzhen PCB Works",
        "country": "cn",
        "main_products": "pcb"
    });

    {
        let store = SqliteStore::open(&path).unwrap();
        let service = CollectionService::new(Vec::new(), Arc::new(store)).unwrap();
        assert!(matches!(
            service.ingest_manual(raw("manual", input.clone())).unwrap(),
            IngestOutcome::Inserted(_)
        ));
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let service = CollectionService::new(Vec::new(), store.clone()).unwrap();
    assert_eq!(service.ingest_manual(raw("manual", input)).unwrap(), IngestOutcome::Skipped);

    let listed = store.list(None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record.country, "中国");
    assert_eq!(listed[0].record.source_id, "manual");
}
