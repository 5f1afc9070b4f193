//! Edge case tests for the loyalty ledger.
//!
//! Requests are replayed through the batch runner the same way the CLI does,
//! plus a few direct dispatcher calls against stores that misbehave.

use loyalty_ledger::{
    BatchRunner, Caller, Config, Dispatcher, EntityKind, LoyaltyError, MemoryStore, RecordStore,
    Result,
};
use std::io::Cursor;

const HEADER: &str = "kind,caller,role,function,arg1,arg2\n";

fn run_csv_on(store: MemoryStore, config: Config, rows: &str) -> (String, MemoryStore) {
    let mut runner = BatchRunner::new(Dispatcher::new(store, config));
    runner.process_csv(Cursor::new(format!("{}{}", HEADER, rows))).unwrap();

    let mut output = Vec::new();
    runner.write_output(&mut output).unwrap();
    (
        String::from_utf8(output).unwrap(),
        runner.into_dispatcher().into_store(),
    )
}

fn run_csv(rows: &str) -> String {
    run_csv_on(MemoryStore::new(), Config::default(), rows).0
}

/// (status, response) per processed row, in order.
fn parse_output(output: &str) -> Vec<(String, String)> {
    let mut reader = csv::Reader::from_reader(output.as_bytes());
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[3].to_string(), r[4].to_string())
        })
        .collect()
}

fn regulator() -> Caller {
    Caller::new("AU0000001", "regulator")
}

/// A shop with one point of sale at 5% and one item at 500.
const SHOP: &str = "\
invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,create_pos,PS0000001,
invoke,AU0000001,regulator,create_item,IT0000001,
invoke,AU0000001,regulator,update_posid,IT0000001,PS0000001
";

// ==================== CREATE EDGE CASES ====================

#[test]
fn test_create_then_details_has_defaults() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_customer,CU0000001,
query,,,get_customer_details,CU0000001,
invoke,AU0000001,regulator,create_item,IT0000001,
query,,,get_item_details,IT0000001,",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[0], ("ok".to_string(), String::new()));
    assert_eq!(
        rows[1].1,
        r#"{"customerID":"CU0000001","name":"CU0000001","address":"UNDEFINED","cashback":0,"email":"UNDEFINED","phone":"UNDEFINED","status":true}"#
    );
    assert_eq!(
        rows[3].1,
        r#"{"itemId":"IT0000001","posId":"UNDEFINED","itemName":"UNDEFINED","price":500}"#
    );
}

#[test]
fn test_duplicate_create_grows_index_once() {
    let (output, store) = run_csv_on(
        MemoryStore::new(),
        Config::default(),
        "invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,create_customer,CU0000002,",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[1].0, "error");
    assert_eq!(rows[1].1, "Customer CU0000001 already exists");
    assert_eq!(
        store.get(EntityKind::Customer.index_key()).unwrap(),
        Some(br#"{"customerIDs":["CU0000001","CU0000002"]}"#.to_vec())
    );
}

#[test]
fn test_malformed_identifiers_rejected() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_customer,C00000001,
invoke,AU0000001,regulator,create_customer,CU000001,
invoke,AU0000001,regulator,create_customer,CU00000012,
invoke,AU0000001,regulator,create_customer,C[0000001,
query,,,get_customers,,",
    );
    let rows = parse_output(&output);

    for row in &rows[..4] {
        assert_eq!(row.0, "error");
        assert!(row.1.starts_with("Invalid identifier"), "{}", row.1);
    }
    assert_eq!(rows[4].1, "[]");
}

#[test]
fn test_legacy_identifier_policy() {
    let config = Config {
        id_policy: "legacy".parse().unwrap(),
        ..Config::default()
    };
    let (output, _) = run_csv_on(
        MemoryStore::new(),
        config,
        "invoke,AU0000001,regulator,create_customer,C[0000001,
invoke,AU0000001,regulator,create_customer,CU00000012,",
    );
    let rows = parse_output(&output);
    assert_eq!(rows[0].0, "ok");
    assert_eq!(rows[1].0, "ok");
}

// ==================== UPDATE EDGE CASES ====================

#[test]
fn test_update_inactive_customer_leaves_record_unchanged() {
    let (output, store) = run_csv_on(
        MemoryStore::new(),
        Config::default(),
        "invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,update_email,CU0000001,ann@example.com
invoke,AU0000001,regulator,deactivate_customer,CU0000001,
invoke,AU0000001,regulator,update_email,CU0000001,other@example.com
invoke,AU0000001,regulator,update_cashback,CU0000001,999",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[3].1, "Customer CU0000001 is not active");
    assert_eq!(rows[4].0, "error");

    let stored = String::from_utf8(store.get("CU0000001").unwrap().unwrap()).unwrap();
    assert!(stored.contains(r#""email":"ann@example.com""#));
    assert!(stored.contains(r#""cashback":0"#));
    assert!(stored.contains(r#""status":false"#));
}

#[test]
fn test_update_missing_customer_is_lookup_failure() {
    let output = run_csv("invoke,AU0000001,regulator,update_name,CU0000404,Ann");
    let rows = parse_output(&output);
    assert_eq!(
        rows[0].1,
        "Failed to look up customer CU0000404: Customer CU0000404 not found"
    );
}

#[test]
fn test_inactive_pos_rejects_updates() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_pos,PS0000001,
invoke,AU0000001,regulator,deactivate_pos,PS0000001,
invoke,AU0000001,regulator,update_posname,PS0000001,Airport
invoke,AU0000001,regulator,deactivate_pos,PS0000001,",
    );
    let rows = parse_output(&output);
    assert_eq!(rows[2].1, "PointOfSale PS0000001 is not active");
    assert_eq!(rows[3].0, "error");
}

#[test]
fn test_item_update_targets_item_not_customer() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_item,IT0000001,
invoke,AU0000001,regulator,update_item_name,IT0000001,Lounge pass
invoke,AU0000001,regulator,update_price,IT0000001,1200
invoke,AU0000001,regulator,update_price,IT0000404,1
query,,,get_item_details,IT0000001,",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[1].0, "ok");
    assert_eq!(rows[2].0, "ok");
    assert!(rows[3].1.starts_with("Failed to look up item IT0000404"));
    assert!(rows[4].1.contains(r#""itemName":"Lounge pass""#));
    assert!(rows[4].1.contains(r#""price":1200"#));
}

#[test]
fn test_text_field_can_be_cleared() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_item,IT0000001,
invoke,AU0000001,regulator,update_posid,IT0000001,PS0000001
invoke,AU0000001,regulator,update_posid,IT0000001,\"\"
query,,,get_item_details,IT0000001,
invoke,AU0000001,regulator,update_item_name,IT0000001,
query,,,get_item_details,IT0000001,",
    );
    let rows = parse_output(&output);

    assert!(rows.iter().all(|(status, _)| status == "ok"), "{:?}", rows);
    assert!(rows[3].1.contains(r#""posId":"""#));
    assert!(rows[5].1.contains(r#""itemName":"""#));
}

#[test]
fn test_update_address() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,update_address,CU0000001,\"12 Quay Street, Leith\"
query,,,get_customer_details,CU0000001,
invoke,AU0000001,regulator,update_address,CU0000404,Nowhere",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[1], ("ok".to_string(), String::new()));
    assert!(rows[2].1.contains(r#""address":"12 Quay Street, Leith""#));
    assert!(rows[3].1.starts_with("Failed to look up customer CU0000404"));
}

#[test]
fn test_non_numeric_values_rejected() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,update_cashback,CU0000001,12.5
invoke,AU0000001,regulator,create_pos,PS0000001,
invoke,AU0000001,regulator,update_percentage,PS0000001,abc
invoke,AU0000001,regulator,update_percentage,PS0000001,250",
    );
    let rows = parse_output(&output);
    for i in [1, 3, 4] {
        assert!(rows[i].1.starts_with("Invalid argument"), "{}", rows[i].1);
    }
}

// ==================== PURCHASE EDGE CASES ====================

#[test]
fn test_accrual_purchase_exact() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,buy_item_by_money,CU0000001,IT0000001
query,,,get_customer_details,CU0000001,",
        SHOP
    ));
    let rows = parse_output(&output);
    assert_eq!(rows[4].0, "ok");
    assert!(rows[5].1.contains(r#""cashback":25"#));
}

#[test]
fn test_accrual_truncates_small_price() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,update_price,IT0000001,7
invoke,AU0000001,regulator,buy_item_by_money,CU0000001,IT0000001
query,,,get_customer_details,CU0000001,",
        SHOP
    ));
    let rows = parse_output(&output);
    assert_eq!(rows[5].0, "ok");
    assert!(rows[6].1.contains(r#""cashback":0"#));
}

#[test]
fn test_accrual_uses_pos_at_purchase_time() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,update_percentage,PS0000001,10
invoke,AU0000001,regulator,buy_item_by_money,CU0000001,IT0000001
query,,,get_customer_details,CU0000001,",
        SHOP
    ));
    let rows = parse_output(&output);
    assert!(rows[6].1.contains(r#""cashback":50"#));
}

#[test]
fn test_accrual_with_unassigned_item() {
    let output = run_csv(
        "invoke,AU0000001,regulator,create_customer,CU0000001,
invoke,AU0000001,regulator,create_item,IT0000001,
invoke,AU0000001,regulator,buy_item_by_money,CU0000001,IT0000001",
    );
    let rows = parse_output(&output);
    assert!(rows[2].1.starts_with("Failed to look up point of sale UNDEFINED"));
}

#[test]
fn test_wallet_purchase_strict_boundary() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,update_price,IT0000001,100
invoke,AU0000001,regulator,update_cashback,CU0000001,100
invoke,AU0000001,regulator,buy_item_by_wallet,CU0000001,IT0000001
invoke,AU0000001,regulator,update_cashback,CU0000001,101
invoke,AU0000001,regulator,buy_item_by_wallet,CU0000001,IT0000001
query,,,get_customer_details,CU0000001,",
        SHOP
    ));
    let rows = parse_output(&output);

    assert_eq!(
        rows[6].1,
        "Insufficient balance for customer CU0000001: balance 100, price 100"
    );
    assert_eq!(rows[8].0, "ok");
    assert!(rows[9].1.contains(r#""cashback":1"#));
}

#[test]
fn test_inactive_customer_cannot_buy() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,update_cashback,CU0000001,1000
invoke,AU0000001,regulator,deactivate_customer,CU0000001,
invoke,AU0000001,regulator,buy_item_by_money,CU0000001,IT0000001
invoke,AU0000001,regulator,buy_item_by_wallet,CU0000001,IT0000001",
        SHOP
    ));
    let rows = parse_output(&output);
    assert_eq!(rows[6].1, "Customer CU0000001 is not active");
    assert_eq!(rows[7].1, "Customer CU0000001 is not active");
}

#[test]
fn test_purchase_with_missing_item() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,buy_item_by_wallet,CU0000001,IT0000404",
        SHOP
    ));
    let rows = parse_output(&output);
    assert!(rows[4].1.starts_with("Failed to look up item IT0000404"));
}

// ==================== AUTHORIZATION EDGE CASES ====================

#[test]
fn test_missing_identity_rejected() {
    let output = run_csv(
        "invoke,,,create_customer,CU0000001,
invoke,AU0000001,,create_customer,CU0000001,
query,,,check_unique_customer,CU0000001,",
    );
    let rows = parse_output(&output);
    assert!(rows[0].1.starts_with("Caller identity unavailable"));
    assert!(rows[1].1.starts_with("Caller identity unavailable"));
    assert_eq!(rows[2].1, "true");
}

#[test]
fn test_customer_may_only_touch_own_record() {
    let output = run_csv(&format!(
        "{}invoke,AU0000001,regulator,create_customer,CU0000002,
invoke,CU0000001,customer,update_phone,CU0000001,555-0100
invoke,CU0000001,customer,update_phone,CU0000002,555-0199
invoke,CU0000001,customer,update_cashback,CU0000001,100000
invoke,CU0000001,customer,buy_item_by_money,CU0000001,IT0000001",
        SHOP
    ));
    let rows = parse_output(&output);
    assert_eq!(rows[5].0, "ok");
    assert!(rows[6].1.contains("not permitted"));
    assert!(rows[7].1.contains("not permitted"));
    assert_eq!(rows[8].0, "ok");
}

#[test]
fn test_merchant_manages_catalog_only() {
    let output = run_csv(
        "invoke,HT0000001,hotel,create_pos,PS0000001,
invoke,HT0000001,hotel,create_customer,CU0000001,
invoke,HT0000001,hotel,update_cashback,CU0000001,500",
    );
    let rows = parse_output(&output);
    assert_eq!(rows[0].0, "ok");
    assert_eq!(rows[1].0, "ok");
    assert_eq!(
        rows[2].1,
        "Role 'hotel' of caller HT0000001 is not permitted to manage customer balances"
    );
}

// ==================== QUERY EDGE CASES ====================

#[test]
fn test_list_all_round_trips_stored_form() {
    let (output, store) = run_csv_on(
        MemoryStore::new(),
        Config::default(),
        "invoke,AU0000001,regulator,create_pos,PS0000002,
invoke,AU0000001,regulator,create_pos,PS0000001,
invoke,AU0000001,regulator,update_posname,PS0000001,Harbour Cafe
query,,,get_points_of_sale,,",
    );
    let rows = parse_output(&output);

    let listed: Vec<serde_json::Value> = serde_json::from_str(&rows[3].1).unwrap();
    assert_eq!(listed.len(), 2);
    for (entry, id) in listed.iter().zip(["PS0000002", "PS0000001"]) {
        let stored: serde_json::Value =
            serde_json::from_slice(&store.get(id).unwrap().unwrap()).unwrap();
        assert_eq!(entry, &stored);
    }
}

#[test]
fn test_get_items_in_creation_order() {
    let output = run_csv(
        "query,,,get_items,,
invoke,AU0000001,regulator,create_item,IT0000002,
invoke,AU0000001,regulator,create_item,IT0000001,
invoke,AU0000001,regulator,update_price,IT0000001,80
query,,,get_items,,",
    );
    let rows = parse_output(&output);

    assert_eq!(rows[0], ("ok".to_string(), "[]".to_string()));
    let listed: Vec<serde_json::Value> = serde_json::from_str(&rows[4].1).unwrap();
    let ids: Vec<&str> = listed.iter().map(|item| item["itemId"].as_str().unwrap()).collect();
    assert_eq!(ids, ["IT0000002", "IT0000001"]);
    assert_eq!(listed[0]["price"], 500);
    assert_eq!(listed[1]["price"], 80);
}

#[test]
fn test_writes_are_unknown_to_query_table() {
    let output = run_csv(
        "query,,,create_customer,CU0000001,
query,,,check_unique_customer,CU0000001,
invoke,AU0000001,regulator,get_customers,,",
    );
    let rows = parse_output(&output);
    assert_eq!(rows[0].1, "Unknown operation: create_customer");
    assert_eq!(rows[1].1, "true");
    assert_eq!(rows[2].1, "Unknown operation: get_customers");
}

#[test]
fn test_ping_is_side_effect_free() {
    let (output, store) = run_csv_on(
        MemoryStore::new(),
        Config::default(),
        "query,,,ping,,
query,,,ping,,
invoke,AU0000001,regulator,ping,,
query,,,ping,,",
    );
    for row in parse_output(&output) {
        assert_eq!(row, ("ok".to_string(), "Hello, world!".to_string()));
    }
    assert!(store.is_empty());
}

// ==================== STORE FAILURE EDGE CASES ====================

/// Store that can be told to refuse reads, all writes, or writes to one key.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_writes: bool,
    refused_key: Option<&'static str>,
}

impl FlakyStore {
    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes || self.refused_key == Some(key) {
            let reason = format!("write to {} refused", key);
            return Err(loyalty_ledger::store::unavailable(reason));
        }
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads {
            return Err(loyalty_ledger::store::unavailable("read refused"));
        }
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_write(key)?;
        self.inner.put(key, value)
    }

    fn commit(&mut self, writes: Vec<(String, Vec<u8>)>) -> Result<()> {
        for (key, _) in &writes {
            self.check_write(key)?;
        }
        self.inner.commit(writes)
    }
}

#[test]
fn test_store_write_failure_is_terminal() {
    let store = FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    };
    let mut ledger = Dispatcher::new(store, Config::default());

    let err = ledger
        .invoke(&regulator(), "create_customer", &["CU0000001"])
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::StoreUnavailable(_)));
    assert!(ledger.store().inner.is_empty());
}

#[test]
fn test_refused_index_write_leaves_no_record() {
    let store = FlakyStore {
        refused_key: Some("customerIDs"),
        ..FlakyStore::default()
    };
    let mut ledger = Dispatcher::new(store, Config::default());

    let err = ledger
        .invoke(&regulator(), "create_customer", &["AB0000001"])
        .unwrap_err();
    assert!(matches!(err, LoyaltyError::StoreUnavailable(_)));
    assert_eq!(ledger.store().inner.get("AB0000001").unwrap(), None);
    assert_eq!(ledger.store().inner.get("customerIDs").unwrap(), None);
    assert_eq!(
        ledger.query("check_unique_customer", &["AB0000001"]).unwrap().as_str(),
        "true"
    );
}

#[test]
fn test_store_read_failure_surfaces_from_check_unique() {
    let store = FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    };
    let ledger = Dispatcher::new(store, Config::default());

    assert!(matches!(
        ledger.query("check_unique_customer", &["CU0000001"]),
        Err(LoyaltyError::StoreUnavailable(_))
    ));
    assert_eq!(ledger.query("ping", &[]).unwrap().as_str(), "Hello, world!");
}

#[test]
fn test_corrupt_record_handling() {
    let mut store = MemoryStore::new();
    {
        let mut ledger = Dispatcher::new(store, Config::default());
        ledger.invoke(&regulator(), "create_customer", &["CU0000001"]).unwrap();
        ledger.invoke(&regulator(), "create_customer", &["CU0000002"]).unwrap();
        store = ledger.into_store();
    }
    store.put("CU0000002", b"{not json".to_vec()).unwrap();
    let ledger = Dispatcher::new(store, Config::default());

    assert!(matches!(
        ledger.query("get_customer_details", &["CU0000002"]),
        Err(LoyaltyError::CorruptRecord { .. })
    ));
    assert!(matches!(
        ledger.query("get_customers", &[]),
        Err(LoyaltyError::RetrievalFailed { .. })
    ));
    assert_eq!(
        ledger.query("check_unique_customer", &["CU0000002"]).unwrap().as_str(),
        "false"
    );
}
