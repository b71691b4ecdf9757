mod common;

use common::{column_strings, expected, fixture_path, names};
use csv_widen::{
    error::ReshapeError,
    io_utils,
    plan::ReshapePlan,
    table::Table,
    transform::{
        self, ColumnCleaner,
        cleaning::{Blacklist, NullifyNonAlphanumeric},
        concat::Concat,
        phone::NormalizePhone,
    },
    widen::widen_multivalues,
};

fn load_contacts() -> Table {
    let encoding = io_utils::resolve_encoding(None).unwrap();
    io_utils::read_table(
        &fixture_path("contacts.csv"),
        b',',
        encoding,
        &["NA".to_string()],
    )
    .unwrap()
}

fn contact_cleaners() -> Vec<Box<dyn ColumnCleaner>> {
    let nullify: Box<dyn ColumnCleaner> = Box::new(NullifyNonAlphanumeric::new(names(&["phone"])));
    let blacklist: Box<dyn ColumnCleaner> =
        Box::new(Blacklist::new(["BILL_TO".to_string()], names(&["phone"])));
    let concat: Box<dyn ColumnCleaner> =
        Box::new(Concat::new("full_name", names(&["first", "last"])));
    vec![nullify, blacklist, concat]
}

#[test]
fn cleaners_run_in_order_without_changing_row_count() {
    let mut table = load_contacts();
    transform::apply_all(&mut table, &contact_cleaners()).unwrap();
    assert_eq!(table.row_count(), 6);
    assert_eq!(
        column_strings(&table, "phone"),
        expected(&["416-593-8570", "", "647-555-0101", "", "905-555-0199", ""])
    );
    assert_eq!(
        column_strings(&table, "full_name"),
        expected(&[
            "Ada Lovelace",
            "Ada Lovelace",
            "Ada Lovelace",
            "Alan Turing",
            "Alan Turing",
            "Grace"
        ])
    );
}

#[test]
fn cleaned_contacts_widen_to_one_row_per_customer() {
    let mut table = load_contacts();
    transform::apply_all(&mut table, &contact_cleaners()).unwrap();
    let result = widen_multivalues(
        &table,
        "customer_id",
        &names(&["phone", "email", "full_name"]),
        10,
    )
    .unwrap()
    .table;
    assert_eq!(
        result.columns(),
        &["customer_id", "phone", "phone_1", "email", "email_1", "full_name"]
    );
    assert_eq!(
        column_strings(&result, "phone"),
        expected(&["416-593-8570", "905-555-0199", ""])
    );
    assert_eq!(
        column_strings(&result, "phone_1"),
        expected(&["647-555-0101", "", ""])
    );
    assert_eq!(
        column_strings(&result, "email_1"),
        expected(&["ada@work.example", "", ""])
    );
    assert_eq!(
        column_strings(&result, "full_name"),
        expected(&["Ada Lovelace", "Alan Turing", "Grace"])
    );
}

#[test]
fn failing_cleaner_undoes_the_whole_chain() {
    let mut table = load_contacts();
    let before = table.clone();
    let nullify: Box<dyn ColumnCleaner> = Box::new(NullifyNonAlphanumeric::new(names(&["phone"])));
    let concat: Box<dyn ColumnCleaner> =
        Box::new(Concat::new("full_name", names(&["first", "middle"])));
    assert!(transform::apply_all(&mut table, &[nullify, concat]).is_err());
    assert_eq!(table, before);
}

#[test]
fn unknown_column_late_in_the_chain_keeps_earlier_edits_out() {
    let mut table = Table::from_text_rows(&["key", "val"], &[&["a", "---"], &["b", "x"]]).unwrap();
    let before = table.clone();
    let nullify: Box<dyn ColumnCleaner> = Box::new(NullifyNonAlphanumeric::new(names(&["val"])));
    let blacklist: Box<dyn ColumnCleaner> =
        Box::new(Blacklist::new(["x".to_string()], names(&["missing"])));
    let err = transform::apply_all(&mut table, &[nullify, blacklist]).unwrap_err();
    assert!(matches!(err, ReshapeError::FieldNotFound { ref field } if field == "missing"));
    assert_eq!(table, before);
}

#[test]
fn plan_cleaners_match_hand_built_ones() {
    let plan = ReshapePlan::from_yaml_str(
        r#"
key: customer_id
fields: [phone, email, full_name]
null_values: [NA]
cleaners:
  - kind: nullify_non_alphanumeric
    fields: [phone]
  - kind: blacklist
    values: [BILL_TO]
    fields: [phone]
  - kind: concat
    target: full_name
    fields: [first, last]
"#,
    )
    .unwrap();
    let mut from_plan = load_contacts();
    transform::apply_all(&mut from_plan, &plan.build_cleaners().unwrap()).unwrap();
    let mut by_hand = load_contacts();
    transform::apply_all(&mut by_hand, &contact_cleaners()).unwrap();
    assert_eq!(from_plan, by_hand);
}

const TORONTO: &str = "4165938570";

fn phone_table() -> Table {
    Table::from_text_rows(
        &[
            "key",
            "good",
            "bad",
            "by_country",
            "regions",
            "regions_with_typo",
            "regions_partial",
        ],
        &[
            &["a", "416-593-8570", "416-593-8570", "(604) 264-0954", "CA", "CA", ""],
            &["b", "416-5938570", "4165938570", "+1 (617) 742-3050", "US", "ABAC", "US"],
            &["c", "4165938570", "", "", "", "", ""],
            &["d", "416 593 8570", "BILL_TO", "(617) 742-3050", "US", "US", "US"],
            &["e", "(416) 593-8570", "  ", "4165938570", "CA", "", ""],
            &["f", "416-593-8570", "", "807 467 8667", "CA", "CA", "GB"],
            &["g", "4165938570", "SHIP_TO", "+34 915 21 12 01", "ES", "ES", "ES"],
            &["h", "416 593 8570", "BILL_TO", "(416) 593-8570", "CA", "CA", "CA"],
        ],
    )
    .unwrap()
}

#[test]
fn phone_formats_normalize_into_new_column_with_region_code() {
    let mut table = phone_table();
    let original = column_strings(&table, "good");
    NormalizePhone::new("good")
        .with_key("key")
        .with_target("national")
        .with_region("CA")
        .apply(&mut table)
        .unwrap();
    assert_eq!(column_strings(&table, "national"), expected(&[TORONTO; 8]));
    assert_eq!(column_strings(&table, "good"), original);
}

#[test]
fn unparseable_phones_become_null() {
    let mut table = phone_table();
    NormalizePhone::new("bad")
        .with_target("national")
        .with_region("CA")
        .apply(&mut table)
        .unwrap();
    assert_eq!(
        column_strings(&table, "national"),
        expected(&[TORONTO, TORONTO, "", "", "", "", "", ""])
    );
}

#[test]
fn unparseable_phones_can_keep_their_original_text() {
    let mut table = phone_table();
    NormalizePhone::new("bad")
        .with_target("national")
        .with_region("CA")
        .use_original_on_error(true)
        .apply(&mut table)
        .unwrap();
    assert_eq!(
        column_strings(&table, "national"),
        expected(&[TORONTO, TORONTO, "", "BILL_TO", "  ", "", "SHIP_TO", "BILL_TO"])
    );
}

#[test]
fn region_column_drives_in_place_normalization() {
    let mut table = phone_table();
    NormalizePhone::new("by_country")
        .with_region_field("regions")
        .apply(&mut table)
        .unwrap();
    assert_eq!(
        column_strings(&table, "by_country"),
        expected(&[
            "6042640954",
            "6177423050",
            "",
            "6177423050",
            TORONTO,
            "8074678667",
            "915211201",
            TORONTO
        ])
    );
}

#[test]
fn unsupported_region_in_column_is_rejected_before_writing() {
    let mut table = phone_table();
    let before = table.clone();
    let err = NormalizePhone::new("by_country")
        .with_region_field("regions_with_typo")
        .apply(&mut table)
        .unwrap_err();
    assert!(matches!(err, ReshapeError::InvalidArgument(ref msg) if msg.contains("ABAC")));
    assert_eq!(table, before);
}

#[test]
fn missing_or_foreign_region_nulls_the_number() {
    let mut table = phone_table();
    NormalizePhone::new("by_country")
        .with_target("national")
        .with_region_field("regions_partial")
        .apply(&mut table)
        .unwrap();
    assert_eq!(
        column_strings(&table, "national"),
        expected(&["", "6177423050", "", "6177423050", "", "", "915211201", TORONTO])
    );
}

#[test]
fn region_code_fills_in_for_missing_region_values() {
    let mut table = phone_table();
    NormalizePhone::new("by_country")
        .with_region("CA")
        .with_region_field("regions_partial")
        .apply(&mut table)
        .unwrap();
    // A row's own region wins, so the Ontario number tagged GB stays invalid.
    assert_eq!(
        column_strings(&table, "by_country"),
        expected(&[
            "6042640954",
            "6177423050",
            "",
            "6177423050",
            TORONTO,
            "",
            "915211201",
            TORONTO
        ])
    );
}

#[test]
fn duplicate_keys_block_phone_normalization() {
    let mut table = Table::from_text_rows(
        &["key", "phone"],
        &[&["a", "416-593-8570"], &["b", "416-5938570"], &["a", "4165938570"]],
    )
    .unwrap();
    let before = table.clone();
    let err = NormalizePhone::new("phone")
        .with_key("key")
        .with_region("CA")
        .apply(&mut table)
        .unwrap_err();
    assert!(matches!(
        err,
        ReshapeError::KeyConstraintViolation { ref key, count: 2, .. } if key == "a"
    ));
    assert_eq!(table, before);

    // Without a key column every row is addressed by position.
    NormalizePhone::new("phone")
        .with_region("CA")
        .apply(&mut table)
        .unwrap();
    assert_eq!(column_strings(&table, "phone"), expected(&[TORONTO; 3]));
}

#[test]
fn plan_phone_cleaner_runs_after_blacklist() {
    let plan = ReshapePlan::from_yaml_str(
        r#"
cleaners:
  - kind: blacklist
    values: [BILL_TO]
    fields: [bad]
  - kind: normalize_phone
    field: bad
    key: key
    region: CA
    use_original_on_error: true
"#,
    )
    .unwrap();
    let mut table = phone_table();
    transform::apply_all(&mut table, &plan.build_cleaners().unwrap()).unwrap();
    assert_eq!(
        column_strings(&table, "bad"),
        expected(&[TORONTO, TORONTO, "", "", "  ", "", "SHIP_TO", ""])
    );
}
