mod common;

use chrono::DateTime;
use common::{leave_store, state, ScriptedStore};
use dynform::config::{DirectoryConfig, PersonConfig};
use dynform::sql::{TypedValue, ValueKind, SQL_SERVER};
use dynform::{Access, AppError, Directory, FieldType, FormService, StaticDirectory, SubmittedValues};
use std::sync::Arc;

fn leave_submission(offset: &str) -> SubmittedValues {
    SubmittedValues::from_pairs([
        ("days", "3"),
        ("reason", "vacation"),
        ("start", "2024-06-01T09:00"),
        ("timezone-offset", offset),
    ])
}

#[tokio::test]
async fn insert_binds_owner_and_offset_timestamp() {
    let store = Arc::new(leave_store().returning(Some(17)));
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    assert_eq!(access, Access::Owner("alice".into()));

    let id = FormService::save_submission(&st, &form, &access, &leave_submission("-60")).await.unwrap();
    assert_eq!(id, 17);

    let inserts = store.statements_starting_with("INSERT");
    assert_eq!(inserts.len(), 1);
    let insert = &inserts[0];
    assert_eq!(
        insert.sql,
        "INSERT INTO leave_requests (created_ts, updated_ts, created_user, reason, days, start) \
         VALUES (CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, $1, $2, $3, $4) RETURNING id"
    );
    assert_eq!(insert.params[0], TypedValue::text("alice"));
    assert_eq!(insert.params[1], TypedValue::text("vacation"));
    assert_eq!(insert.params[2], TypedValue::Integer(3));
    let expected = DateTime::parse_from_rfc3339("2024-06-01T09:00:00+01:00").unwrap();
    assert_eq!(insert.params[3], TypedValue::Timestamp(expected));
    let TypedValue::Timestamp(start) = &insert.params[3] else { panic!("expected timestamp") };
    assert_eq!(start.offset().local_minus_utc(), 3600);
}

#[tokio::test]
async fn required_integer_left_empty_is_a_parse_failure() {
    let store = Arc::new(leave_store());
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    let mut submitted = leave_submission("0");
    submitted.set("days", "");

    match FormService::save_submission(&st, &form, &access, &submitted).await {
        Err(AppError::ParseFailed { field, raw, .. }) => {
            assert_eq!(field, "days");
            assert_eq!(raw, "");
        }
        other => panic!("expected ParseFailed, got {:?}", other.map(|_| ())),
    }
    assert!(store.statements_starting_with("INSERT").is_empty());
}

#[tokio::test]
async fn unparseable_offset_saves_as_utc() {
    let store = Arc::new(leave_store());
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    FormService::save_submission(&st, &form, &access, &leave_submission("not-a-number"))
        .await
        .unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    let TypedValue::Timestamp(start) = &insert.params[3] else { panic!("expected timestamp") };
    assert_eq!(start.offset().local_minus_utc(), 0);
    assert_eq!(start.format("%Y-%m-%d %H:%M%:z").to_string(), "2024-06-01 09:00+00:00");
}

#[tokio::test]
async fn missing_identity_is_rejected_after_registry_lookup_only() {
    let store = Arc::new(leave_store());
    let st = state(store.clone(), None);
    let err = FormService::open(&st, "leave-request", None).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    let recorded = store.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].sql.contains("FROM forms"));
}

#[tokio::test]
async fn anonymous_submissions_are_owned_by_anonymous() {
    let store = Arc::new(
        ScriptedStore::new()
            .form("feedback", "feedback", "", true, false)
            .column("feedback", "comment", "text", false),
    );
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "feedback", None).await.unwrap();
    assert_eq!(access, Access::Anonymous);
    let submitted = SubmittedValues::from_pairs([("comment", "")]);
    FormService::save_submission(&st, &form, &access, &submitted).await.unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    assert_eq!(insert.params[0], TypedValue::text("anonymous"));
    assert_eq!(insert.params[1], TypedValue::Null(ValueKind::Text));
}

#[tokio::test]
async fn unknown_form_is_not_found() {
    let st = state(Arc::new(leave_store()), None);
    assert!(matches!(
        FormService::open(&st, "nope", Some("alice")).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn form_model_uses_labels_and_defaults() {
    let store = Arc::new(
        leave_store()
            .column("leave_requests", "column_name", "character varying(40)", false)
            .column("leave_requests", "kind", "varchar", false)
            .label("leave_requests", "kind", "Kind", "annual,sick", false),
    );
    let st = state(store, None);
    let (form, _) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();

    let reason = form.field("reason").unwrap();
    assert_eq!(reason.label, "Reason");
    assert!(reason.include_in_summary);
    assert!(reason.required);
    assert_eq!(reason.description, "<p>Some <em>help</em></p>\n");

    let plain = form.field("column_name").unwrap();
    assert_eq!(plain.label, "Column name");
    assert_eq!(plain.field_type, FieldType::VarChar);
    assert!(!plain.required);

    let kind = form.field("kind").unwrap();
    assert_eq!(kind.field_type, FieldType::Select);
    assert_eq!(kind.options, vec!["annual", "sick"]);

    assert_eq!(form.field("start").unwrap().field_type, FieldType::Timestamp);
    assert_eq!(form.field("days").unwrap().field_type, FieldType::Integer);
}

#[tokio::test]
async fn missing_labels_table_is_a_metadata_failure() {
    let st = state(Arc::new(leave_store().without_labels_table()), None);
    match FormService::open(&st, "leave-request", Some("alice")).await {
        Err(AppError::MetadataQueryFailed { labels_table, .. }) => assert_eq!(labels_table, "leave_requests_labels"),
        other => panic!("expected MetadataQueryFailed, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn catalog_failure_is_a_schema_failure() {
    let store = Arc::new(leave_store().failing_catalog());
    let st = state(store.clone(), None);
    match FormService::open(&st, "leave-request", Some("alice")).await {
        Err(AppError::SchemaQueryFailed { context, .. }) => assert!(context.contains("leave_requests")),
        other => panic!("expected SchemaQueryFailed, got {:?}", other.map(|_| ())),
    }
    assert!(store.recorded().iter().all(|r| !r.sql.contains("_labels")));
}

#[tokio::test]
async fn table_without_columns_gives_an_empty_form() {
    let store = Arc::new(ScriptedStore::new().form("ping", "pings", "", false, false));
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "ping", Some("alice")).await.unwrap();
    assert!(form.fields.is_empty());

    FormService::save_submission(&st, &form, &access, &SubmittedValues::from_pairs([("stray", "x")]))
        .await
        .unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    assert_eq!(
        insert.sql,
        "INSERT INTO pings (created_ts, updated_ts, created_user) VALUES (CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, $1) RETURNING id"
    );
    assert_eq!(insert.params, vec![TypedValue::text("alice")]);
}

#[tokio::test]
async fn untabled_column_types_travel_as_text() {
    let store = Arc::new(
        ScriptedStore::new()
            .form("orders", "orders", "", false, false)
            .column("orders", "reference", "bigint", true)
            .label("orders", "reference", "Reference", "", true)
            .rows(vec![vec![
                TypedValue::Integer(1),
                TypedValue::text("alice"),
                TypedValue::Null(ValueKind::Timestamp),
                TypedValue::text("9000000000"),
            ]]),
    );
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "orders", Some("alice")).await.unwrap();
    let reference = form.field("reference").unwrap();
    assert_eq!(reference.field_type, FieldType::VarChar);
    assert_eq!(reference.untabled_type.as_deref(), Some("bigint"));

    let submitted = SubmittedValues::from_pairs([("reference", "9000000000")]);
    FormService::save_submission(&st, &form, &access, &submitted).await.unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    assert!(insert.sql.contains("VALUES (CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, $1, CAST($2 AS bigint))"));
    assert_eq!(insert.params[1], TypedValue::text("9000000000"));

    let rows = FormService::load_list(&st, &form, &access).await.unwrap();
    assert_eq!(rows[0]["reference"], "9000000000");
    let select = &store.statements_starting_with("SELECT id")[0];
    assert!(select.sql.contains("reference::text"));
}

#[tokio::test]
async fn owner_update_filters_on_created_user() {
    let store = Arc::new(leave_store().returning(Some(9)));
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    let mut submitted = leave_submission("0");
    submitted.set("id", "9");
    assert_eq!(FormService::save_submission(&st, &form, &access, &submitted).await.unwrap(), 9);

    let update = &store.statements_starting_with("UPDATE")[0];
    assert!(update.sql.ends_with("WHERE id = $1 AND created_user = $2 RETURNING id"));
    assert_eq!(update.params[0], TypedValue::Integer(9));
    assert_eq!(update.params[1], TypedValue::text("alice"));
}

#[tokio::test]
async fn admin_update_skips_owner_filter() {
    let store = Arc::new(leave_store().returning(Some(9)));
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("root")).await.unwrap();
    assert_eq!(access, Access::Admin("root".into()));
    let mut submitted = leave_submission("0");
    submitted.set("id", "9");
    FormService::save_submission(&st, &form, &access, &submitted).await.unwrap();

    let update = &store.statements_starting_with("UPDATE")[0];
    assert!(!update.sql.contains("created_user"));
    assert!(update.sql.contains("$2 <> ''"));
}

#[tokio::test]
async fn update_matching_nothing_is_not_found() {
    let store = Arc::new(leave_store().returning(None));
    let st = state(store, None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    let mut submitted = leave_submission("0");
    submitted.set("id", "404");
    assert!(matches!(
        FormService::save_submission(&st, &form, &access, &submitted).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn non_numeric_id_is_a_parse_failure() {
    let st = state(Arc::new(leave_store()), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    let mut submitted = leave_submission("0");
    submitted.set("id", "abc");
    assert!(matches!(
        FormService::save_submission(&st, &form, &access, &submitted).await,
        Err(AppError::ParseFailed { ref field, .. }) if field == "id"
    ));
}

#[tokio::test]
async fn list_encodes_summary_rows() {
    let ts = DateTime::parse_from_rfc3339("2024-06-01T08:00:00+00:00").unwrap();
    let store = Arc::new(leave_store().rows(vec![vec![
        TypedValue::Integer(5),
        TypedValue::text("alice"),
        TypedValue::Timestamp(ts),
        TypedValue::text("vacation"),
    ]]));
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    let rows = FormService::load_list(&st, &form, &access).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "5");
    assert_eq!(rows[0]["created_ts"], "2024-06-01T08:00");
    assert_eq!(rows[0]["reason"], "vacation");

    let select = &store.statements_starting_with("SELECT id")[0];
    assert_eq!(
        select.sql,
        "SELECT id, created_user, created_ts, reason FROM leave_requests WHERE created_user = $1 ORDER BY created_ts DESC"
    );
}

#[tokio::test]
async fn missing_entry_is_not_found() {
    let st = state(Arc::new(leave_store()), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    assert!(matches!(
        FormService::load_entry(&st, &form, &access, 3).await,
        Err(AppError::NotFound(_))
    ));
}

fn directory_store() -> ScriptedStore {
    ScriptedStore::with_dialect(&SQL_SERVER)
        .form("leave-request", "leave_requests", "", false, true)
        .column("leave_requests", "reason", "nvarchar", true)
        .column("leave_requests", "user_email", "nvarchar", false)
}

fn directory() -> Arc<dyn Directory> {
    Arc::new(StaticDirectory::from_config(&DirectoryConfig {
        people: vec![
            PersonConfig {
                username: "alice".into(),
                email: "alice@example.org".into(),
                manager: Some("bob".into()),
                ..Default::default()
            },
            PersonConfig {
                username: "bob".into(),
                ..Default::default()
            },
        ],
    }))
}

#[tokio::test]
async fn directory_fields_come_from_the_directory_on_insert() {
    let store = Arc::new(directory_store());
    let st = state(store.clone(), Some(directory()));
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    assert!(form.field("user_email").unwrap().is_directory_populated);

    let submitted = SubmittedValues::from_pairs([("reason", "x"), ("user_email", "forged@example.org")]);
    FormService::save_submission(&st, &form, &access, &submitted).await.unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    assert!(insert.sql.contains("OUTPUT INSERTED.id VALUES"));
    assert_eq!(insert.params[2], TypedValue::text("alice@example.org"));
}

#[tokio::test]
async fn directory_fields_disabled_without_a_directory() {
    let store = Arc::new(directory_store());
    let st = state(store.clone(), None);
    let (form, access) = FormService::open(&st, "leave-request", Some("alice")).await.unwrap();
    assert!(!form.use_directory_fields);
    assert!(!form.field("user_email").unwrap().is_directory_populated);

    let submitted = SubmittedValues::from_pairs([("reason", "x"), ("user_email", "typed@example.org")]);
    FormService::save_submission(&st, &form, &access, &submitted).await.unwrap();
    let insert = &store.statements_starting_with("INSERT")[0];
    assert_eq!(insert.params[2], TypedValue::text("typed@example.org"));
}

#[tokio::test]
async fn directory_failure_is_fatal_to_the_submission() {
    let store = Arc::new(directory_store());
    let st = state(store.clone(), Some(directory()));
    let (form, access) = FormService::open(&st, "leave-request", Some("carol")).await.unwrap();
    let submitted = SubmittedValues::from_pairs([("reason", "x")]);
    assert!(matches!(
        FormService::save_submission(&st, &form, &access, &submitted).await,
        Err(AppError::DirectoryLookupFailed(_))
    ));
    assert!(store.statements_starting_with("INSERT").is_empty());
}
