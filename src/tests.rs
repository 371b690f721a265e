use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{AppConfig, ConfigError, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SESSION_SCOPE};
use crate::domain::entities::contact::{ContactFields, ImportRow, RowId, RowPatch, ValidContact};
use crate::domain::entities::session::{ImportSession, TransitionError, WizardStep};
use crate::domain::rules::columns::{ColumnMap, ContactColumn, HEADER_VARIANTS};
use crate::domain::rules::validation::{
    is_valid_email, validate_contact, EMAIL_INVALID, EMAIL_REQUIRED, FIRST_NAME_REQUIRED,
};
use crate::infra::import::csv::{parse_contacts_csv, ParseError, ParsedContacts};
use crate::infra::import::export::{invalid_rows_csv, template_csv};
use crate::infra::import::tokenizer::tokenize_line;
use crate::infra::memory::contact_sink::InMemoryContactSink;
use crate::infra::memory::session_store::MemorySessionStore;
use crate::infra::sqlite::queries::{count_sessions, save_session_payload};
use crate::infra::sqlite::repo::SqliteSessionStore;
use crate::usecase::ports::contact_sink::{ContactSink, SinkError};
use crate::usecase::ports::session_store::{SessionStore, StoreError};
use crate::usecase::services::complete_controller::CompleteController;
use crate::usecase::services::preview_controller::{PreviewController, RowFilter};
use crate::usecase::services::session_service::{
    decode_session, encode_session, CommitError, SessionService,
};
use crate::usecase::services::upload_controller::{
    read_upload, SelectedFile, UploadController, UploadError, UploadOutcome,
};
use crate::usecase::services::wizard::ImportWizard;

const SCOPE: &str = "test-tab";
const THREE_ROWS: &str = "First Name,Last Name,Email,Phone\n\
Ada,Lovelace,ada@example.com,555-0100\n\
Alan,Turing,alan@example.com,\n\
,Hopper,grace@example,555-0102\n";

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("contact-import-{prefix}-{nanos}"))
}

fn fields(first_name: &str, email: &str) -> ContactFields {
    ContactFields::new(first_name, "", email, "")
}

fn memory_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new())
}

fn service_with_rows(store: Arc<dyn SessionStore>, content: &str) -> SessionService {
    let mut service = SessionService::open(store, SCOPE);
    let parsed = parse_contacts_csv(content).expect("fixture should parse");
    service
        .load_parsed("contacts.csv", parsed.rows)
        .expect("rows should load");
    service
}

fn assert_row_invariant(session: &ImportSession) {
    for row in session.rows() {
        assert_eq!(
            row.is_valid(),
            row.errors().is_empty(),
            "validity must match errors for row {}",
            row.id
        );
    }
}

struct FailingStore;

impl SessionStore for FailingStore {
    fn load(&self, _scope: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }

    fn save(&self, _scope: &str, _payload: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }

    fn clear(&self, _scope: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
}

struct RejectingSink;

impl ContactSink for RejectingSink {
    fn accept(&self, _contacts: Vec<ValidContact>) -> Result<(), SinkError> {
        Err(SinkError::Rejected("read only".to_string()))
    }
}

#[test]
fn tokenizer_keeps_quoted_delimiters() {
    assert_eq!(tokenize_line(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
}

#[test]
fn tokenizer_field_count_is_unquoted_commas_plus_one() {
    let cases = [
        ("", 1),
        ("single", 1),
        ("a,b", 2),
        (",,", 3),
        (r#""x,y,z""#, 1),
        (r#"a,"b,c",d,"#, 4),
    ];
    for (line, expected) in cases {
        assert_eq!(tokenize_line(line).len(), expected, "line: {line:?}");
    }
}

#[test]
fn tokenizer_trims_fields_and_keeps_trailing_empty() {
    assert_eq!(tokenize_line("  a , b ,"), vec!["a", "b", ""]);
}

#[test]
fn tokenizer_closes_unterminated_quote_at_end_of_line() {
    assert_eq!(tokenize_line(r#"a,"b,c"#), vec!["a", "b,c"]);
}

#[test]
fn tokenizer_reads_doubled_quote_as_literal() {
    assert_eq!(
        tokenize_line(r#""say ""hi""",x,"""#),
        vec![r#"say "hi""#, "x", ""]
    );
}

#[test]
fn validator_reports_missing_first_name() {
    let verdict = validate_contact(&fields("", "x@x.com"));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.errors, vec![FIRST_NAME_REQUIRED.to_string()]);
}

#[test]
fn validator_reports_single_error_for_empty_email() {
    let verdict = validate_contact(&fields("Jo", ""));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.errors, vec![EMAIL_REQUIRED.to_string()]);
}

#[test]
fn validator_rejects_malformed_email() {
    let verdict = validate_contact(&fields("Jo", "not-an-email"));
    assert!(!verdict.is_valid);
    assert_eq!(verdict.errors, vec![EMAIL_INVALID.to_string()]);
}

#[test]
fn validator_accepts_minimal_valid_row() {
    let verdict = validate_contact(&fields("Jo", "jo@x.com"));
    assert!(verdict.is_valid);
    assert!(verdict.errors.is_empty());
}

#[test]
fn validator_collects_every_failure_in_order() {
    let verdict = validate_contact(&fields(" ", "bad"));
    assert_eq!(
        verdict.errors,
        vec![FIRST_NAME_REQUIRED.to_string(), EMAIL_INVALID.to_string()]
    );
}

#[test]
fn validator_is_idempotent() {
    let candidate = fields("", "nope@");
    assert_eq!(validate_contact(&candidate), validate_contact(&candidate));
}

#[test]
fn email_shape_rules() {
    assert!(is_valid_email("a@b.co"));
    assert!(is_valid_email("first.last@sub.example.org"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("a@.com"));
    assert!(!is_valid_email("a@com."));
    assert!(!is_valid_email("@b.com"));
    assert!(!is_valid_email("a b@c.com"));
    assert!(!is_valid_email("a@b@c.com"));
}

#[test]
fn header_table_covers_every_column() {
    for column in ContactColumn::ALL {
        assert!(
            HEADER_VARIANTS.iter().any(|(candidate, _)| *candidate == column),
            "{column:?} should have header variants"
        );
        assert!(!column.accepted_headers().is_empty());
    }
}

#[test]
fn column_map_matches_variants_case_insensitively() {
    let headers: Vec<String> = ["PHONE_NUMBER", " First_Name ", "EMAIL", "Last Name"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let map = ColumnMap::resolve(&headers);
    assert_eq!(map.telephone, Some(0));
    assert_eq!(map.first_name, Some(1));
    assert_eq!(map.email, Some(2));
    assert_eq!(map.last_name, Some(3));
    assert!(map.missing().is_empty());
}

#[test]
fn column_map_reports_absent_columns() {
    let map = ColumnMap::resolve(&["email".to_string()]);
    assert_eq!(
        map.missing(),
        vec![
            ContactColumn::FirstName,
            ContactColumn::LastName,
            ContactColumn::Telephone
        ]
    );
    assert_eq!(map.value(&["x@y.z".to_string()], ContactColumn::Telephone), "");
}

#[test]
fn parser_reads_template_as_two_valid_rows() {
    let template = template_csv().expect("template should render");
    let parsed = parse_contacts_csv(&template).expect("template should parse");

    assert_eq!(parsed.rows.len(), 2);
    for row in &parsed.rows {
        assert!(row.is_valid(), "template row should be valid: {row:?}");
        assert!(row.errors().is_empty());
    }
}

#[test]
fn parser_keeps_invalid_rows_in_file_order() {
    let parsed = parse_contacts_csv(THREE_ROWS).expect("fixture should parse");

    let names: Vec<&str> = parsed
        .rows
        .iter()
        .map(|row| row.fields().last_name.as_str())
        .collect();
    assert_eq!(names, vec!["Lovelace", "Turing", "Hopper"]);
    assert_eq!(parsed.valid_count(), 2);
    assert_eq!(parsed.invalid_count(), 1);
    assert_eq!(
        parsed.rows[2].errors(),
        &[FIRST_NAME_REQUIRED.to_string(), EMAIL_INVALID.to_string()]
    );
    assert_eq!(parsed.rows[0].fields().telephone, "555-0100");
}

#[test]
fn parser_assigns_unique_ids() {
    let parsed = parse_contacts_csv(THREE_ROWS).expect("fixture should parse");
    let mut ids: Vec<RowId> = parsed.rows.iter().map(|row| row.id).collect();
    ids.sort_by_key(|id| id.0);
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn parser_skips_blank_lines_silently() {
    let parsed = parse_contacts_csv("email,firstname\r\n\r\na@b.co,Al\r\n   \r\nc@d.co,Cy\r\n")
        .expect("should parse");
    assert_eq!(parsed.rows.len(), 2);
    assert_eq!(parsed.skipped_blank_lines, 2);
    assert_eq!(parsed.rows[1].fields().first_name, "Cy");
}

#[test]
fn parser_fails_when_fewer_than_two_non_blank_lines() {
    for content in ["", "\n\n", "firstname,email", "firstname,email\n", "\n\nemail\n  \n"] {
        let err = parse_contacts_csv(content).expect_err("should fail");
        assert!(!err.reasons().is_empty(), "content: {content:?}");
    }
}

#[test]
fn parser_distinguishes_short_file_from_blank_data() {
    assert_eq!(parse_contacts_csv("email"), Err(ParseError::TooShort));
    assert_eq!(
        parse_contacts_csv("email\n\n  \n"),
        Err(ParseError::NoDataRows)
    );
}

#[test]
fn parser_tolerates_mismatched_headers() {
    let parsed = parse_contacts_csv("name,mail\nAda,ada@example.com\n").expect("should parse");
    assert_eq!(parsed.rows.len(), 1);
    assert!(!parsed.rows[0].is_valid());
    assert_eq!(parsed.columns.missing().len(), 4);
}

#[test]
fn parser_handles_short_lines_and_quoted_cells() {
    let parsed = parse_contacts_csv(
        "\u{feff}firstName,lastName,email,telephone\n\"Smith, Jr\",,x@y.io\nSolo\n",
    )
    .expect("should parse");
    assert_eq!(parsed.rows[0].fields().first_name, "Smith, Jr");
    assert_eq!(parsed.rows[0].fields().telephone, "");
    assert!(parsed.rows[0].is_valid());
    assert_eq!(parsed.rows[1].errors(), &[EMAIL_REQUIRED.to_string()]);
}

#[test]
fn row_patch_revalidates_and_trims() {
    let mut row = ImportRow::new(RowId::generate(), fields("", "bad"));
    assert!(!row.is_valid());

    let verdict = row.apply_patch(RowPatch::default().first_name(" Jo ").email("jo@x.com"));

    assert!(verdict.is_valid);
    assert!(row.is_valid());
    assert!(row.errors().is_empty());
    assert_eq!(row.fields().first_name, "Jo");
}

#[test]
fn session_mutations_keep_invariants() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let ids: Vec<RowId> = service.session().rows().iter().map(|row| row.id).collect();

    let verdict = service
        .update_row(ids[2], RowPatch::default().first_name("Grace"))
        .expect("row exists");
    assert!(!verdict.is_valid, "email is still malformed");
    assert_eq!(service.session().rows().len(), 3);
    assert_row_invariant(service.session());

    service
        .update_row(ids[2], RowPatch::default().email("grace@example.com"))
        .expect("row exists");
    assert_eq!(service.session().valid_count(), 3);
    assert_row_invariant(service.session());

    service
        .update_row(ids[0], RowPatch::default().email(""))
        .expect("row exists");
    assert_eq!(service.session().rows().len(), 3);
    assert_eq!(service.session().invalid_count(), 1);
    assert_row_invariant(service.session());

    assert!(service.delete_row(ids[1]));
    assert!(!service.delete_row(ids[1]), "second delete is a no-op");
    assert_eq!(service.session().rows().len(), 2);
    assert_row_invariant(service.session());

    let remaining: Vec<RowId> = service.session().rows().iter().map(|row| row.id).collect();
    assert_eq!(remaining, vec![ids[0], ids[2]], "order is preserved");
}

#[test]
fn update_of_unknown_row_changes_nothing() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let before = service.session().clone();

    assert!(service
        .update_row(RowId::generate(), RowPatch::default().first_name("x"))
        .is_none());
    assert_eq!(service.session(), &before);
}

#[test]
fn load_rejects_empty_rows_and_duplicate_ids() {
    let mut session = ImportSession::default();
    assert_eq!(
        session.load_parsed("x.csv", Vec::new()),
        Err(TransitionError::NoRows)
    );

    let id = RowId::generate();
    let rows = vec![
        ImportRow::new(id, fields("A", "a@b.co")),
        ImportRow::new(id, fields("B", "b@b.co")),
    ];
    assert_eq!(
        session.load_parsed("x.csv", rows),
        Err(TransitionError::DuplicateRowId(id))
    );
    assert!(session.is_empty());
}

#[test]
fn commit_snapshots_valid_count() {
    let sink = InMemoryContactSink::new();
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let invalid_id = service
        .session()
        .invalid_rows()
        .next()
        .map(|row| row.id)
        .expect("fixture has an invalid row");

    let imported = service.commit(&sink).expect("commit should succeed");

    assert_eq!(imported, 2);
    assert_eq!(service.session().imported_count(), 2);
    assert_eq!(service.step(), WizardStep::Complete);
    assert_eq!(sink.len(), 2);
    assert!(sink.contacts().iter().all(|contact| !contact.email.is_empty()));

    service.update_row(
        invalid_id,
        RowPatch::default()
            .first_name("Grace")
            .email("grace@example.com"),
    );
    assert_eq!(service.session().valid_count(), 3);
    assert_eq!(
        service.session().imported_count(),
        2,
        "later edits must not change the committed count"
    );
    assert_eq!(service.session().skipped_count(), 1);
}

#[test]
fn commit_requires_a_valid_row() {
    let sink = InMemoryContactSink::new();
    let mut service = service_with_rows(memory_store(), "firstname,email\n,\n");

    let err = service.commit(&sink).expect_err("nothing to commit");
    assert_eq!(err, CommitError::Transition(TransitionError::NoValidRows));
    assert_eq!(service.step(), WizardStep::Preview);
    assert!(sink.is_empty());
}

#[test]
fn rejected_commit_leaves_session_in_preview() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);

    let err = service.commit(&RejectingSink).expect_err("sink refuses");

    assert!(matches!(err, CommitError::Sink(_)));
    assert_eq!(service.step(), WizardStep::Preview);
    assert_eq!(service.session().imported_count(), 0);
}

#[test]
fn session_survives_reload() {
    let store = memory_store();
    let service = service_with_rows(store.clone(), THREE_ROWS);
    assert_eq!(service.step(), WizardStep::Preview);
    drop(service);

    let reopened = SessionService::open(store, SCOPE);

    assert_eq!(reopened.session().rows().len(), 3);
    assert_eq!(reopened.session().valid_count(), 2);
    assert_eq!(reopened.step(), WizardStep::Preview);
    assert_eq!(reopened.session().file_name(), Some("contacts.csv"));
}

#[test]
fn encode_decode_preserves_session() {
    let service = service_with_rows(memory_store(), THREE_ROWS);
    let payload = encode_session(service.session()).expect("should encode");

    let decoded = decode_session(&payload).expect("should decode");

    assert_eq!(&decoded, service.session());
}

#[test]
fn scopes_are_isolated() {
    let store = memory_store();
    let _tab_one = service_with_rows(store.clone(), THREE_ROWS);

    let tab_two = SessionService::open(store, "other-tab");

    assert!(tab_two.session().is_empty());
}

#[test]
fn corrupt_payload_falls_back_to_empty_session() {
    let store = memory_store();
    store
        .save(SCOPE, "{not json")
        .expect("memory store should save");

    let service = SessionService::open(store, SCOPE);

    assert!(service.session().is_empty());
    assert_eq!(service.step(), WizardStep::Upload);
}

#[test]
fn payload_with_duplicate_ids_is_treated_as_corrupt() {
    let service = service_with_rows(memory_store(), THREE_ROWS);
    let payload = encode_session(service.session()).expect("should encode");
    let first = service.session().rows()[0].id.to_string();
    let second = service.session().rows()[1].id.to_string();

    assert!(decode_session(&payload.replace(&second, &first)).is_none());
}

#[test]
fn tampered_validity_is_recomputed_on_load() {
    let service = service_with_rows(memory_store(), THREE_ROWS);
    let payload = encode_session(service.session())
        .expect("should encode")
        .replace("\"isValid\":false", "\"isValid\":true");

    let decoded = decode_session(&payload).expect("should decode");

    assert_eq!(decoded.valid_count(), 2);
    assert_row_invariant(&decoded);
}

#[test]
fn complete_without_imports_redirects_to_upload() {
    let payload = r#"{"version":1,"session":{"step":"complete","rows":[],"importedCount":0}}"#;
    let decoded = decode_session(payload).expect("should decode");
    assert_eq!(decoded.step(), WizardStep::Upload);

    let payload = r#"{"version":1,"session":{"step":"preview","rows":[]}}"#;
    let decoded = decode_session(payload).expect("should decode");
    assert_eq!(decoded.step(), WizardStep::Upload);
}

#[test]
fn unavailable_store_degrades_silently() {
    let mut service = SessionService::open(Arc::new(FailingStore), SCOPE);
    assert!(service.session().is_empty());

    let parsed = parse_contacts_csv(THREE_ROWS).expect("fixture should parse");
    service
        .load_parsed("contacts.csv", parsed.rows)
        .expect("rows load even though saving fails");
    assert_eq!(service.step(), WizardStep::Preview);
    service.discard();
    assert!(service.session().is_empty());
}

#[test]
fn back_keeps_rows_until_next_upload() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);

    service.back_to_upload().expect("back from preview");

    assert_eq!(service.step(), WizardStep::Upload);
    assert_eq!(service.session().rows().len(), 3);

    let parsed = parse_contacts_csv("firstname,email\nZed,z@z.io\n").expect("should parse");
    service
        .load_parsed("second.csv", parsed.rows)
        .expect("rows should load");
    assert_eq!(service.session().rows().len(), 1);
    assert_eq!(service.session().file_name(), Some("second.csv"));
}

#[test]
fn back_from_complete_is_refused() {
    let sink = InMemoryContactSink::new();
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    service.commit(&sink).expect("commit should succeed");

    let err = service.back_to_upload().expect_err("complete cannot go back");
    assert!(matches!(err, TransitionError::WrongStep { .. }));
}

#[test]
fn upload_rejects_bad_files_without_touching_session() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let before = service.session().clone();
    let mut upload = UploadController::new(64);

    let cases = [
        (None, UploadError::NoFile),
        (Some(SelectedFile::new("empty.csv", Vec::new())), UploadError::EmptyFile),
        (
            Some(SelectedFile::new("big.csv", vec![b'a'; 65])),
            UploadError::TooLarge { size: 65, limit: 64 },
        ),
        (
            Some(SelectedFile::new("bin.csv", vec![0xff, 0xfe, 0x00])),
            UploadError::NotUtf8,
        ),
        (
            Some(SelectedFile::new("short.csv", "email\n")),
            UploadError::Parse(ParseError::TooShort),
        ),
    ];

    for (file, expected) in cases {
        let outcome = upload.upload(file.as_ref(), &mut service);
        assert_eq!(outcome, UploadOutcome::Rejected(expected.reasons()));
        assert!(!upload.errors().is_empty());
        assert!(!upload.is_busy());
        assert_eq!(service.session(), &before);
    }
}

#[test]
fn parse_failures_include_template_hint() {
    let reasons = UploadError::Parse(ParseError::NoDataRows).reasons();
    assert_eq!(reasons.len(), 2);
    assert!(reasons[1].contains("template"));
}

#[test]
fn upload_advances_to_preview() {
    let mut service = SessionService::open(memory_store(), SCOPE);
    let mut upload = UploadController::new(1024);

    let outcome = upload.upload(
        Some(&SelectedFile::new("people.csv", THREE_ROWS)),
        &mut service,
    );

    assert_eq!(
        outcome,
        UploadOutcome::Advanced {
            rows: 3,
            valid: 2,
            invalid: 1
        }
    );
    assert_eq!(service.step(), WizardStep::Preview);
    assert!(upload.errors().is_empty());
}

#[test]
fn upload_guards_against_double_submission() {
    let mut service = SessionService::open(memory_store(), SCOPE);
    let mut upload = UploadController::new(1024);

    let ticket = upload.begin().expect("first begin");
    assert!(upload.is_busy());
    assert_eq!(upload.begin(), Err(UploadError::InProgress));

    let file = SelectedFile::new("people.csv", THREE_ROWS);
    let result = read_upload(&file, upload.max_bytes());
    let outcome = upload.finish(ticket, &file.name, result, &mut service);

    assert!(matches!(outcome, UploadOutcome::Advanced { .. }));
    assert!(!upload.is_busy());
}

#[test]
fn abandoned_upload_result_is_discarded() {
    let mut service = SessionService::open(memory_store(), SCOPE);
    let mut upload = UploadController::new(1024);

    let ticket = upload.begin().expect("begin");
    upload.abandon();
    let file = SelectedFile::new("people.csv", THREE_ROWS);
    let outcome = upload.finish(ticket, &file.name, read_upload(&file, 1024), &mut service);

    assert_eq!(outcome, UploadOutcome::Discarded);
    assert!(service.session().is_empty());
}

#[test]
fn preview_filters_and_searches_rows() {
    let service = service_with_rows(memory_store(), THREE_ROWS);
    let mut preview = PreviewController::new();

    assert_eq!(preview.visible_rows(&service).len(), 3);

    preview.set_filter(RowFilter::Invalid);
    assert_eq!(preview.visible_rows(&service).len(), 1);

    preview.set_filter(RowFilter::Valid);
    preview.set_search("TURING");
    let visible = preview.visible_rows(&service);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].fields().first_name, "Alan");

    let counts = preview.counts(&service);
    assert_eq!((counts.total, counts.valid, counts.invalid), (3, 2, 1));
}

#[test]
fn preview_edit_form_round_trip() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let mut preview = PreviewController::new();
    let invalid_id = service
        .session()
        .invalid_rows()
        .next()
        .map(|row| row.id)
        .expect("fixture has an invalid row");

    assert!(preview.start_edit(&service, invalid_id));
    let draft = preview.draft().expect("draft open").clone();
    assert_eq!(draft.fields.last_name, "Hopper");
    assert!(!draft.verdict().is_valid);

    preview.edit_draft(|fields| {
        fields.first_name = "Grace".to_string();
        fields.email = "grace@example.com".to_string();
    });
    assert!(preview.draft().expect("draft open").verdict().is_valid);

    let verdict = preview.save_edit(&mut service).expect("row exists");
    assert!(verdict.is_valid);
    assert!(preview.draft().is_none());
    assert_eq!(service.session().valid_count(), 3);
}

#[test]
fn preview_delete_closes_matching_draft() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let mut preview = PreviewController::new();
    let id = service.session().rows()[0].id;

    preview.start_edit(&service, id);
    assert!(preview.delete(&mut service, id));
    assert!(preview.draft().is_none());
    assert!(!preview.start_edit(&service, id));
}

#[test]
fn preview_commit_disabled_without_valid_rows() {
    let sink = InMemoryContactSink::new();
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let mut preview = PreviewController::new();
    let valid_ids: Vec<RowId> = service.session().valid_rows().map(|row| row.id).collect();
    for id in valid_ids {
        preview.delete(&mut service, id);
    }

    assert!(!preview.can_commit(&service));
    assert!(preview.commit(&mut service, &sink).is_err());
    assert_eq!(service.step(), WizardStep::Preview);
}

#[test]
fn complete_summary_and_exits() {
    let store = memory_store();
    let sink = InMemoryContactSink::new();
    let mut service = service_with_rows(store.clone(), THREE_ROWS);
    assert!(CompleteController::summary(&service).is_none());

    service.commit(&sink).expect("commit should succeed");
    let summary = CompleteController::summary(&service).expect("complete");
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.file_name.as_deref(), Some("contacts.csv"));
    assert!(summary.committed_at.is_some());

    CompleteController::import_more(&mut service);
    assert!(service.session().is_empty());
    assert_eq!(service.step(), WizardStep::Upload);

    let mut service = service_with_rows(store.clone(), THREE_ROWS);
    service.commit(&sink).expect("commit should succeed");
    CompleteController::finish(&mut service);
    assert_eq!(store.load(SCOPE).expect("memory store loads"), None);
}

#[test]
fn wizard_runs_full_flow_and_resumes() {
    let store = memory_store();
    let sink = Arc::new(InMemoryContactSink::new());

    let mut wizard = ImportWizard::enter(store.clone(), SCOPE, sink.clone(), 1024);
    assert_eq!(wizard.step(), WizardStep::Upload);

    let outcome = wizard.upload_now(Some(&SelectedFile::new("people.csv", THREE_ROWS)));
    assert!(matches!(outcome, UploadOutcome::Advanced { .. }));
    let invalid_id = wizard
        .session()
        .session()
        .invalid_rows()
        .next()
        .map(|row| row.id)
        .expect("fixture has an invalid row");
    assert!(wizard.delete_row(invalid_id));
    wizard.exit();

    let mut wizard = ImportWizard::enter(store.clone(), SCOPE, sink.clone(), 1024);
    assert_eq!(wizard.checked_step(), WizardStep::Preview);
    assert_eq!(wizard.session().session().rows().len(), 2);

    assert_eq!(wizard.commit().expect("commit should succeed"), 2);
    assert_eq!(wizard.step(), WizardStep::Complete);
    assert_eq!(wizard.completion().map(|summary| summary.imported), Some(2));
    assert_eq!(sink.len(), 2);

    wizard.finish();
    assert_eq!(wizard.step(), WizardStep::Upload);
    assert_eq!(store.load(SCOPE).expect("memory store loads"), None);
}

#[test]
fn invalid_rows_export_lists_reasons() {
    let parsed = parse_contacts_csv(THREE_ROWS).expect("fixture should parse");

    let exported = invalid_rows_csv(&parsed.rows).expect("should export");
    let lines: Vec<&str> = exported.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "firstName,lastName,email,telephone,errors");
    assert!(lines[1].contains("Hopper"));
    assert!(lines[1].contains(FIRST_NAME_REQUIRED));
    assert!(lines[1].contains(EMAIL_INVALID));

    let reparsed = parse_contacts_csv(&exported).expect("export should parse again");
    assert_eq!(reparsed.rows.len(), 1);
    assert_eq!(reparsed.rows[0].fields().email, "grace@example");
}

#[test]
fn sqlite_store_persists_and_clears_sessions() {
    let temp_dir = unique_test_dir("sqlite-store");
    let db_path = temp_dir.join("session.sqlite");

    let store: Arc<dyn SessionStore> = Arc::new(
        SqliteSessionStore::open(db_path.clone(), 24).expect("store should open"),
    );
    let service = service_with_rows(store.clone(), THREE_ROWS);
    drop(service);

    let mut reopened = SessionService::open(store.clone(), SCOPE);
    assert_eq!(reopened.session().rows().len(), 3);
    assert_eq!(reopened.step(), WizardStep::Preview);
    assert_eq!(count_sessions(&db_path).expect("count"), 1);

    reopened.discard();
    assert_eq!(store.load(SCOPE).expect("load"), None);
    assert_eq!(count_sessions(&db_path).expect("count"), 0);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_store_drops_expired_sessions_on_open() {
    let temp_dir = unique_test_dir("sqlite-expiry");
    let db_path = temp_dir.join("session.sqlite");
    SqliteSessionStore::open(db_path.clone(), 24).expect("store should open");
    save_session_payload(&db_path, SCOPE, "{}").expect("should save");

    let conn = rusqlite::Connection::open(&db_path).expect("should open sqlite db");
    conn.execute(
        "UPDATE import_session SET updated_at = datetime('now', '-48 hours')",
        [],
    )
    .expect("should age session");
    drop(conn);

    let store = SqliteSessionStore::open(db_path.clone(), 24).expect("store should reopen");
    assert_eq!(store.load(SCOPE).expect("load"), None);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn config_defaults_and_overrides() {
    let cache = PathBuf::from("/tmp/cache");
    let data = PathBuf::from("/tmp/data");

    let defaults = AppConfig::from_sources(&cache, &data, |_| None).expect("defaults");
    assert_eq!(defaults.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(defaults.session_scope, DEFAULT_SESSION_SCOPE);
    assert_eq!(defaults.session_db_path, cache.join("session.sqlite"));
    assert_eq!(defaults.webview_data_dir, data.join("webview2"));

    let overridden = AppConfig::from_sources(&cache, &data, |key| match key {
        "CONTACT_IMPORT_MAX_UPLOAD_BYTES" => Some("2048".to_string()),
        "CONTACT_IMPORT_SESSION_SCOPE" => Some(" window-2 ".to_string()),
        "CONTACT_IMPORT_SESSION_DB" => Some("/var/tmp/s.sqlite".to_string()),
        _ => None,
    })
    .expect("overrides");
    assert_eq!(overridden.max_upload_bytes, 2048);
    assert_eq!(overridden.session_scope, "window-2");
    assert_eq!(overridden.session_db_path, PathBuf::from("/var/tmp/s.sqlite"));
}

#[test]
fn config_rejects_bad_overrides() {
    let cache = PathBuf::from("/tmp/cache");
    let data = PathBuf::from("/tmp/data");

    let err = AppConfig::from_sources(&cache, &data, |key| {
        (key == "CONTACT_IMPORT_MAX_UPLOAD_BYTES").then(|| "0".to_string())
    })
    .expect_err("zero is not allowed");
    assert!(matches!(err, ConfigError::InvalidNumber { .. }));

    let err = AppConfig::from_sources(&cache, &data, |key| {
        (key == "CONTACT_IMPORT_SESSION_SCOPE").then(|| "  ".to_string())
    })
    .expect_err("blank scope is not allowed");
    assert!(matches!(err, ConfigError::Empty { .. }));
}

#[test]
fn format_bytes_picks_unit() {
    assert_eq!(crate::format_bytes(512), "512 B");
    assert_eq!(crate::format_bytes(2048), "2.0 KB");
    assert_eq!(crate::format_bytes(DEFAULT_MAX_UPLOAD_BYTES), "5.0 MB");
}

#[test]
fn deleting_every_row_falls_back_to_upload() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let ids: Vec<RowId> = service.session().rows().iter().map(|row| row.id).collect();
    for id in ids {
        assert!(service.delete_row(id));
    }
    assert_eq!(service.step(), WizardStep::Preview);

    assert_eq!(service.enforce_invariants(), WizardStep::Upload);
    assert!(service.session().rows().is_empty());
}

#[test]
fn wizard_leaves_empty_preview_after_last_delete() {
    let store = memory_store();
    let sink = Arc::new(InMemoryContactSink::new());
    let mut wizard = ImportWizard::enter(store.clone(), SCOPE, sink, 1024);
    wizard.upload_now(Some(&SelectedFile::new("people.csv", THREE_ROWS)));
    let ids: Vec<RowId> = wizard
        .session()
        .session()
        .rows()
        .iter()
        .map(|row| row.id)
        .collect();
    wizard.start_edit(ids[0]);

    for id in ids {
        assert!(wizard.delete_row(id), "row {id} should be deleted");
    }

    assert_eq!(wizard.step(), WizardStep::Upload);
    assert_eq!(wizard.checked_step(), WizardStep::Upload);
    assert!(wizard.preview().draft().is_none());
    assert!(!wizard.upload().is_busy());

    let reopened = SessionService::open(store, SCOPE);
    assert_eq!(reopened.step(), WizardStep::Upload, "repair should be persisted");
}

#[test]
fn refused_rows_report_the_real_reason() {
    let mut service = service_with_rows(memory_store(), THREE_ROWS);
    let before = service.session().clone();
    let mut upload = UploadController::new(1024);
    let id = RowId::generate();
    let parsed = ParsedContacts {
        columns: ColumnMap::default(),
        rows: vec![
            ImportRow::new(id, fields("A", "a@b.co")),
            ImportRow::new(id, fields("B", "b@b.co")),
        ],
        skipped_blank_lines: 0,
    };

    let ticket = upload.begin().expect("begin");
    let outcome = upload.finish(ticket, "dupes.csv", Ok(parsed), &mut service);

    let expected = UploadError::Refused(TransitionError::DuplicateRowId(id));
    assert_eq!(outcome, UploadOutcome::Rejected(expected.reasons()));
    assert!(upload.errors()[0].contains("duplicate row id"));
    assert!(!upload.errors()[0].contains("No data rows"));
    assert_eq!(service.session(), &before);
}

#[test]
fn contact_fields_are_addressed_by_column() {
    let mut contact = ContactFields::default();
    for column in ContactColumn::ALL {
        contact.set(column, column.label());
    }

    assert_eq!(contact.first_name, "First name");
    assert_eq!(contact.get(ContactColumn::Telephone), "Telephone");
    let required: Vec<ContactColumn> = ContactColumn::ALL
        .into_iter()
        .filter(|column| column.is_required())
        .collect();
    assert_eq!(required, vec![ContactColumn::FirstName, ContactColumn::Email]);
}
