use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use form_engine::{
    RenderStatus, Session, SessionError, SessionOptions, SubmitOutcome, build_render_payload,
    render_text,
};
use form_spec::{FieldKind, FieldSpec, FieldValidator, VisibilityRule};

fn field(id: &str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        required,
        ..FieldSpec::new(id, kind)
    }
}

fn select(id: &str, required: bool, options: &[&str]) -> FieldSpec {
    FieldSpec {
        options: Some(options.iter().map(|option| option.to_string()).collect()),
        ..field(id, FieldKind::SingleSelect, required)
    }
}

fn dependent(mut spec: FieldSpec, depends_on: &str, allowed: &[&str]) -> FieldSpec {
    spec.visibility_rule = Some(VisibilityRule {
        depends_on: depends_on.to_string(),
        allowed_values: allowed.iter().map(|value| value.to_string()).collect(),
    });
    spec
}

/// The role/detail catalogue used by several scenarios: `detail` is only
/// visible while `role` is answered with "A".
fn role_detail_catalogue() -> Vec<FieldSpec> {
    vec![
        select("role", true, &["A", "B"]),
        dependent(field("detail", FieldKind::ShortText, true), "role", &["A"]),
    ]
}

fn answers(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn selecting_the_bypass_branch_completes_immediately() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());
    assert_eq!(session.visible_fields().len(), 1);

    session.submit("role", json!("B")).unwrap();
    assert!(session.is_complete());
    assert_eq!(session.completion_fraction(), 1.0);
}

#[test]
fn selecting_the_detail_branch_reveals_the_dependent_field() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());

    session.submit("role", json!("A")).unwrap();
    assert!(!session.is_complete());
    assert_eq!(session.visible_fields().len(), 2);
    assert_eq!(session.current_field().unwrap().id, "detail");
    assert_eq!(session.completion_fraction(), 0.5);

    session.submit("detail", json!("backend")).unwrap();
    assert!(session.is_complete());
    assert_eq!(session.completion_fraction(), 1.0);
}

#[test]
fn resume_positions_cursor_on_first_incomplete_field() {
    let session = Session::new(
        role_detail_catalogue(),
        answers(&[("role", json!("A"))]),
        SessionOptions::default(),
    );
    assert!(session.is_field_completed("role"));
    assert_eq!(session.current_field().unwrap().id, "detail");
    assert_eq!(session.completion_fraction(), 0.5);
}

#[test]
fn resume_with_invalid_answer_keeps_value_but_not_completion() {
    let session = Session::new(
        role_detail_catalogue(),
        answers(&[("role", json!(""))]),
        SessionOptions::default(),
    );
    assert!(!session.is_field_completed("role"));
    assert_eq!(session.answers().get("role"), Some(&json!("")));
    assert!(session.errors().contains_key("role"));
    assert_eq!(session.current_field().unwrap().id, "role");
}

#[test]
fn initialization_is_idempotent() {
    let initial = answers(&[("role", json!("A")), ("detail", json!("infra"))]);
    let first = Session::new(
        role_detail_catalogue(),
        initial.clone(),
        SessionOptions::default(),
    );
    let second = Session::new(role_detail_catalogue(), initial, SessionOptions::default());

    assert_eq!(first.answers(), second.answers());
    assert_eq!(first.cursor(), second.cursor());
    assert_eq!(first.is_complete(), second.is_complete());
    let first_completed: BTreeSet<&str> = first
        .fields()
        .iter()
        .filter(|field| first.is_field_completed(&field.id))
        .map(|field| field.id.as_str())
        .collect();
    let second_completed: BTreeSet<&str> = second
        .fields()
        .iter()
        .filter(|field| second.is_field_completed(&field.id))
        .map(|field| field.id.as_str())
        .collect();
    assert_eq!(first_completed, second_completed);
}

#[test]
fn completion_fraction_is_monotone_across_successful_submits() {
    let mut session = Session::new(
        vec![
            field("name", FieldKind::ShortText, true),
            select("team", true, &["core", "infra"]),
            dependent(field("infra_area", FieldKind::ShortText, true), "team", &["infra"]),
            field("notes", FieldKind::LongText, false),
        ],
        Map::new(),
        SessionOptions::default(),
    );

    let submissions = [
        ("name", json!("Ada")),
        ("team", json!("infra")),
        ("infra_area", json!("networking")),
        ("notes", json!("n/a")),
    ];

    let mut last = session.completion_fraction();
    for (id, value) in submissions {
        let outcome = session.submit(id, value).unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted);
        let fraction = session.completion_fraction();
        assert!(fraction >= last, "fraction dropped after submitting '{id}'");
        last = fraction;
    }
    assert!(session.is_complete());
}

#[test]
fn is_complete_matches_visible_completion_exactly() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());

    let all_done = |session: &Session| {
        session
            .visible_fields()
            .iter()
            .all(|field| session.is_field_completed(&field.id))
    };

    assert_eq!(session.is_complete(), all_done(&session));
    session.submit("role", json!("A")).unwrap();
    assert_eq!(session.is_complete(), all_done(&session));
    session.submit("detail", json!("backend")).unwrap();
    assert_eq!(session.is_complete(), all_done(&session));
}

#[test]
fn hidden_field_retains_its_answer_across_a_hide_show_cycle() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());

    session.submit("role", json!("A")).unwrap();
    session.submit("detail", json!("payments")).unwrap();
    assert!(session.is_complete());

    // Flipping the controlling answer hides `detail` without deleting it.
    session.jump_to("role").unwrap();
    session.submit("role", json!("B")).unwrap();
    assert_eq!(session.visible_fields().len(), 1);
    assert_eq!(session.answers().get("detail"), Some(&json!("payments")));
    assert!(session.is_complete());

    // Flipping back restores the prior input and the completion that came
    // with it.
    session.jump_to("role").unwrap();
    session.submit("role", json!("A")).unwrap();
    assert!(session.visible_fields().iter().any(|field| field.id == "detail"));
    assert_eq!(session.answers().get("detail"), Some(&json!("payments")));
    assert!(session.is_complete());
}

#[test]
fn changing_an_earlier_answer_moves_cursor_to_revealed_field() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());

    session.submit("role", json!("B")).unwrap();
    assert!(session.is_complete());

    session.jump_to("role").unwrap();
    assert!(!session.is_complete());
    session.submit("role", json!("A")).unwrap();
    assert_eq!(session.current_field().unwrap().id, "detail");
    assert!(!session.is_complete());
}

#[test]
fn optional_session_never_blocks_on_required_fields() {
    let mut session = Session::new(
        vec![
            field("nickname", FieldKind::ShortText, true),
            field("bio", FieldKind::LongText, true),
        ],
        Map::new(),
        SessionOptions {
            optional_session: true,
        },
    );

    session.force_advance("nickname", json!("")).unwrap();
    assert_eq!(session.current_field().unwrap().id, "bio");
    assert!(session.errors().is_empty());

    session.force_advance("bio", json!("")).unwrap();
    assert!(session.is_complete());
}

#[test]
fn force_advance_records_custom_validator_failure_without_blocking() {
    let mut checked = vec![FieldSpec {
        validator: Some(FieldValidator::new(|value| {
            (value.as_str() != Some("ok")).then(|| "must be 'ok'".to_string())
        })),
        ..field("gate", FieldKind::ShortText, false)
    }];
    checked.push(field("after", FieldKind::ShortText, false));

    let mut session = Session::new(
        checked,
        Map::new(),
        SessionOptions {
            optional_session: true,
        },
    );

    session.force_advance("gate", json!("nope")).unwrap();
    assert_eq!(session.errors().get("gate"), Some(&"must be 'ok'".to_string()));
    assert!(!session.is_field_completed("gate"));
    assert_eq!(session.current_field().unwrap().id, "after");

    session.force_advance("after", json!("")).unwrap();
    assert!(session.is_complete());
}

#[test]
fn submit_on_hidden_field_fails_loudly() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());
    let error = session.submit("detail", json!("early")).unwrap_err();
    assert_eq!(error, SessionError::FieldNotVisible("detail".into()));
}

#[test]
fn jump_to_unknown_field_fails_loudly() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());
    let error = session.jump_to("nope").unwrap_err();
    assert_eq!(error, SessionError::UnknownField("nope".into()));
}

#[test]
fn previous_is_rejected_once_complete() {
    let mut session = Session::new(
        vec![field("only", FieldKind::ShortText, false)],
        Map::new(),
        SessionOptions::default(),
    );
    session.submit("only", json!("done")).unwrap();
    assert!(session.is_complete());
    let error = session.previous().unwrap_err();
    assert_eq!(error, SessionError::NotInProgress("previous"));
}

#[test]
fn empty_visible_catalogue_is_complete_at_full_fraction() {
    // A forward dependency can never resolve, so nothing is ever visible.
    let session = Session::new(
        vec![dependent(
            field("orphan", FieldKind::ShortText, true),
            "later",
            &["yes"],
        )],
        Map::new(),
        SessionOptions::default(),
    );
    assert!(session.is_complete());
    assert_eq!(session.completion_fraction(), 1.0);
    assert!(session.current_field().is_none());

    let empty = Session::new(Vec::new(), Map::new(), SessionOptions::default());
    assert!(empty.is_complete());
    assert_eq!(empty.completion_fraction(), 1.0);
}

#[test]
fn numeric_zero_counts_as_present_across_value_grid() {
    let catalogue = || vec![field("count", FieldKind::Numeric, true)];
    for value in [json!(0), json!(0.0), json!("0"), json!(7), json!(-3.5)] {
        let mut session = Session::new(catalogue(), Map::new(), SessionOptions::default());
        let outcome = session.submit("count", value.clone()).unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Accepted,
            "numeric value {value} should satisfy the required check"
        );
        assert!(session.is_complete());
    }

    let mut session = Session::new(catalogue(), Map::new(), SessionOptions::default());
    let outcome = session.submit("count", json!("")).unwrap();
    assert_eq!(outcome, SubmitOutcome::Rejected);
}

#[test]
fn required_multi_select_needs_a_non_empty_sequence() {
    let catalogue = vec![FieldSpec {
        options: Some(vec!["a".into(), "b".into()]),
        ..field("tags", FieldKind::MultiSelect, true)
    }];
    let mut session = Session::new(catalogue, Map::new(), SessionOptions::default());

    let outcome = session.submit("tags", json!([])).unwrap();
    assert_eq!(outcome, SubmitOutcome::Rejected);

    let outcome = session.submit("tags", json!(["a"])).unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);
    assert!(session.is_complete());
}

#[test]
fn render_payload_reflects_session_state() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());
    session.submit("role", json!("A")).unwrap();

    let payload = build_render_payload(&session);
    assert_eq!(payload.status, RenderStatus::NeedInput);
    assert_eq!(payload.current_field_id.as_deref(), Some("detail"));
    assert_eq!(payload.progress.completed, 1);
    assert_eq!(payload.progress.total, 2);

    let text = render_text(&payload);
    assert!(text.contains("Current field: detail"));
    assert!(text.contains("role"));

    session.submit("detail", json!("ship it")).unwrap();
    let payload = build_render_payload(&session);
    assert_eq!(payload.status, RenderStatus::Complete);
    assert!(payload.current_field_id.is_none());
}

#[test]
fn snapshot_round_trips_through_cbor() {
    let mut session = Session::new(role_detail_catalogue(), Map::new(), SessionOptions::default());
    session.submit("role", json!("A")).unwrap();
    session.submit("detail", json!("search")).unwrap();

    let bytes = session.snapshot().to_cbor().unwrap();
    let restored = form_spec::AnswerSet::from_cbor(&bytes).unwrap();
    let resumed = Session::new(
        role_detail_catalogue(),
        restored.answers,
        SessionOptions::default(),
    );
    assert!(resumed.is_complete());
    assert_eq!(resumed.answers(), session.answers());
}
