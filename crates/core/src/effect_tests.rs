// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_names_use_category_prefix() {
    let id = JobId::from("j");
    assert_eq!(
        Event::SliceYielded {
            id: id.clone(),
            stage: "MAP".into(),
            yields: 2
        }
        .name(),
        "slice:yielded"
    );
    assert_eq!(
        Event::CancelRequested { id: id.clone() }.name(),
        "job:cancel_requested"
    );
    assert_eq!(Event::CancelRequested { id: id.clone() }.job_id(), &id);
}

#[test]
fn emit_fields_include_event_details() {
    let effect = Effect::Emit(Event::JobFailed {
        id: JobId::from("j"),
        stage: "INPUT".into(),
        reason: "no such file".into(),
        at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
    });
    assert_eq!(effect.name(), "emit");
    assert_eq!(
        effect.fields(),
        vec![
            ("event", "job:failed".to_string()),
            ("stage", "INPUT".to_string()),
            ("reason", "no such file".to_string()),
        ]
    );
    assert!(Effect::SaveCheckpoint.fields().is_empty());
    assert_eq!(
        effect.describe(),
        "emit event=job:failed stage=INPUT reason=no such file"
    );
    assert_eq!(Effect::Archive.describe(), "archive");
}

#[test]
fn effects_serialize() {
    let effects = vec![
        Effect::Archive,
        Effect::SaveCheckpoint,
        Effect::Emit(Event::JobSubmitted {
            id: JobId::from("j"),
            definition: "word-count".into(),
        }),
    ];
    for effect in effects {
        let json = serde_json::to_string(&effect).unwrap();
        let parsed: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(effect, parsed);
    }
}
