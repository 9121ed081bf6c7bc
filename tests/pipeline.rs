//! Pipeline Integration Tests
//!
//! Drives full runs through in-memory collaborators: forward flow, gate
//! loop-backs, restarts and stage failures.

mod common;

use clipforge::adapters::CollaboratorError;
use clipforge::core::{KeywordGate, PipelineSettings};
use clipforge::domain::{ArtifactRef, RunState, Stage, StageOutcome};
use clipforge::PipelineError;
use tokio_test::{assert_err, assert_ok};

use common::*;

#[tokio::test]
async fn test_straight_through_run() {
    let script = script(1);
    assert!(script.len() > 100);

    let harness = Harness::new(ScriptedText::ok(&[
        &script,
        "Score: 9. Strong hook.",
        "Audio levels are balanced and pacing is tight.",
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(run.state, RunState::Completed);
    assert_eq!(
        run.stage_trail(),
        vec![
            Stage::GenerateScript,
            Stage::EvaluateScript,
            Stage::SynthesizeSpeech,
            Stage::FetchRawVideo,
            Stage::MergeAudioVideo,
            Stage::EvaluateFinal,
            Stage::PersistOutput,
        ]
    );
    assert_eq!(run.script_generations, 1);
    assert_eq!(run.restarts, 0);
    assert!(run
        .history
        .iter()
        .all(|e| e.outcome == StageOutcome::Completed));

    let output = run.output_name.clone().unwrap();
    assert!(is_output_name(&output), "{}", output);
}

#[tokio::test]
async fn test_prompts_carry_topic_and_artifacts() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9", "Great."]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    assert_ok!(orchestrator.run_once("artificial intelligence").await);

    let prompts = harness.text.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("story about artificial intelligence"));
    assert!(prompts[1].contains(&script(1)));
    assert!(prompts[2].contains("https://merge.example.com/out-1.mp4"));

    let params: Vec<_> = harness
        .text
        .prompts
        .lock()
        .unwrap()
        .iter()
        .map(|(_, p)| (p.temperature, p.max_output_tokens))
        .collect();
    assert_eq!(params, vec![(0.8, 250), (0.5, 150), (0.5, 200)]);
}

#[tokio::test]
async fn test_artifacts_flow_between_collaborators() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 10", "Great."]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(harness.speech.texts.lock().unwrap().clone(), vec![script(1)]);
    assert_eq!(harness.assets.fetches.lock().unwrap().clone(), vec![RAW_VIDEO_ID]);

    let merges = harness.merger.inputs.lock().unwrap().clone();
    assert_eq!(
        merges,
        vec![(
            ArtifactRef::inline(b"audio-1".to_vec()),
            ArtifactRef::url(RAW_VIDEO_URL),
            0
        )]
    );

    let persisted = harness.persisted();
    assert_eq!(persisted.len(), 1);
    let (artifact, folder, name) = &persisted[0];
    assert_eq!(artifact, &ArtifactRef::url("https://merge.example.com/out-1.mp4"));
    assert_eq!(folder, OUTPUT_FOLDER_ID);
    assert_eq!(Some(name), run.output_name.as_ref());
}

#[tokio::test]
async fn test_low_script_score_regenerates_with_same_topic() {
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "Score: 4, needs more tension",
        &script(2),
        "Score: 8",
        "Great.",
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(run.script_generations, 2);
    assert_eq!(run.rework_count(Stage::EvaluateScript), 1);
    assert_eq!(run.script.as_deref(), Some(script(2).as_str()));

    // Regeneration reuses the same prompt; the critique is not fed back
    let prompts = harness.text.prompts();
    assert_eq!(prompts[0], prompts[2]);
    assert!(!prompts[2].contains("tension"));

    // Only the accepted script is voiced
    assert_eq!(harness.speech.texts.lock().unwrap().clone(), vec![script(2)]);
    assert_eq!(
        &run.stage_trail()[..4],
        &[
            Stage::GenerateScript,
            Stage::EvaluateScript,
            Stage::GenerateScript,
            Stage::EvaluateScript
        ]
    );
}

#[tokio::test]
async fn test_script_rework_repeats_until_pass() {
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "Score: 1",
        &script(2),
        "Score: 7/10",
        &script(3),
        "Score: 5",
        &script(4),
        "No score given, looks fine",
        "Great.",
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(run.script_generations, 4);
    assert_eq!(run.rework_count(Stage::EvaluateScript), 3);
    assert_eq!(harness.speech_calls(), 1);
    assert_eq!(harness.text.remaining(), 0);
}

#[tokio::test]
async fn test_final_rejection_restarts_whole_run() {
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "Score: 9",
        "I suggest raising the music volume.",
        &script(2),
        "Score: 9",
        "Meets viral standards.",
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(run.restarts, 1);
    assert_eq!(run.script_generations, 2);
    assert_eq!(run.rework_count(Stage::EvaluateFinal), 1);
    assert_eq!(harness.speech_calls(), 2);
    assert_eq!(harness.fetch_calls(), 2);
    assert_eq!(harness.merge_calls(), 2);

    // The second pass voices the new script and persists the second merge
    assert_eq!(harness.speech.texts.lock().unwrap()[1], script(2));
    let persisted = harness.persisted();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].0, ArtifactRef::url("https://merge.example.com/out-2.mp4"));

    let trail = run.stage_trail();
    let restart_at = trail
        .iter()
        .position(|s| *s == Stage::EvaluateFinal)
        .unwrap();
    assert_eq!(trail[restart_at + 1], Stage::GenerateScript);
}

#[tokio::test]
async fn test_final_rework_keyword_is_case_insensitive() {
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "Score: 9",
        "SUGGESTION: tighten the ending",
        &script(2),
        "Score: 9",
        "Ship it.",
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);
    assert_eq!(run.restarts, 1);
}

#[tokio::test]
async fn test_speech_evaluation_disabled_by_default() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9", "Great."]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);
    assert!(!run.stage_trail().contains(&Stage::EvaluateSpeech));
}

#[tokio::test]
async fn test_speech_rework_resynthesizes_only_audio() {
    let settings = PipelineSettings {
        speech_evaluation: true,
        ..Default::default()
    };
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "Score: 9",
        "I'd suggest slowing down the second sentence.",
        "OK",
        "Great.",
    ]));
    let orchestrator = harness.orchestrator(settings);

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(run.script_generations, 1);
    assert_eq!(run.rework_count(Stage::EvaluateSpeech), 1);
    assert_eq!(harness.speech_calls(), 2);
    assert_eq!(
        &run.stage_trail()[2..6],
        &[
            Stage::SynthesizeSpeech,
            Stage::EvaluateSpeech,
            Stage::SynthesizeSpeech,
            Stage::EvaluateSpeech
        ]
    );

    // The voiceover prompt describes the audio, never its raw bytes
    let prompts = harness.text.prompts();
    assert!(prompts[2].contains("<inline media, 7 bytes>"));

    // The merge uses the resynthesized audio
    let merges = harness.merger.inputs.lock().unwrap().clone();
    assert_eq!(merges[0].0, ArtifactRef::inline(b"audio-2".to_vec()));
}

#[tokio::test]
async fn test_generation_failure_ends_run() {
    let harness = Harness::new(ScriptedText::new(vec![Err(failure("gemini"))]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(err.stage(), Some(Stage::GenerateScript));
    assert!(err.to_string().contains("generate_script"));
    assert_eq!(harness.speech_calls(), 0);
}

#[tokio::test]
async fn test_empty_script_ends_run() {
    let harness = Harness::new(ScriptedText::ok(&["   \n"]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    match err {
        PipelineError::Stage { stage, source, run } => {
            assert_eq!(stage, Stage::GenerateScript);
            assert!(matches!(source, CollaboratorError::Empty { .. }));
            assert!(run.script.is_none());
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates_from_evaluator_ends_run() {
    let harness = Harness::new(ScriptedText::new(vec![
        Ok(script(1)),
        Err(CollaboratorError::empty("gemini", "no candidates in response")),
    ]));
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(err.stage(), Some(Stage::EvaluateScript));
    assert_eq!(harness.speech_calls(), 0);
}

#[tokio::test]
async fn test_speech_failure_ends_run() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9"]))
        .with_speech(FakeSpeech {
            fail: true,
            ..Default::default()
        });
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(err.stage(), Some(Stage::SynthesizeSpeech));
    assert_eq!(harness.fetch_calls(), 0);
}

#[tokio::test]
async fn test_fetch_failure_ends_run() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9"])).with_assets(FakeAssets {
        fail_fetch: true,
        ..Default::default()
    });
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    assert_eq!(err.stage(), Some(Stage::FetchRawVideo));
    assert_eq!(harness.merge_calls(), 0);
}

#[tokio::test]
async fn test_merge_failure_ends_run() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9"])).with_merger(FakeMerger {
        fail: true,
        ..Default::default()
    });
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    let PipelineError::Stage { stage, run, .. } = err else {
        panic!("expected a stage failure");
    };
    assert_eq!(stage, Stage::MergeAudioVideo);
    assert!(matches!(
        run.state,
        RunState::Failed {
            stage: Stage::MergeAudioVideo,
            ..
        }
    ));

    let last = run.history.last().unwrap();
    assert_eq!(last.outcome, StageOutcome::Failed);
    assert!(last.error.as_deref().unwrap().contains("503"));

    // The final evaluator was never asked
    assert_eq!(harness.text.prompts().len(), 2);
    assert!(harness.persisted().is_empty());
}

#[tokio::test]
async fn test_persist_failure_ends_run() {
    let harness = Harness::new(ScriptedText::ok(&[&script(1), "Score: 9", "Great."])).with_assets(
        FakeAssets {
            fail_persist: true,
            ..Default::default()
        },
    );
    let orchestrator = harness.orchestrator(PipelineSettings::default());

    let err = assert_err!(orchestrator.run_once("artificial intelligence").await);

    let PipelineError::Stage { stage, run, .. } = err else {
        panic!("expected a stage failure");
    };
    assert_eq!(stage, Stage::PersistOutput);
    assert!(run.output_name.is_none());
}

#[tokio::test]
async fn test_custom_script_gate() {
    let harness = Harness::new(ScriptedText::ok(&[
        &script(1),
        "reject: too long",
        &script(2),
        "Score: 2 but acceptable",
        "Great.",
    ]));
    let orchestrator = harness
        .orchestrator(PipelineSettings::default())
        .with_script_gate(Box::new(KeywordGate {
            keyword: "reject".to_string(),
        }));

    let run = assert_ok!(orchestrator.run_once("artificial intelligence").await);
    assert_eq!(run.script_generations, 2);
}
