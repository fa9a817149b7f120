mod common;

use std::path::Path;

use common::*;
use ragplan::templates::{TemplateLibrary, CONFIG_FILE, PROMPT_FILE};
use ragplan::{ApproachError, PlannerApproach, RagApproach};

fn write_template(root: &Path, body: &str, config: &str) {
    let dir = root.join("RAG").join("AnswerQuestion");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(PROMPT_FILE), body).unwrap();
    std::fs::write(dir.join(CONFIG_FILE), config).unwrap();
}

#[test]
fn test_resource_directory_matches_bundled_copy() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/plugins");
    let from_disk = TemplateLibrary::from_dir(&root)
        .load("RAG", "AnswerQuestion")
        .unwrap();
    let bundled = TemplateLibrary::Bundled.load("RAG", "AnswerQuestion").unwrap();

    assert_eq!(from_disk.description, bundled.description);
    assert_eq!(from_disk.parameters, bundled.parameters);
    assert_eq!(from_disk.completion, bundled.completion);
}

#[tokio::test]
async fn test_custom_template_drives_the_answer_prompt() {
    let root = tempfile::tempdir().unwrap();
    write_template(
        root.path(),
        "CUSTOM PROMPT\n{{$sources}}\nQ={{$input}}",
        "version: \"2.0.0\"\ndescription: Answer briefly\nparameters:\n  - name: input\n    description: question\n  - name: sources\n    description: context\n",
    );

    let llm = ScriptedLLM::new(TWO_STEP_PLAN, "42,000 seats");
    let search = CountingSearch::new(vec![stadium_source()]);
    let approach = PlannerApproach::new(
        providers(&llm, &search, None),
        TemplateLibrary::from_dir(root.path()),
        "Answer the question",
    )
    .unwrap();

    let response = approach
        .run("How big is stadium X?", &text_options())
        .await
        .unwrap();
    assert_eq!(response.answer, "42,000 seats");

    let prompt = llm.completion_prompts.lock().unwrap()[0].clone();
    assert!(prompt.starts_with("CUSTOM PROMPT\nstadium-x.pdf#page=4"));
    assert!(prompt.ends_with("Q=How big is stadium X?"));

    let planning = llm.planning_prompts.lock().unwrap()[0].clone();
    assert!(planning.contains("Answer briefly"));
}

#[tokio::test]
async fn test_malformed_template_is_configuration_error() {
    let root = tempfile::tempdir().unwrap();
    write_template(root.path(), "{{$input}}", "description: [unclosed\n");

    let llm = ScriptedLLM::new(TWO_STEP_PLAN, "42,000 seats");
    let search = CountingSearch::new(vec![stadium_source()]);
    let approach = PlannerApproach::new(
        providers(&llm, &search, None),
        TemplateLibrary::from_dir(root.path()),
        "Answer the question",
    )
    .unwrap();

    let err = approach
        .run("How big is stadium X?", &text_options())
        .await
        .unwrap_err();
    assert!(matches!(err, ApproachError::Configuration(ref m) if m.contains("RAG.AnswerQuestion")));
    assert_eq!(llm.planning_calls(), 0);
}
