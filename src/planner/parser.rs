use regex::Regex;
use std::sync::OnceLock;

use super::{BindingSource, InputBinding, Plan, PlanStep};
use crate::capabilities::CapabilityRegistry;
use crate::error::{ApproachError, ApproachResult};

const OUTPUT_ATTRIBUTES: &[&str] = &["setContextVariable", "appendToResult"];

fn plan_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<plan\s*>(.*?)</plan\s*>").expect("plan regex is valid")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^<>]*>").expect("tag regex is valid"))
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*"([^"]*)""#)
            .expect("attribute regex is valid")
    })
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn binding_source(value: &str) -> BindingSource {
    match value.strip_prefix('$') {
        Some(name) if !name.is_empty() => BindingSource::Variable(name.to_string()),
        _ => BindingSource::Literal(unescape(value)),
    }
}

fn planning(message: String) -> ApproachError {
    ApproachError::Planning(message)
}

fn is_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn function_name(name: &str) -> ApproachResult<(&str, &str)> {
    let qualified = name
        .strip_prefix("function.")
        .ok_or_else(|| planning(format!("<{}> is not a function element", name)))?;

    let segments: Vec<&str> = qualified.split('.').collect();
    match segments.as_slice() {
        [single] if is_segment(single) => Err(planning(format!(
            "function '{}' is not qualified with its capability group",
            single
        ))),
        [group, capability] if is_segment(group) && is_segment(capability) => {
            Ok((*group, *capability))
        }
        _ => Err(planning(format!(
            "function name '{}' is not of the form Group.Name",
            qualified
        ))),
    }
}

fn check_gap(text: &str) -> ApproachResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    let excerpt: String = text.chars().take(40).collect();
    Err(planning(format!("unexpected content in plan: {:?}", excerpt)))
}

fn parse_function(element: &str, registry: &CapabilityRegistry) -> ApproachResult<PlanStep> {
    let element = element.strip_suffix('/').unwrap_or(element);
    let name_end = element
        .find(char::is_whitespace)
        .unwrap_or(element.len());
    let (name, mut rest) = element.split_at(name_end);
    let (group, capability_name) = function_name(name)?;

    let capability = registry.get(group, capability_name).ok_or_else(|| {
        planning(format!("unknown capability {}.{}", group, capability_name))
    })?;

    let mut bindings = Vec::new();
    let mut output = None;
    while !rest.trim().is_empty() {
        let attr = attribute_pattern().captures(rest).ok_or_else(|| {
            planning(format!(
                "malformed attributes {:?} on {}",
                rest.trim(),
                capability.qualified_name()
            ))
        })?;
        let (key, value) = (&attr[1], &attr[2]);
        rest = &rest[attr.get(0).map_or(rest.len(), |m| m.end())..];

        if OUTPUT_ATTRIBUTES.contains(&key) {
            let variable = value.trim_start_matches('$').trim();
            if variable.is_empty() {
                return Err(planning(format!(
                    "{} on {} names no variable",
                    key,
                    capability.qualified_name()
                )));
            }
            output = Some(variable.to_string());
            continue;
        }

        let parameter = capability.parameter(key).ok_or_else(|| {
            planning(format!(
                "{} has no parameter '{}'",
                capability.qualified_name(),
                key
            ))
        })?;
        bindings.push(InputBinding {
            parameter: parameter.name.clone(),
            source: binding_source(value),
        });
    }

    Ok(PlanStep {
        capability,
        bindings,
        output,
    })
}

pub fn parse_plan(
    goal: &str,
    response: &str,
    registry: &CapabilityRegistry,
) -> ApproachResult<Plan> {
    let body = plan_pattern()
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| planning("response contains no <plan> element".to_string()))?;

    let mut steps = Vec::new();
    let mut cursor = 0;
    for tag in tag_pattern().find_iter(body) {
        check_gap(&body[cursor..tag.start()])?;
        cursor = tag.end();

        let raw = tag.as_str();
        let element = raw[1..raw.len() - 1].trim_start();
        if let Some(closing) = element.strip_prefix('/') {
            function_name(closing.trim())?;
            continue;
        }
        steps.push(parse_function(element, registry)?);
    }
    check_gap(&body[cursor..])?;

    if steps.is_empty() {
        return Err(planning("plan has no steps".to_string()));
    }

    Ok(Plan::new(goal, steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{build_registry, Providers};
    use crate::providers::llm::MockLLMProvider;
    use crate::providers::search::MockSearchProvider;
    use crate::templates::TemplateLibrary;
    use crate::types::RagOptions;
    use std::sync::Arc;

    const GOAL: &str = "Answer the question";

    fn registry() -> CapabilityRegistry {
        let providers = Providers {
            llm: Arc::new(MockLLMProvider::new()),
            search: Arc::new(MockSearchProvider::new()),
            embedding: None,
        };
        build_registry(&RagOptions::default(), &providers, &TemplateLibrary::Bundled).unwrap()
    }

    fn planning_message(result: ApproachResult<Plan>) -> String {
        match result {
            Err(ApproachError::Planning(msg)) => msg,
            other => panic!("expected planning error, got {:?}", other.map(|p| p.to_plan_string())),
        }
    }

    #[test]
    fn test_two_step_plan() {
        let response = r#"Here is the plan:
```xml
<plan>
  <function.InformationFinder.Search input="$INPUT" setContextVariable="SOURCES"/>
  <function.RAG.AnswerQuestion input="$INPUT" sources="$SOURCES"/>
</plan>
```"#;
        let plan = parse_plan(GOAL, response, &registry()).unwrap();

        assert_eq!(
            plan.capability_names(),
            vec!["InformationFinder.Search", "RAG.AnswerQuestion"]
        );
        assert_eq!(plan.steps[0].output.as_deref(), Some("SOURCES"));
        assert_eq!(
            plan.steps[1].binding("sources").unwrap().source,
            BindingSource::Variable("SOURCES".to_string())
        );
        assert_eq!(
            plan.to_plan_string(),
            "Goal: Answer the question\nSteps:\n  1. InformationFinder.Search input=$INPUT -> $SOURCES\n  2. RAG.AnswerQuestion input=$INPUT sources=$SOURCES"
        );
    }

    #[test]
    fn test_literal_binding_is_unescaped() {
        let response = r#"<plan><function.InformationFinder.Search input="&quot;stadium&quot; &amp; capacity"/></plan>"#;
        let plan = parse_plan(GOAL, response, &registry()).unwrap();
        assert_eq!(
            plan.steps[0].bindings[0].source,
            BindingSource::Literal("\"stadium\" & capacity".to_string())
        );
    }

    #[test]
    fn test_append_to_result_sets_output() {
        let response = r#"<plan><function.InformationFinder.Search input="$INPUT" appendToResult="RESULT__SOURCES"/></plan>"#;
        let plan = parse_plan(GOAL, response, &registry()).unwrap();
        assert_eq!(plan.steps[0].output.as_deref(), Some("RESULT__SOURCES"));
    }

    #[test]
    fn test_unknown_capability_rejected() {
        let response = r#"<plan><function.WebSearch.Bing input="$INPUT"/></plan>"#;
        let msg = planning_message(parse_plan(GOAL, response, &registry()));
        assert!(msg.contains("unknown capability WebSearch.Bing"));
    }

    #[test]
    fn test_unqualified_function_rejected() {
        let response = r#"<plan><function.Search input="$INPUT"/></plan>"#;
        let msg = planning_message(parse_plan(GOAL, response, &registry()));
        assert!(msg.contains("not qualified"));
    }

    #[test]
    fn test_undeclared_parameter_rejected() {
        let response = r#"<plan><function.InformationFinder.Search query="$INPUT"/></plan>"#;
        let msg = planning_message(parse_plan(GOAL, response, &registry()));
        assert!(msg.contains("no parameter 'query'"));
    }

    #[test]
    fn test_empty_plans_rejected() {
        let msg = planning_message(parse_plan(GOAL, "<plan>\n</plan>", &registry()));
        assert_eq!(msg, "plan has no steps");

        let msg = planning_message(parse_plan(GOAL, "I cannot help with that.", &registry()));
        assert!(msg.contains("no <plan> element"));
    }

    #[test]
    fn test_closing_tags_and_spaced_self_close() {
        let response = r#"<plan>
  <function.InformationFinder.Search input="$INPUT" setContextVariable="sources" />
  <function.RAG.AnswerQuestion input="$INPUT" sources="$sources"></function.RAG.AnswerQuestion>
</plan>"#;
        let plan = parse_plan(GOAL, response, &registry()).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_malformed_elements_fail_the_whole_plan() {
        let tail = r#"<function.RAG.AnswerQuestion input="$INPUT" sources="x"/>"#;
        let cases = [
            (r#"<function.InformationFinder.Search input='$INPUT'/>"#, "malformed attributes"),
            (r#"<function.InformationFinder.Search set-var="s"/>"#, "malformed attributes"),
            (r#"<function.Evil.Tool.Extra input="$INPUT"/>"#, "not of the form Group.Name"),
            (r#"<function..Search input="$INPUT"/>"#, "not of the form Group.Name"),
            (r#"<step name="Search"/>"#, "not a function element"),
            ("run the search first", "unexpected content"),
        ];

        for (element, expected) in cases {
            let response = format!("<plan>{}{}</plan>", element, tail);
            let msg = planning_message(parse_plan(GOAL, &response, &registry()));
            assert!(msg.contains(expected), "{} -> {}", element, msg);
        }
    }

    #[test]
    fn test_stray_text_after_last_element_rejected() {
        let response = r#"<plan><function.InformationFinder.Search input="$INPUT"/> then answer</plan>"#;
        let msg = planning_message(parse_plan(GOAL, response, &registry()));
        assert!(msg.contains("unexpected content"));
    }

    #[test]
    fn test_mismatched_closing_tag_rejected() {
        let response = r#"<plan><function.InformationFinder.Search input="$INPUT"></search></plan>"#;
        let msg = planning_message(parse_plan(GOAL, response, &registry()));
        assert!(msg.contains("not a function element"));
    }
}
