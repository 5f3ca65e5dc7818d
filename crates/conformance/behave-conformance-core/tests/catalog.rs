mod common;

use behave_api_core::Value;
use behave_conformance::{build_all, build_case, BuildConfig, CaseRegistry};
use behave_graph_core::{FlowRuntime, Registry};
use common::{settle, visibility};

#[test]
fn every_standard_case_passes_in_the_reference_interpreter() {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    let built = build_all(&registry, &mut cases, &BuildConfig::default()).expect("catalog builds");
    assert_eq!(built.len(), cases.len());

    for case in &built {
        let mut rt = FlowRuntime::new(&case.graph);
        settle(&mut rt, &case.report);
        for assertion in &case.report.assertions {
            assert_eq!(
                rt.variable(&assertion.result_variable_name),
                Some(&Value::Bool(true)),
                "case '{}', assertion '{}' ({}), logs: {:?}",
                case.report.name,
                assertion.label,
                assertion.expected_value_as_string,
                rt.logs()
            );
            assert_eq!(
                rt.pointer(&visibility(assertion.marker.passed)),
                Some(&Value::Bool(true)),
                "pass marker of '{}'",
                assertion.label
            );
            assert!(
                rt.logs()
                    .iter()
                    .any(|line| *line == format!("PASS {}", assertion.label)),
                "missing PASS line for '{}'",
                assertion.label
            );
        }
        assert!(
            !rt.logs().iter().any(|line| line.starts_with("FAIL")),
            "case '{}' logged failures: {:?}",
            case.report.name,
            rt.logs()
        );
    }
}

#[test]
fn every_assertion_resolves_exactly_once() {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    for case in build_all(&registry, &mut cases, &BuildConfig::default()).expect("catalog builds") {
        let mut rt = FlowRuntime::new(&case.graph);
        settle(&mut rt, &case.report);
        let resolutions = rt
            .logs()
            .iter()
            .filter(|line| line.starts_with("PASS ") || line.starts_with("FAIL "))
            .count();
        assert_eq!(resolutions, case.report.assertions.len(), "{}", case.report.name);
    }
}

#[test]
fn case_names_and_result_variables_are_unique() {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    let mut names = cases.names().into_iter().map(String::from).collect::<Vec<_>>();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), cases.len());

    for case in build_all(&registry, &mut cases, &BuildConfig::default()).expect("catalog builds") {
        let mut variables: Vec<_> = case
            .report
            .assertions
            .iter()
            .map(|a| a.result_variable_name.clone())
            .collect();
        variables.sort();
        variables.dedup();
        assert_eq!(variables.len(), case.report.assertions.len());
        let prefix = case.report.entry_events[0]
            .strip_suffix("main")
            .expect("entry event ends with the entry name");
        for assertion in &case.report.assertions {
            assert!(
                assertion.result_variable_name.starts_with(prefix),
                "{} is not prefixed by its case",
                assertion.result_variable_name
            );
        }
    }
}

#[test]
fn delayed_cases_only_resolve_after_their_settle_time() {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    let case = cases.get_mut("flow/setDelay").expect("delay case registered");
    let built = build_case(&registry, case, &BuildConfig::default()).expect("delay case builds");
    assert_eq!(built.report.entry_delays, vec![Some(1.0)]);

    let mut rt = FlowRuntime::new(&built.graph);
    rt.trigger_event(&built.report.entry_events[0]).unwrap();
    rt.advance(0.75).unwrap();
    assert!(rt.logs().is_empty(), "{:?}", rt.logs());
    rt.advance(0.5).unwrap();
    assert_eq!(rt.logs().len(), built.report.assertions.len());
}

#[test]
fn custom_prefixes_reach_the_logs() {
    let registry = Registry::standard();
    let config = BuildConfig::from_json_str(r#"{ "passPrefix": "OK", "failPrefix": "NOK" }"#)
        .expect("config");
    let mut cases = CaseRegistry::standard();
    let case = cases.get_mut("math/add").expect("add case registered");
    let built = build_case(&registry, case, &config).expect("add case builds");
    let mut rt = FlowRuntime::new(&built.graph);
    settle(&mut rt, &built.report);
    assert_eq!(rt.logs(), ["OK float sum", "OK int sum"]);
}

#[test]
fn reports_serialize_for_hosts() {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    let case = cases.get_mut("flow/branch").expect("branch case registered");
    let built = build_case(&registry, case, &BuildConfig::default()).expect("branch case builds");
    let json = built.report.to_json();
    assert_eq!(json["name"], "flow/branch");
    assert_eq!(json["entryEvents"][0], "flow_branch_main");
    assert_eq!(json["assertions"][1]["negated"], true);
    assert_eq!(json["assertions"][1]["expectedValueAsString"], "not triggered");
    assert_eq!(json["assertions"][1]["marker"]["waiting"], 3);
}
