use super::*;
use serde_json::json;
use std::collections::BTreeMap;

fn snapshot(status: u16, body: serde_json::Value) -> ResponseSnapshot {
    ResponseSnapshot {
        status,
        headers: BTreeMap::from([(
            "content-type".to_owned(),
            "application/json; charset=utf-8".to_owned(),
        )]),
        body,
        response_time_ms: 120,
        size_bytes: 64,
    }
}

fn rule(rule_type: RuleType, operator: RuleOperator) -> ValidationRule {
    ValidationRule::new("rule", rule_type, operator)
}

fn single(response: &ResponseSnapshot, rule: ValidationRule) -> Result<ValidationResult, String> {
    let outcome = validate_response(response, &[rule]);
    outcome
        .results
        .into_iter()
        .next()
        .ok_or_else(|| "Expected one result".to_owned())
}

#[test]
fn contains_on_primitive_status_stringifies() -> Result<(), String> {
    let ok = snapshot(200, json!({}));
    let missing = snapshot(404, json!({}));

    let contains = single(
        &ok,
        rule(RuleType::Status, RuleOperator::Contains).with_expected("20"),
    )?;
    if !contains.passed {
        return Err("Expected 200 to contain \"20\"".to_owned());
    }
    let not_contains = single(
        &ok,
        rule(RuleType::Status, RuleOperator::NotContains).with_expected("99"),
    )?;
    if !not_contains.passed {
        return Err("Expected 200 to not contain \"99\"".to_owned());
    }
    let not_found = single(
        &missing,
        rule(RuleType::Status, RuleOperator::NotContains).with_expected("404"),
    )?;
    if not_found.passed {
        return Err("Expected notContains 404 on 404 to fail".to_owned());
    }
    Ok(())
}

#[test]
fn all_disabled_rules_pass_vacuously() -> Result<(), String> {
    let response = snapshot(500, json!({}));
    let rules = vec![
        rule(RuleType::Status, RuleOperator::Equals)
            .with_expected(200)
            .disabled(),
        rule(RuleType::Body, RuleOperator::Exists)
            .with_target("data")
            .disabled(),
    ];
    let outcome = validate_response(&response, &rules);
    if !outcome.passed || !outcome.results.is_empty() {
        return Err(format!("Expected vacuous pass, got {:?}", outcome));
    }
    Ok(())
}

#[test]
fn json_path_round_trip() -> Result<(), String> {
    let response = snapshot(200, json!({ "success": true }));
    let outcome = validate_response(
        &response,
        &[rule(RuleType::Body, RuleOperator::JsonPath)
            .with_target("success")
            .with_expected(true)],
    );
    if !outcome.passed {
        return Err(format!("Expected jsonPath rule to pass: {:?}", outcome));
    }
    Ok(())
}

#[test]
fn json_path_indexes_and_reports_resolved_value() -> Result<(), String> {
    let response = snapshot(200, json!({ "data": { "items": [ { "id": 3 }, { "id": 5 } ] } }));
    let result = single(
        &response,
        rule(RuleType::Body, RuleOperator::JsonPath)
            .with_target("data.items[1].id")
            .with_expected("5"),
    )?;
    if !result.passed || result.actual_value != Some(json!(5)) {
        return Err(format!("Unexpected result: {:?}", result));
    }
    let missing = single(
        &response,
        rule(RuleType::Body, RuleOperator::JsonPath)
            .with_target("data.items[9].id")
            .with_expected("5"),
    )?;
    if missing.passed || missing.error.is_some() || missing.actual_value.is_some() {
        return Err(format!("Expected undefined without error: {:?}", missing));
    }
    Ok(())
}

#[test]
fn malformed_json_path_is_a_rule_error() -> Result<(), String> {
    let response = snapshot(200, json!({ "a": [1] }));
    let outcome = validate_response(
        &response,
        &[
            rule(RuleType::Body, RuleOperator::JsonPath)
                .with_target("a[oops")
                .with_expected(1),
            rule(RuleType::Status, RuleOperator::Equals).with_expected(200),
        ],
    );
    let first = outcome.results.first().ok_or("missing first result")?;
    let second = outcome.results.get(1).ok_or("missing second result")?;
    let error = first.error.as_deref().unwrap_or_default();
    if first.passed || !error.starts_with("jsonPath error") {
        return Err(format!("Expected jsonPath error: {:?}", first));
    }
    if !second.passed || outcome.passed {
        return Err(format!("Expected isolation of the failing rule: {:?}", outcome));
    }
    Ok(())
}

#[test]
fn numeric_operators_coerce() -> Result<(), String> {
    let response = snapshot(200, json!({ "count": "12" }));
    let cases = [
        (rule(RuleType::ResponseTime, RuleOperator::LessThan).with_expected(2000), true),
        (rule(RuleType::ResponseTime, RuleOperator::GreaterThan).with_expected("500"), false),
        (rule(RuleType::Size, RuleOperator::GreaterThanOrEqual).with_expected(64), true),
        (rule(RuleType::Size, RuleOperator::LessThanOrEqual).with_expected(63), false),
        (
            rule(RuleType::Body, RuleOperator::GreaterThan)
                .with_target("count")
                .with_expected(10),
            true,
        ),
        (
            rule(RuleType::Body, RuleOperator::LessThan)
                .with_target("missing")
                .with_expected(10),
            false,
        ),
    ];
    for (case, expected) in cases {
        let result = single(&response, case.clone())?;
        if result.passed != expected {
            return Err(format!("Unexpected verdict for {:?}: {:?}", case, result));
        }
    }
    Ok(())
}

#[test]
fn equality_is_string_coerced() -> Result<(), String> {
    let response = snapshot(201, json!({ "id": 42, "ok": true }));
    let cases = [
        (rule(RuleType::Status, RuleOperator::Equals).with_expected("201"), true),
        (rule(RuleType::Status, RuleOperator::NotEquals).with_expected(200), true),
        (
            rule(RuleType::Body, RuleOperator::Equals)
                .with_target("id")
                .with_expected("42"),
            true,
        ),
        (
            rule(RuleType::Body, RuleOperator::Equals)
                .with_target("ok")
                .with_expected("true"),
            true,
        ),
    ];
    for (case, expected) in cases {
        let result = single(&response, case.clone())?;
        if result.passed != expected {
            return Err(format!("Unexpected verdict for {:?}: {:?}", case, result));
        }
    }
    Ok(())
}

#[test]
fn contains_on_lists_maps_and_text() -> Result<(), String> {
    let response = snapshot(200, json!({ "tags": ["a", "b"], "meta": { "kind": "user" }, "name": "Widget" }));
    let cases = [
        (rule(RuleType::Body, RuleOperator::Contains).with_target("tags").with_expected("b"), true),
        (rule(RuleType::Body, RuleOperator::Contains).with_target("tags").with_expected("z"), false),
        (rule(RuleType::Body, RuleOperator::Contains).with_target("meta").with_expected("user"), true),
        (rule(RuleType::Body, RuleOperator::Contains).with_target("name").with_expected("idg"), true),
        (rule(RuleType::Body, RuleOperator::NotContains).with_target("name").with_expected("xyz"), true),
        (
            rule(RuleType::Header, RuleOperator::Contains)
                .with_target("Content-Type")
                .with_expected("json"),
            true,
        ),
    ];
    for (case, expected) in cases {
        let result = single(&response, case.clone())?;
        if result.passed != expected {
            return Err(format!("Unexpected verdict for {:?}: {:?}", case, result));
        }
    }
    Ok(())
}

#[test]
fn exists_and_regex() -> Result<(), String> {
    let response = snapshot(200, json!({ "data": null, "email": "Ops@Example.com" }));
    let cases = [
        (rule(RuleType::Body, RuleOperator::Exists).with_target("email"), true),
        (rule(RuleType::Body, RuleOperator::Exists).with_target("data"), false),
        (rule(RuleType::Body, RuleOperator::NotExists).with_target("error"), true),
        (rule(RuleType::Header, RuleOperator::Exists).with_target("x-missing"), false),
        (
            rule(RuleType::Body, RuleOperator::Regex)
                .with_target("email")
                .with_expected("^ops@example\\.com$"),
            true,
        ),
        (rule(RuleType::Status, RuleOperator::Regex).with_expected("200"), false),
    ];
    for (case, expected) in cases {
        let result = single(&response, case.clone())?;
        if result.passed != expected {
            return Err(format!("Unexpected verdict for {:?}: {:?}", case, result));
        }
    }
    Ok(())
}

#[test]
fn custom_code_shapes() -> Result<(), String> {
    let response = snapshot(200, json!({ "items": [1, 2, 3] }));

    let boolean = single(
        &response,
        rule(RuleType::Custom, RuleOperator::Custom).with_code("len(response.items) === 3"),
    )?;
    if !boolean.passed {
        return Err(format!("Expected boolean custom rule to pass: {:?}", boolean));
    }

    let object = single(
        &response,
        rule(RuleType::Custom, RuleOperator::Custom).with_code(
            "{ passed: status === 201, actualValue: status, error: 'wrong status' }",
        ),
    )?;
    if object.passed
        || object.actual_value != Some(json!(200))
        || object.error.as_deref() != Some("wrong status")
    {
        return Err(format!("Unexpected object outcome: {:?}", object));
    }

    let truthy = single(
        &response,
        rule(RuleType::Body, RuleOperator::Custom).with_code("response.items[0]"),
    )?;
    if !truthy.passed {
        return Err(format!("Expected truthy coercion: {:?}", truthy));
    }

    let failing = single(
        &response,
        rule(RuleType::Custom, RuleOperator::Custom).with_code("response.nope.deeper"),
    )?;
    if failing.passed || failing.error.is_none() {
        return Err(format!("Expected caught error: {:?}", failing));
    }
    Ok(())
}

#[test]
fn oversized_custom_rule_fails_without_stopping_other_rules() -> Result<(), String> {
    let response = snapshot(200, json!({ "success": true }));
    let rules = vec![
        rule(RuleType::Custom, RuleOperator::Custom)
            .with_code(format!("1{}", " + 1".repeat(20_000))),
        rule(RuleType::Status, RuleOperator::Equals).with_expected(200),
    ];
    let outcome = validate_response(&response, &rules);
    let [oversized, status] = outcome.results.as_slice() else {
        return Err(format!("Expected two results, got {:?}", outcome.results));
    };
    if oversized.passed || oversized.error.is_none() {
        return Err(format!("Expected oversized rule to fail with an error: {:?}", oversized));
    }
    if !status.passed || outcome.passed {
        return Err(format!("Unexpected outcome: {:?}", outcome));
    }
    if evaluate_legacy_test(&format!("true{}", " && true".repeat(20_000)), &response) {
        return Err("Expected oversized legacy test to fail".to_owned());
    }
    Ok(())
}

#[test]
fn legacy_test_expression() -> Result<(), String> {
    let response = snapshot(200, json!({ "success": true }));
    if !evaluate_legacy_test("response.success === true", &response) {
        return Err("Expected legacy test to pass".to_owned());
    }
    if evaluate_legacy_test("   ", &response) {
        return Err("Expected blank legacy test to fail".to_owned());
    }
    if evaluate_legacy_test("response.success ===", &response) {
        return Err("Expected invalid legacy test to fail".to_owned());
    }
    Ok(())
}

#[test]
fn rules_deserialize_from_camel_case() -> Result<(), String> {
    let raw = r#"{
        "id": "r1",
        "name": "status ok",
        "type": "status",
        "operator": "greaterThanOrEqual",
        "expectedValue": 200
    }"#;
    let parsed: ValidationRule = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    if parsed.rule_type != RuleType::Status
        || parsed.operator != RuleOperator::GreaterThanOrEqual
        || !parsed.enabled
        || parsed.expected_value != Some(json!(200))
    {
        return Err(format!("Unexpected rule: {:?}", parsed));
    }
    Ok(())
}

#[test]
fn suggestions_cover_envelope_and_latency() -> Result<(), String> {
    let sample = snapshot(200, json!({ "success": true, "data": { "users": [] }, "items": [1] }));
    let rules = suggest_rules(&sample);

    let status = rules.first().ok_or("missing status rule")?;
    if status.rule_type != RuleType::Status || status.expected_value != Some(json!(200)) {
        return Err(format!("Unexpected first rule: {:?}", status));
    }
    let has = |rule_type: RuleType, operator: RuleOperator, target: &str| {
        rules.iter().any(|rule| {
            rule.rule_type == rule_type
                && rule.operator == operator
                && rule.target.as_deref() == Some(target)
        })
    };
    if !has(RuleType::Header, RuleOperator::Contains, "content-type") {
        return Err("Missing content-type rule".to_owned());
    }
    if !has(RuleType::Body, RuleOperator::Exists, "success")
        || !has(RuleType::Body, RuleOperator::Exists, "data")
        || !has(RuleType::Body, RuleOperator::NotExists, "error")
    {
        return Err("Missing envelope rules".to_owned());
    }
    let latency = rules.last().ok_or("missing latency rule")?;
    if latency.rule_type != RuleType::ResponseTime || latency.enabled {
        return Err(format!("Expected disabled latency rule: {:?}", latency));
    }

    let outcome = validate_response(&sample, &rules);
    if !outcome.passed {
        return Err(format!("Suggested rules should pass on their sample: {:?}", outcome));
    }
    Ok(())
}
