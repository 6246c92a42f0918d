use super::*;
use serde_json::json;

fn response_scope() -> Scope {
    let body = json!({
        "success": true,
        "data": { "items": [ { "id": 7, "name": "Alpha" }, { "id": 9, "name": "beta" } ] },
        "count": 2,
        "token": "YWJj"
    });
    Scope::new()
        .with("response", Comparable::from_json(&body))
        .with("status", Comparable::Number(200.0))
        .with("responseTime", Comparable::Number(120.0))
}

fn eval_bool(source: &str) -> Result<bool, String> {
    evaluate(source, &response_scope())
        .map(|value| value.is_truthy())
        .map_err(|err| format!("{} -> {}", source, err))
}

#[test]
fn member_and_index_access() -> Result<(), String> {
    let cases = [
        "response.success === true",
        "response.data.items[1].name == 'beta'",
        "response.data.items.length === 2",
        "response['count'] > 1",
        "status >= 200 && status < 300",
    ];
    for case in cases {
        if !eval_bool(case)? {
            return Err(format!("Expected true: {}", case));
        }
    }
    Ok(())
}

#[test]
fn return_and_semicolon_are_accepted() -> Result<(), String> {
    if !eval_bool("return response.count === 2;")? {
        return Err("Expected return form to evaluate".to_owned());
    }
    Ok(())
}

#[test]
fn loose_and_strict_equality_differ() -> Result<(), String> {
    if !eval_bool("status == '200'")? {
        return Err("Expected loose equality across types".to_owned());
    }
    if eval_bool("status === '200'")? {
        return Err("Expected strict equality to reject string".to_owned());
    }
    if !eval_bool("response.missing == null")? {
        return Err("Expected undefined == null".to_owned());
    }
    Ok(())
}

#[test]
fn helpers_and_methods() -> Result<(), String> {
    let cases = [
        "len(response.data.items) === 2",
        "contains(response.data.items[0].name, 'lph')",
        "matches(response.data.items[0].name, '^alpha$')",
        "base64.decode(response.token) === 'abc'",
        "json.parse('{\"a\":1}').a === 1",
        "response.data.items[0].name.toLowerCase().startsWith('al')",
        "keys(response).includes('count')",
        "isArray(response.data.items) && !isObject(response.data.items)",
        "(responseTime < 2000 ? 'fast' : 'slow') === 'fast'",
        "'a' + 1 === 'a1' && 2 * 3 - 1 === 5",
    ];
    for case in cases {
        if !eval_bool(case)? {
            return Err(format!("Expected true: {}", case));
        }
    }
    Ok(())
}

#[test]
fn object_literal_evaluates_to_map() -> Result<(), String> {
    let value = evaluate(
        "{ passed: status === 200, actualValue: status }",
        &response_scope(),
    )
    .map_err(|err| err.to_string())?;
    let Comparable::Map(fields) = value else {
        return Err("Expected a map".to_owned());
    };
    if fields.get("passed") != Some(&Comparable::Bool(true)) {
        return Err(format!("Unexpected passed: {:?}", fields.get("passed")));
    }
    if fields.get("actualValue") != Some(&Comparable::Number(200.0)) {
        return Err(format!("Unexpected actual: {:?}", fields.get("actualValue")));
    }
    Ok(())
}

#[test]
fn errors_are_reported_not_panicked() -> Result<(), String> {
    let failures = [
        ("", "empty"),
        ("status ===", "dangling operator"),
        ("response.missing.field", "property of undefined"),
        ("unknownVar > 1", "unknown variable"),
        ("fetch('http://x')", "unknown function"),
        ("'unterminated", "unterminated string"),
        ("status # 2", "bad character"),
        ("matches(status, '(')", "bad regex"),
        ("len(1, 2)", "arity"),
    ];
    for (source, label) in failures {
        if evaluate(source, &response_scope()).is_ok() {
            return Err(format!("Expected error for {}: {}", label, source));
        }
    }
    Ok(())
}

#[test]
fn deep_nesting_is_rejected() -> Result<(), String> {
    let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    match Expression::parse(&source) {
        Err(ExprError::TooDeep) => Ok(()),
        other => Err(format!("Expected TooDeep, got {:?}", other.map(|_| ()))),
    }
}

#[test]
fn long_flat_chains_are_rejected() -> Result<(), String> {
    let sources = [
        format!("1{}", " + 1".repeat(20_000)),
        format!("true{}", " && true".repeat(20_000)),
        format!("response{}", ".x".repeat(20_000)),
        format!("response{}", "[0]".repeat(20_000)),
    ];
    for source in &sources {
        match Expression::parse(source) {
            Err(ExprError::TooDeep) => {}
            other => {
                return Err(format!(
                    "Expected TooDeep for a {}-byte chain, got {:?}",
                    source.len(),
                    other.map(|_| ())
                ));
            }
        }
    }
    Ok(())
}

#[test]
fn short_chains_still_evaluate() -> Result<(), String> {
    let value = evaluate("1 + 1 + 1 + 1 * 2 * 3", &response_scope()).map_err(|err| err.to_string())?;
    if value != Comparable::Number(9.0) {
        return Err(format!("Expected 9, got {:?}", value));
    }
    let chain = format!("1{}", " + 1".repeat(40));
    let value = evaluate(&chain, &response_scope()).map_err(|err| err.to_string())?;
    if value != Comparable::Number(41.0) {
        return Err(format!("Expected 41, got {:?}", value));
    }
    if !eval_bool("response.data.items[0].name.length === 5 && status === 200 && responseTime < 500")? {
        return Err("Expected mixed chain to hold".to_owned());
    }
    Ok(())
}
