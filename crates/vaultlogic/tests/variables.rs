use serde_json::json;
use vaultlogic::{
    EvaluationContext, VariableResolver, evaluate_condition, parse_condition, parse_variables,
};

#[test]
fn authored_aliases_evaluate_against_storage_keys() {
    let variables = parse_variables(
        r#"
- key: s1_q1
  alias: age
  title: Applicant age
  type: number
- key: s1_q2
  alias: country
- key: s2_q1
"#,
    )
    .expect("failed to parse variables");
    let resolver = VariableResolver::new(&variables);

    let authored = parse_condition(
        r#"{"type":"and","children":[
            {"type":"comparison","op":"gte","left":{"kind":"variable","path":"age"},"right":{"kind":"literal","value":18}},
            {"type":"comparison","op":"equals","left":{"kind":"variable","path":"country"},"right":{"kind":"literal","value":"NO"}}
        ]}"#,
    )
    .expect("failed to parse condition");
    let stored = resolver.resolve_expression(&authored);

    let ctx = EvaluationContext::from_values(json!({"s1_q1": 21, "s1_q2": "no"}), None);
    assert!(evaluate_condition(&stored, &ctx));
    // the alias form does not exist in storage
    assert!(!evaluate_condition(&authored, &ctx));
}

#[test]
fn resolver_contract() {
    let variables = parse_variables(r#"[{"key":"k1","alias":"first"},{"key":"first","alias":"other"}]"#)
        .expect("failed to parse variables");
    let resolver = VariableResolver::new(&variables);

    assert_eq!(resolver.resolve_operand("first"), "first");
    assert_eq!(resolver.resolve_operand("other"), "first");
    assert_eq!(resolver.resolve_operand("ghost"), "ghost");
    assert_eq!(
        resolver.resolve_operands(&["first", "other", "ghost"]),
        vec!["first", "first", "ghost"]
    );
    assert!(resolver.is_valid_operand("k1"));
    assert!(!resolver.is_valid_operand("ghost"));
}
