//! Integration tests for intake-validation

use intake_core::{field_map, FieldMap, FieldValue, FileDescriptor, UploadedFile};
use intake_validation::*;
use proptest::prelude::*;

fn run(rules: &[(&str, &str)], input: FieldMap) -> Result<FieldMap> {
    let rules: RuleSet = rules.iter().copied().collect();
    Validator::new().validate(&rules, &input)
}

fn accepts(rule: &str, value: impl Into<FieldValue>) -> bool {
    let value: FieldValue = value.into();
    run(&[("field", rule)], field_map([("field", value)])).is_ok()
}

fn failed_rule(err: &ValidationError) -> &str {
    &err.violation().expect("rule violation").rule
}

#[test]
fn test_required_and_minimalist_fields() {
    let output = run(&[("name", "required")], field_map([("name", "xuteng")])).unwrap();
    assert_eq!(output, field_map([("name", "xuteng")]));

    let err = run(&[("name", "required")], field_map([("age", "15")])).unwrap_err();
    assert_eq!(failed_rule(&err), "required");

    assert!(run(&[], field_map([("name", "15")])).unwrap().is_empty());
    assert_eq!(
        run(&[("name", "")], FieldMap::new()).unwrap(),
        field_map([("name", "")])
    );
    assert_eq!(
        run(&[("name", "")], field_map([("age", "15")])).unwrap(),
        field_map([("name", "")])
    );

    let rules = RuleSet::new().field("name").field("age");
    let output = Validator::new()
        .validate(&rules, &field_map([("name", "15")]))
        .unwrap();
    assert_eq!(output, field_map([("name", "15"), ("age", "")]));
}

#[test]
fn test_required_if_and_unless() {
    let rules = [("name", "required"), ("age", "requiredIf:name,xutengx")];
    assert!(run(&rules, field_map([("name", "xutengx"), ("age", "18")])).is_ok());
    assert!(run(&rules, field_map([("name", "xutengx"), ("age", "")])).is_err());
    assert_eq!(
        run(&rules, field_map([("name", "15")])).unwrap(),
        field_map([("name", "15"), ("age", "")])
    );

    let rules = [("name", "required"), ("age", "requiredUnless:name,xutengx")];
    assert!(run(&rules, field_map([("name", "xutengx")])).is_ok());
    assert!(run(&rules, field_map([("name", "xuteng"), ("age", "")])).is_err());
    assert!(run(&rules, field_map([("name", "15"), ("age", "12")])).is_ok());
}

#[test]
fn test_required_with_family() {
    let data = |t1: &str, t2: &str, t3: &str| field_map([("test1", t1), ("test2", t2), ("test3", t3)]);
    let rules = |rule: &'static str| [("test1", ""), ("test2", ""), ("test3", rule)];

    let with = rules("requiredWith:test1,test2");
    assert!(run(&with, data("", "", "")).is_ok());
    assert!(run(&with, data("xuteng", "", "")).is_err());
    assert!(run(&with, data("xuteng", "", "123123")).is_ok());

    let with_all = rules("requiredWithAll:test1,test2");
    assert!(run(&with_all, data("", "", "")).is_ok());
    assert!(run(&with_all, data("xuteng", "xutengxuteng", "")).is_err());
    assert!(run(&with_all, data("xuteng", "", "")).is_ok());

    let without = rules("requiredWithout:test1,test2");
    assert!(run(&without, data("123", "1233", "")).is_ok());
    assert!(run(&without, data("xuteng", "", "")).is_err());
    assert!(run(&without, data("xuteng", "", "123123")).is_ok());

    let without_all = rules("requiredWithoutAll:test1,test2");
    assert!(run(&without_all, data("123", "1233", "")).is_ok());
    assert!(run(&without_all, data("", "", "")).is_err());
    assert!(run(&without_all, data("", "", "123123")).is_ok());
}

#[test]
fn test_same_and_confirmed() {
    let rules = [("name1", ""), ("name2", "same:name1")];
    assert!(run(&rules, field_map([("name1", "test_name1"), ("name2", "test_name2")])).is_err());
    assert!(run(&rules, field_map([("name1", "test_name"), ("name2", "test_name")])).is_ok());
    assert!(run(&rules, field_map([("name1", "test_name"), ("name2", "")])).is_ok());

    let rules = [("age", ""), ("age_confirmation", "confirmed:age")];
    assert!(run(&rules, field_map([("age", "9"), ("age_confirmation", "9")])).is_ok());
    assert!(run(&rules, field_map([("age", "9"), ("age_confirmation", "10")])).is_err());

    // The referenced field has to be validated first.
    let reversed = [("age_confirmation", "confirmed:age"), ("age", "")];
    assert!(run(&reversed, field_map([("age", "9"), ("age_confirmation", "9")])).is_err());
}

#[test]
fn test_size_and_string() {
    assert!(!accepts("size:16,string", "test_name2"));
    assert!(accepts("size:6,string", "werfvd"));
    assert!(accepts("size:6,int", "6"));
    assert!(accepts("size:6,int", ""));

    assert!(!accepts("string", 123));
    assert!(accepts("string", FieldValue::Null));
    assert!(accepts("string", ""));
    assert!(accepts("string", "wwww"));
}

#[test]
fn test_timezone_and_url() {
    assert!(!accepts("timezone", 123));
    assert!(accepts("timezone", "Africa/Bamako"));
    assert!(!accepts("timezone", "Mars/Olympus"));

    assert!(accepts("url", "http://www.example.com:8086/index.html"));
    assert!(!accepts("url", "www.example.com"));
}

#[test]
fn test_accepted() {
    for value in ["on", "yes", "1", "true", "YES"] {
        assert!(accepts("accepted", value), "{value}");
    }
    assert!(accepts("accepted", 1));
    assert!(accepts("accepted", true));
    assert!(!accepts("accepted", "ok"));
    assert!(!accepts("accepted", false));
}

#[test]
fn test_active_url_with_injected_resolver() {
    let validator = Validator::new().with_resolver(|host: &str| host == "www.baidu.com");
    let rules = RuleSet::new().rule("url", "activeUrl");

    assert!(validator
        .validate(&rules, &field_map([("url", "https://www.baidu.com/s?wd=1")]))
        .is_ok());
    assert!(validator
        .validate(&rules, &field_map([("url", "www.baidu.com")]))
        .is_ok());
    assert!(validator
        .validate(&rules, &field_map([("url", "www.b1aidu.com")]))
        .is_err());
}

#[test]
fn test_numeric_integer_boolean() {
    assert!(accepts("numeric", "-12.5e3"));
    assert!(accepts("numeric", 12));
    assert!(!accepts("numeric", "12a"));

    assert!(accepts("integer", "9"));
    assert!(!accepts("integer", "-9"));
    assert!(!accepts("integer", "9.5"));

    assert!(accepts("boolean", "off"));
    assert!(accepts("boolean", false));
    assert!(!accepts("boolean", "maybe"));
}

#[test]
fn test_dates() {
    assert!(accepts("after:1999-11-18", "2000-01-01"));
    assert!(!accepts("after:1999-11-18", "1999-11-18"));
    assert!(accepts("before:tomorrow", "1999-11-18"));
    assert!(!accepts("before:1999-11-18", "not a date"));

    assert!(accepts("date", "2018-01-10"));
    assert!(!accepts("date", "2018-01-101"));
    assert!(accepts("dateEquals:2018-01-10", "2018-01-10 00:00:00"));
    assert!(!accepts("dateEquals:2018-01-10", "2018-01-11"));

    assert!(accepts("dateFormat:Y-m-d H:i:s", "2018-01-10 12:12:33"));
    assert!(!accepts("dateFormat:Y-m-d", "10/01/2018"));
}

#[test]
fn test_character_classes_and_regex() {
    assert!(accepts("alpha", "qweqw"));
    assert!(!accepts("alpha", "qwe1"));
    assert!(!accepts("alpha", 12));

    assert!(accepts("regex:/^[a-zA-Z]$/", "a"));
    assert!(!accepts("regex:/^[a-zA-Z]$/", "ab"));
    assert!(accepts("regex:/^a:b,c$/", "a:b,c"));
    assert!(accepts("notRegex:/^[0-9]+$/", "abc"));
    assert!(!accepts("notRegex:/^[0-9]+$/", "123"));

    assert!(accepts("alphaDash", "e_-123"));
    assert!(!accepts("alphaDash", "e|123"));
    assert!(accepts("alphaNum", "e123"));
    assert!(!accepts("alphaNum", "e_123"));
}

#[test]
fn test_array_and_file() {
    assert!(accepts("array", FieldValue::List(vec!["a".into()])));
    assert!(!accepts("array", "a"));
    assert!(!accepts("array", ""));

    let file = UploadedFile::new(FileDescriptor::in_memory("doc", "a.txt", "text/plain", b"hello".to_vec()));
    assert!(accepts("file", file.clone()));
    assert!(accepts("file|between:1,5", file.clone()));
    assert!(!accepts("file|max:4", file));
    assert!(!accepts("file", "a.txt"));
}

#[test]
fn test_between() {
    assert!(accepts("between:12,17", "12"));
    assert!(accepts("between:12,17", 17));
    assert!(!accepts("between:12,17", "18"));

    assert!(!accepts("between:2,4", "33"));
    assert!(accepts("between:2,4", "a33"));
    assert!(accepts("between:2,4,string", "33"));
    assert!(accepts("between:2,4", "中文字"));
}

#[test]
fn test_compare_family() {
    let input = |other: &str, value: &str| field_map([("other", other), ("value", value)]);
    let rules = |rule: &'static str| [("other", ""), ("value", rule)];

    assert!(run(&rules("gt:other"), input("5", "6")).is_ok());
    assert!(run(&rules("gt:other"), input("5", "5")).is_err());
    assert!(run(&rules("gte:other"), input("5", "5")).is_ok());
    assert!(run(&rules("lt:other"), input("5", "4")).is_ok());
    assert!(run(&rules("lte:other"), input("5", "6")).is_err());
    assert!(run(&rules("different:other,string"), input("11", "9")).is_ok());
    assert!(run(&rules("different:other,string"), input("11", "99")).is_err());
    assert!(run(&rules("compareField:>=,other"), input("5", "5")).is_ok());
    assert!(run(&rules("gt:missing"), input("5", "6")).is_err());

    assert!(accepts("compare:<,10", "9"));
    assert!(!accepts("compare:<,10", "10"));
    assert!(accepts("compare:=,3,string", "abc"));
    assert!(accepts("max:24", "24"));
    assert!(!accepts("min:24", "23"));

    let err = run(&[("a", "compare:~,3")], field_map([("a", "1")])).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidArgument { .. }));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_digits_email_in() {
    assert!(accepts("digits:11", "13619191919"));
    assert!(!accepts("digits:11", "1361919191"));
    assert!(accepts("digitsBetween:7,11", "1361919"));
    assert!(!accepts("digitsBetween:7,11", "113344"));

    assert!(accepts("email", "12345122@qq.com"));
    assert!(!accepts("email", "12345@122"));

    assert!(accepts("in:1,2,3", "2"));
    assert!(accepts("in:1,2,3", 3));
    assert!(!accepts("in:1,2,3", "4"));
    assert!(accepts("notIn:1,2,3", "4"));
    assert!(!accepts("notIn:1,2,3", "1.0"));
}

#[test]
fn test_ip_and_json() {
    assert!(accepts("ip", "127.0.0.2"));
    assert!(!accepts("ip", "256.257.258.2"));
    assert!(accepts("ipv4", "218.17.55.229"));
    assert!(!accepts("ipv4", "FF01::1101"));
    assert!(accepts("ipv6", "FF01::1101"));
    assert!(!accepts("ipv6", "218.17.55.229"));

    assert!(accepts("json", r#"{"name":"xiaoming","age":"22"}"#));
    assert!(!accepts("json", r#"{"name":"xiaoming","age":"2}"#));
}

#[test]
fn test_unknown_rules_and_strict_mode() {
    assert!(accepts("required|nonexistent|email", "a@b.cn"));

    let rules = RuleSet::new().rule("a", "nonexistent");
    let err = Validator::new()
        .strict(true)
        .validate(&rules, &field_map([("a", "1")]))
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownRule { ref rule, .. } if rule == "nonexistent"));
}

#[test]
fn test_messages() {
    let err = run(&[("age", "integer")], field_map([("age", "x")])).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.rule_text, "integer");
    assert_eq!(violation.value.as_deref(), Some("\"x\""));
    assert_eq!(
        err.to_string(),
        "The field `age` with value \"x\": does not satisfy the rule `integer`"
    );

    let err = Validator::new()
        .with_reason("integer", "must be a whole number")
        .validate(&RuleSet::new().rule("age", "integer"), &field_map([("age", "x")]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The field `age` with value \"x\": must be a whole number"
    );

    let rules = RuleSet::new().predicate("code", |ev, message| {
        *message = Some(format!("{} is taken", ev.field()));
        false
    });
    let err = Validator::new()
        .validate(&rules, &field_map([("code", "abc")]))
        .unwrap_err();
    assert_eq!(failed_rule(&err), PREDICATE_RULE);
    assert_eq!(err.to_string(), "code is taken");
}

#[test]
fn test_unrecognized_value() {
    let input = field_map([("raw", FieldValue::Bytes(bytes::Bytes::from_static(&[0xff, 0xfe])))]);
    let err = run(&[("raw", "required")], input).unwrap_err();
    assert!(matches!(err, ValidationError::UnrecognizedType { .. }));
}

proptest! {
    #[test]
    fn prop_missing_fields_pass_non_presence_rules(
        rule in prop_oneof![
            Just("email"), Just("integer"), Just("between:1,2"), Just("date"),
            Just("ipv4"), Just("alpha"), Just("timezone"), Just("in:x"),
        ],
    ) {
        let output = run(&[("absent", rule)], FieldMap::new()).unwrap();
        prop_assert_eq!(output.get("absent"), Some(&FieldValue::from("")));
    }

    #[test]
    fn prop_output_keys_follow_rule_set(names in proptest::collection::btree_set("[a-z]{1,6}", 0..6)) {
        let rules: RuleSet = names.iter().map(|n| (n.clone(), "")).collect();
        let output = Validator::new().validate(&rules, &FieldMap::new()).unwrap();
        let keys: Vec<&String> = output.keys().collect();
        let expected: Vec<&String> = names.iter().collect();
        prop_assert_eq!(keys, expected);
    }
}
