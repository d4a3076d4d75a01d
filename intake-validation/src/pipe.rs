// Validation pipe for typed request bodies

use crate::{RuleSet, ValidationError, Validator};
use bytes::Bytes;
use intake_core::{insert_field, parse_body, Error, FieldMap, FieldValue, UploadedFile};
use serde::de::DeserializeOwned;

/// Decodes a body, validates it and deserializes the validated fields
pub struct ValidationPipe;

impl ValidationPipe {
    /// Decode `body` by content type, validate it and build a `T` from the
    /// fields the rule set declares.
    pub fn parse<T>(
        validator: &Validator,
        rules: &RuleSet,
        content_type: Option<&str>,
        body: Bytes,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let parsed = parse_body(content_type, body)?;
        let mut fields = parsed.fields;
        for file in parsed.files {
            let key = file.key.clone();
            insert_field(&mut fields, &key, UploadedFile::new(file).into());
        }
        Self::parse_map(validator, rules, &fields)
    }

    /// Validate an already decoded field map and deserialize it into `T`
    pub fn parse_map<T>(validator: &Validator, rules: &RuleSet, fields: &FieldMap) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let validated = validator.validate(rules, fields)?;
        serde_json::from_value(FieldValue::Map(validated).to_json())
            .map_err(|e| Error::BadRequest(format!("Invalid body: {}", e)))
    }

    /// Status code and JSON body describing a validation failure
    pub fn error_response(error: &ValidationError) -> (u16, serde_json::Value) {
        (error.status_code(), error.to_json())
    }
}

/// Validate a field map in a handler, returning early with an
/// `intake_core::Error` on failure
#[macro_export]
macro_rules! validate {
    ($validator:expr, $rules:expr, $fields:expr) => {{
        $validator
            .validate(&$rules, &$fields)
            .map_err(::intake_core::Error::from)?
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct SignUp {
        name: String,
        age: String,
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .rule("name", "required|alphaDash")
            .rule("age", "required|integer")
    }

    #[test]
    fn test_validation_pipe() {
        let body = Bytes::from_static(b"name=ada_l&age=36&ignored=1");
        let dto: SignUp = ValidationPipe::parse(
            &Validator::new(),
            &rules(),
            Some("application/x-www-form-urlencoded"),
            body,
        )
        .unwrap();

        assert_eq!(dto.name, "ada_l");
        assert_eq!(dto.age, "36");
    }

    #[test]
    fn test_validation_failure_is_unprocessable() {
        let body = Bytes::from_static(br#"{"name":"ada l","age":"36"}"#);
        let err = ValidationPipe::parse::<SignUp>(
            &Validator::new(),
            &rules(),
            Some("application/json"),
            body,
        )
        .unwrap_err();

        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_shape_mismatch_is_bad_request() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Typed {
            age: u32,
        }

        let rules = RuleSet::new().rule("age", "integer");
        let fields = intake_core::field_map([("age", "36")]);
        let err = ValidationPipe::parse_map::<Typed>(&Validator::new(), &rules, &fields).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_error_response() {
        let rules = RuleSet::new().rule("age", "integer");
        let err = Validator::new()
            .validate(&rules, &intake_core::field_map([("age", "x")]))
            .unwrap_err();

        let (status, body) = ValidationPipe::error_response(&err);
        assert_eq!(status, 422);
        assert_eq!(body["field"], "age");
    }

    #[test]
    fn test_validate_macro() {
        fn handler(fields: FieldMap) -> Result<usize, Error> {
            let validated = validate!(Validator::new(), RuleSet::new().rule("a", "required"), fields);
            Ok(validated.len())
        }

        assert_eq!(handler(intake_core::field_map([("a", "1")])).unwrap(), 1);
        assert!(handler(FieldMap::new()).is_err());
    }
}
