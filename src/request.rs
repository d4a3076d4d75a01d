// Request input aggregate

use bytes::Bytes;
use intake_core::{FieldMap, FieldValue, field_map, parse_body, parse_form_map};
use intake_storage::{StorageError, UploadBatch, UploadedFileRegistry};
use intake_validation::{
    FILTER_RULE, FilterRegistry, RuleSet, RuleViolation, ValidationError, Validator,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Everything reading request input can fail with
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Body(#[from] intake_core::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("No input named `{0}`")]
    NotFound(String),
}

impl RequestError {
    /// HTTP status for transports
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::Body(e) => e.status_code(),
            RequestError::Validation(e) => e.status_code(),
            RequestError::Storage(e) => e.status_code(),
            RequestError::NotFound(_) => 404,
        }
    }

    /// The rule violation, if the input failed a rule or filter
    pub fn violation(&self) -> Option<&RuleViolation> {
        match self {
            RequestError::Validation(e) => e.violation(),
            _ => None,
        }
    }
}

/// Input of one request: decoded body, query, route parameters and uploads.
///
/// When sources share a key, later sources win in the order body, query,
/// route parameters, files.
#[derive(Debug, Clone, Default)]
pub struct Request {
    body: FieldMap,
    query: FieldMap,
    route_params: FieldMap,
    files: UploadedFileRegistry,
    filters: FilterRegistry,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a body by content type.
    ///
    /// Files found in a multipart body go straight into the upload registry.
    pub fn from_body(content_type: Option<&str>, body: impl Into<Bytes>) -> Result<Self, RequestError> {
        let parsed = parse_body(content_type, body.into())?;
        debug!(
            content_type = ?content_type,
            fields = parsed.fields.len(),
            files = parsed.files.len(),
            "Decoded request body"
        );

        let mut request = Self {
            body: parsed.fields,
            ..Self::default()
        };
        request.files.add_parsed(parsed.files)?;
        Ok(request)
    }

    /// Add query parameters
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.query.extend(field_map(pairs));
        self
    }

    /// Add query parameters from a raw `a=1&b[]=2` query string
    pub fn with_query_string(mut self, query: &str) -> Result<Self, RequestError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        self.query.extend(parse_form_map(query.as_bytes())?);
        Ok(self)
    }

    /// Add parameters captured by the router
    pub fn with_route_params<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.route_params.extend(field_map(pairs));
        self
    }

    /// Register uploads handed over by the server.
    ///
    /// Every descriptor is tried; the error lists each one that failed.
    pub fn with_uploads(mut self, batch: UploadBatch) -> Result<Self, RequestError> {
        self.files.add_files(batch)?;
        Ok(self)
    }

    /// Replace the upload registry, e.g. one carrying a size limit
    pub fn with_registry(mut self, registry: UploadedFileRegistry) -> Self {
        self.files = registry;
        self
    }

    /// Use a different set of named filters for [`input`](Self::input)
    pub fn with_filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = filters;
        self
    }

    /// Decoded body fields
    pub fn body(&self) -> &FieldMap {
        &self.body
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&FieldValue> {
        self.query.get(name)
    }

    /// Get a route parameter by name
    pub fn param(&self, name: &str) -> Option<&FieldValue> {
        self.route_params.get(name)
    }

    /// Every input merged into one map
    pub fn all(&self) -> FieldMap {
        let mut all = self.body.clone();
        all.extend(self.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        all.extend(self.route_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        all.extend(self.files.files());
        all
    }

    /// Whether any source carries `key`
    pub fn has(&self, key: &str) -> bool {
        self.files.has(key)
            || self.route_params.contains_key(key)
            || self.query.contains_key(key)
            || self.body.contains_key(key)
    }

    /// The value `all()` would hold for `key`
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        if let Some(file) = self.files.get(key) {
            return Some(FieldValue::File(file.clone()));
        }
        self.route_params
            .get(key)
            .or_else(|| self.query.get(key))
            .or_else(|| self.body.get(key))
            .cloned()
    }

    /// Read one input, optionally checked against a named filter or pattern.
    ///
    /// Values without a text form (lists, maps, files) never pass a filter.
    pub fn input(&self, key: &str, filter: Option<&str>) -> Result<FieldValue, RequestError> {
        let value = self
            .get(key)
            .ok_or_else(|| RequestError::NotFound(key.to_string()))?;

        let Some(filter) = filter else {
            return Ok(value);
        };

        let passed = match value.as_text() {
            Some(text) => self.filters.matches(&text, filter)?,
            None => false,
        };
        debug!(field = %key, filter = %filter, passed, "Applied input filter");

        if passed {
            Ok(value)
        } else {
            let violation = RuleViolation::new(
                key,
                format!("The field `{}` with value {}: does not match the filter `{}`", key, value, filter),
            )
            .with_rule(FILTER_RULE, format!("{}:{}", FILTER_RULE, filter))
            .with_value(value.to_string());
            Err(ValidationError::RuleViolation(violation).into())
        }
    }

    /// Validate all input against `rules`, returning the validated fields
    pub fn validate(&self, validator: &Validator, rules: &RuleSet) -> Result<FieldMap, RequestError> {
        Ok(validator.validate(rules, &self.all())?)
    }

    /// Deserialize all input into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        deserialize(self.all())
    }

    /// Validate, then deserialize the validated fields into `T`
    pub fn validated<T: DeserializeOwned>(&self, validator: &Validator, rules: &RuleSet) -> Result<T, RequestError> {
        deserialize(self.validate(validator, rules)?)
    }

    pub fn files(&self) -> &UploadedFileRegistry {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut UploadedFileRegistry {
        &mut self.files
    }

    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }
}

fn deserialize<T: DeserializeOwned>(fields: FieldMap) -> Result<T, RequestError> {
    serde_json::from_value(FieldValue::Map(fields).to_json())
        .map_err(|e| intake_core::Error::BadRequest(format!("Invalid input: {}", e)).into())
}
