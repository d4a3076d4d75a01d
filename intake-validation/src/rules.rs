// Rule resolution: rule name and string arguments to a typed rule

use crate::classify::parse_numeric_str;
use crate::errors::{Result, ValidationError};
use crate::parser::RuleInvocation;
use crate::relation::{integer_prefix, KindSpec, Relation, ValueKind};
use regex::{Regex, RegexBuilder};

/// Delimiters accepted around a `/pattern/flags` style regex argument
const PATTERN_DELIMITERS: &[char] = &['/', '#', '~', '!', '@', '%', '+'];

/// A resolved rule with typed arguments
#[derive(Debug, Clone)]
pub enum Rule {
    Accepted,
    ActiveUrl,
    After(String),
    Alpha,
    AlphaDash,
    AlphaNum,
    Array,
    Before(String),
    Between { min: f64, max: f64, kind: KindSpec },
    Boolean,
    Compare { relation: Relation, limit: f64, kind: KindSpec },
    CompareField { relation: Relation, field: String, kind: KindSpec },
    Date,
    DateEquals(String),
    DateFormat(String),
    Digits(usize),
    DigitsBetween { min: usize, max: usize },
    Email,
    File,
    In(Vec<String>),
    NotIn(Vec<String>),
    Integer,
    Ip,
    Ipv4,
    Ipv6,
    Json,
    Numeric,
    Regex(Regex),
    NotRegex(Regex),
    Required,
    RequiredIf { field: String, value: String },
    RequiredUnless { field: String, value: String },
    RequiredWith(Vec<String>),
    RequiredWithAll(Vec<String>),
    RequiredWithout(Vec<String>),
    RequiredWithoutAll(Vec<String>),
    Same(String),
    String,
    Timezone,
    Url,
}

impl Rule {
    /// Resolve an invocation. `Ok(None)` means the rule name is unknown.
    ///
    /// Rule names are case-sensitive. `max`, `min` and `size` resolve to
    /// [`Rule::Compare`]; `gt`, `gte`, `lt`, `lte`, `different` and
    /// `confirmed` resolve to [`Rule::CompareField`].
    pub fn resolve(invocation: &RuleInvocation) -> Result<Option<Rule>> {
        let args = Args(invocation);
        let rule = match invocation.name.as_str() {
            "accepted" => Rule::Accepted,
            "activeUrl" => Rule::ActiveUrl,
            "alpha" => Rule::Alpha,
            "alphaDash" => Rule::AlphaDash,
            "alphaNum" => Rule::AlphaNum,
            "array" => Rule::Array,
            "boolean" => Rule::Boolean,
            "date" => Rule::Date,
            "email" => Rule::Email,
            "file" => Rule::File,
            "integer" => Rule::Integer,
            "ip" => Rule::Ip,
            "ipv4" => Rule::Ipv4,
            "ipv6" => Rule::Ipv6,
            "json" => Rule::Json,
            "numeric" => Rule::Numeric,
            "required" => Rule::Required,
            "string" => Rule::String,
            "timezone" => Rule::Timezone,
            "url" => Rule::Url,

            "after" => Rule::After(args.single()?),
            "before" => Rule::Before(args.single()?),
            "dateEquals" => Rule::DateEquals(args.single()?),
            "dateFormat" => Rule::DateFormat(args.single()?),
            "same" => Rule::Same(args.single()?),
            "regex" => Rule::Regex(compile_pattern("regex", &args.single()?)?),
            "notRegex" => Rule::NotRegex(compile_pattern("notRegex", &args.single()?)?),

            "between" => {
                args.expect(2, 3)?;
                let kind = args.kind(2);
                Rule::Between {
                    min: args.limit(0, &kind)?,
                    max: args.limit(1, &kind)?,
                    kind,
                }
            }
            "compare" => {
                args.expect(2, 3)?;
                let kind = args.kind(2);
                Rule::Compare {
                    relation: args.relation(0)?,
                    limit: args.limit(1, &kind)?,
                    kind,
                }
            }
            "compareField" => {
                args.expect(2, 3)?;
                Rule::CompareField {
                    relation: args.relation(0)?,
                    field: args.text(1),
                    kind: args.kind(2),
                }
            }
            "max" => args.compare_sugar(Relation::Le)?,
            "min" => args.compare_sugar(Relation::Ge)?,
            "size" => args.compare_sugar(Relation::Eq)?,
            "gt" => args.field_sugar(Relation::Gt)?,
            "gte" => args.field_sugar(Relation::Ge)?,
            "lt" => args.field_sugar(Relation::Lt)?,
            "lte" => args.field_sugar(Relation::Le)?,
            "different" => args.field_sugar(Relation::Ne)?,
            "confirmed" => args.field_sugar(Relation::Eq)?,

            "digits" => {
                args.expect(1, 1)?;
                Rule::Digits(args.count(0)?)
            }
            "digitsBetween" => {
                args.expect(2, 2)?;
                Rule::DigitsBetween {
                    min: args.count(0)?,
                    max: args.count(1)?,
                }
            }

            "in" => Rule::In(invocation.args.clone()),
            "notIn" => Rule::NotIn(invocation.args.clone()),

            "requiredIf" => {
                args.expect(2, 2)?;
                Rule::RequiredIf {
                    field: args.text(0),
                    value: args.text(1),
                }
            }
            "requiredUnless" => {
                args.expect(2, 2)?;
                Rule::RequiredUnless {
                    field: args.text(0),
                    value: args.text(1),
                }
            }
            "requiredWith" => Rule::RequiredWith(args.fields()?),
            "requiredWithAll" => Rule::RequiredWithAll(args.fields()?),
            "requiredWithout" => Rule::RequiredWithout(args.fields()?),
            "requiredWithoutAll" => Rule::RequiredWithoutAll(args.fields()?),

            _ => return Ok(None),
        };
        Ok(Some(rule))
    }

    /// Presence rules decide on empty values; every other rule passes them,
    /// except `array` and `file`.
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            Rule::Required
                | Rule::RequiredIf { .. }
                | Rule::RequiredUnless { .. }
                | Rule::RequiredWith(_)
                | Rule::RequiredWithAll(_)
                | Rule::RequiredWithout(_)
                | Rule::RequiredWithoutAll(_)
        )
    }
}

/// Argument accessors that report malformed arguments against the rule
struct Args<'a>(&'a RuleInvocation);

impl Args<'_> {
    fn invalid(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::invalid_argument(&self.0.name, reason)
    }

    fn expect(&self, min: usize, max: usize) -> Result<()> {
        let got = self.0.args.len();
        if got < min || got > max {
            let expected = if min == max {
                min.to_string()
            } else if max == usize::MAX {
                format!("at least {}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.invalid(format!("expects {} argument(s), got {}", expected, got)));
        }
        Ok(())
    }

    fn text(&self, index: usize) -> String {
        self.0.arg(index).unwrap_or_default().to_string()
    }

    fn single(&self) -> Result<String> {
        self.expect(1, 1)?;
        Ok(self.text(0))
    }

    fn number(&self, index: usize) -> Result<f64> {
        let raw = self.0.arg(index).unwrap_or_default();
        parse_numeric_str(raw).ok_or_else(|| self.invalid(format!("`{}` is not a number", raw)))
    }

    /// A comparison limit; under a declared `bool` kind any text is
    /// measured by its integer prefix, like the value it is compared with.
    fn limit(&self, index: usize, kind: &KindSpec) -> Result<f64> {
        match kind {
            KindSpec::Declared(ValueKind::Bool) => {
                Ok(integer_prefix(self.0.arg(index).unwrap_or_default()) as f64)
            }
            _ => self.number(index),
        }
    }

    fn count(&self, index: usize) -> Result<usize> {
        let raw = self.0.arg(index).unwrap_or_default();
        raw.trim()
            .parse()
            .map_err(|_| self.invalid(format!("`{}` is not a non-negative integer", raw)))
    }

    fn relation(&self, index: usize) -> Result<Relation> {
        let raw = self.0.arg(index).unwrap_or_default();
        Relation::parse(raw).ok_or_else(|| self.invalid(format!("unknown relational operator `{}`", raw)))
    }

    fn kind(&self, index: usize) -> KindSpec {
        KindSpec::from_arg(self.0.arg(index))
    }

    fn fields(&self) -> Result<Vec<String>> {
        self.expect(1, usize::MAX)?;
        Ok(self.0.args.clone())
    }

    fn compare_sugar(&self, relation: Relation) -> Result<Rule> {
        self.expect(1, 2)?;
        let kind = self.kind(1);
        Ok(Rule::Compare {
            relation,
            limit: self.limit(0, &kind)?,
            kind,
        })
    }

    fn field_sugar(&self, relation: Relation) -> Result<Rule> {
        self.expect(1, 2)?;
        Ok(Rule::CompareField {
            relation,
            field: self.text(0),
            kind: self.kind(1),
        })
    }
}

/// Compile a pattern argument, accepting `/pattern/flags` delimiters.
///
/// Supported flags: `i` (case-insensitive), `m` (multi-line), `s` (dot matches
/// newline), `x` (ignore whitespace) and `u` (always on).
pub fn compile_pattern(rule: &str, raw: &str) -> Result<Regex> {
    let (pattern, flags) = split_delimited(raw).unwrap_or((raw, ""));

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'u' => {}
            other => {
                return Err(ValidationError::invalid_argument(
                    rule,
                    format!("unsupported pattern flag `{}`", other),
                ));
            }
        }
    }

    builder
        .build()
        .map_err(|e| ValidationError::invalid_argument(rule, e.to_string()))
}

fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let delimiter = raw.chars().next().filter(|c| PATTERN_DELIMITERS.contains(c))?;
    let rest = &raw[delimiter.len_utf8()..];
    let end = rest.rfind(delimiter)?;
    let flags = &rest[end + delimiter.len_utf8()..];
    flags
        .chars()
        .all(|c| c.is_ascii_alphabetic())
        .then_some((&rest[..end], flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_invocation;
    use crate::relation::ValueKind;

    fn resolve(text: &str) -> Result<Option<Rule>> {
        Rule::resolve(&parse_invocation(text).unwrap())
    }

    #[test]
    fn test_sugar_desugars_to_compare() {
        match resolve("max:24").unwrap() {
            Some(Rule::Compare { relation, limit, kind }) => {
                assert_eq!(relation, Relation::Le);
                assert_eq!(limit, 24.0);
                assert_eq!(kind, KindSpec::Inferred);
            }
            other => panic!("unexpected {:?}", other),
        }

        match resolve("different:age,string").unwrap() {
            Some(Rule::CompareField { relation, field, kind }) => {
                assert_eq!(relation, Relation::Ne);
                assert_eq!(field, "age");
                assert_eq!(kind, KindSpec::Declared(ValueKind::String));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_rule() {
        assert!(resolve("nonsense:1").unwrap().is_none());
        assert!(resolve("Required").unwrap().is_none());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            resolve("compare:~,3"),
            Err(ValidationError::InvalidArgument { ref rule, .. }) if rule == "compare"
        ));
        assert!(resolve("between:1").is_err());
        assert!(resolve("between:a,b").is_err());
        assert!(resolve("digits:-1").is_err());
        assert!(resolve("requiredWith").is_err());
        assert!(resolve("regex:/[unclosed/").is_err());
        assert!(resolve("regex:/a/q").is_err());
    }

    #[test]
    fn test_compile_pattern() {
        let re = compile_pattern("regex", "/^[a-z]+$/i").unwrap();
        assert!(re.is_match("ABC"));

        let re = compile_pattern("regex", "#^\\d{3}$#").unwrap();
        assert!(re.is_match("123"));

        let re = compile_pattern("regex", "^[a-z]+[0-9]$").unwrap();
        assert!(re.is_match("ab1"));
    }
}
