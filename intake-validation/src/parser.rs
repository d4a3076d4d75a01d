//! Rule string parsing
//!
//! Rule text has the form `rule1:arg1,arg2|rule2|rule3:arg1`. Rules are split
//! on `|`, each rule on its first `:` into name and arguments, and arguments
//! on `,`. Empty segments are ignored.

/// Rules whose argument text is kept whole; their arguments may contain `:` or `,`.
const VERBATIM_RULES: &[&str] = &["dateFormat", "regex", "notRegex"];

/// One parsed rule with its string arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInvocation {
    pub name: String,
    pub args: Vec<String>,
    /// The segment this invocation was parsed from, e.g. `between:2,4`
    pub text: String,
}

impl RuleInvocation {
    /// Argument by position
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Parse rule text into ordered invocations.
pub fn parse(rule_text: &str) -> Vec<RuleInvocation> {
    rule_text.split('|').filter_map(parse_invocation).collect()
}

/// Parse a single `name:args` segment.
pub fn parse_invocation(segment: &str) -> Option<RuleInvocation> {
    let (name, raw_args) = match segment.split_once(':') {
        Some((name, args)) => (name.trim(), Some(args)),
        None => (segment.trim(), None),
    };
    if name.is_empty() {
        return None;
    }

    let args = match raw_args {
        None | Some("") => Vec::new(),
        Some(args) if VERBATIM_RULES.contains(&name) => vec![args.to_string()],
        Some(args) => args.split(',').map(str::to_string).collect(),
    };

    Some(RuleInvocation {
        name: name.to_string(),
        args,
        text: segment.trim().to_string(),
    })
}
