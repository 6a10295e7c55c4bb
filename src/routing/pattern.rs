//! Pattern parsing.
//!
//! # Responsibilities
//! - Sanitize raw pattern strings into canonical `/a/b` form
//! - Split a pattern into literal and parameter segments
//! - Resolve optional markers, defaults, and requirement regexes
//!
//! # Design Decisions
//! - A parameter with a configured default is optional even without a `?`
//!   marker; the canonical pattern is rewritten to carry the marker
//! - Parameter tokens containing regex meta characters are kept as
//!   non-capturing wildcard segments, never extracted as parameters
//! - A pattern that reduces to `/` parses to the degenerate `Root` outcome

use std::collections::HashMap;

use regex::Regex;

use crate::error::BuildError;

/// Characters that mark a token as wildcard-like. They are stripped from
/// literal values during path reconstruction.
const META_CHARS: &[char] = &['?', '*', '+', '(', ')'];

/// Sanitize a pattern so that it always starts with a `/`, does not end
/// with a `/` and does not contain double slashes in between.
pub fn sanitize(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 1);
    for part in pattern.split('/').filter(|p| !p.is_empty()) {
        out.push('/');
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Strip wildcard meta characters from a literal value.
pub fn strip_meta(value: &str) -> String {
    value.chars().filter(|c| !META_CHARS.contains(c)).collect()
}

/// One segment of a parsed pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matches itself exactly.
    Literal { value: String },

    /// A wildcard-like token. Matches exactly one path segment (never zero,
    /// never several) and captures nothing; `cleaned` is what path
    /// reconstruction emits for it.
    Wildcard { cleaned: String },

    /// A named parameter.
    Param(ParamSegment),
}

/// A named parameter segment.
#[derive(Debug, Clone)]
pub struct ParamSegment {
    /// Parameter name without sentinel or marker.
    pub name: String,

    /// Whether the segment may be absent from a matched path.
    pub optional: bool,

    /// Value substituted when the parameter is absent.
    pub default: Option<String>,

    /// Requirement the bound value must satisfy.
    pub requirement: Option<Regex>,
}

impl ParamSegment {
    /// Whether `value` passes the requirement regex, vacuously true without one.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.requirement {
            Some(re) => re.is_match(value),
            None => true,
        }
    }
}

/// A fully parsed pattern.
#[derive(Debug, Clone)]
pub struct ParsedPattern {
    /// Segments in path order.
    pub segments: Vec<Segment>,

    /// Names of optional parameters, in path order.
    pub optional_params: Vec<String>,

    /// Names of mandatory parameters, in path order.
    pub mandatory_params: Vec<String>,
}

impl ParsedPattern {
    /// Parameter segments in path order.
    pub fn params(&self) -> impl Iterator<Item = &ParamSegment> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(p) => Some(p),
            _ => None,
        })
    }

    /// Whether any parameter in this pattern is optional.
    pub fn has_optional(&self) -> bool {
        !self.optional_params.is_empty()
    }
}

/// Result of parsing a pattern string.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// The pattern reduced to `/` and contributes no segments.
    Root,

    /// A decomposable pattern. `pattern` is the canonical string, rewritten
    /// to carry explicit `?` markers for default-implied optionals.
    Pattern {
        pattern: String,
        parsed: ParsedPattern,
    },
}

/// Parse a sanitized pattern with the route's defaults and requirements.
///
/// `route` is only used in error messages.
pub fn parse(
    route: &str,
    pattern: &str,
    defaults: &HashMap<String, String>,
    requirements: &HashMap<String, String>,
) -> Result<ParseOutcome, BuildError> {
    let mut segments = Vec::new();
    let mut tokens = Vec::new();
    let mut optional_params = Vec::new();
    let mut mandatory_params = Vec::new();

    for token in pattern.split('/').filter(|t| !t.is_empty()) {
        let Some(rest) = token.strip_prefix(':') else {
            segments.push(Segment::Literal {
                value: token.to_string(),
            });
            tokens.push(token.to_string());
            continue;
        };

        let has_marker = rest.ends_with('?');
        let name = rest.strip_suffix('?').unwrap_or(rest);

        if name.contains(META_CHARS) {
            // Wildcard-like token: no parameter is extracted.
            segments.push(Segment::Wildcard {
                cleaned: strip_meta(name),
            });
            tokens.push(token.to_string());
            continue;
        }

        let default = defaults.get(name).cloned();
        let optional = has_marker || default.is_some();

        let mut canonical = format!(":{}", name);
        if optional {
            canonical.push('?');
        }
        tokens.push(canonical);

        let requirement = match requirements.get(name) {
            Some(source) => {
                let source = source
                    .strip_prefix('/')
                    .and_then(|s| s.strip_suffix('/'))
                    .unwrap_or(source);
                Some(
                    Regex::new(source).map_err(|source| BuildError::BadRequirement {
                        route: route.to_string(),
                        param: name.to_string(),
                        source,
                    })?,
                )
            }
            None => None,
        };

        if optional {
            optional_params.push(name.to_string());
        } else {
            mandatory_params.push(name.to_string());
        }

        segments.push(Segment::Param(ParamSegment {
            name: name.to_string(),
            optional,
            default,
            requirement,
        }));
    }

    if segments.is_empty() {
        return Ok(ParseOutcome::Root);
    }

    let mut canonical = String::new();
    for token in &tokens {
        canonical.push('/');
        canonical.push_str(token);
    }

    Ok(ParseOutcome::Pattern {
        pattern: canonical,
        parsed: ParsedPattern {
            segments,
            optional_params,
            mandatory_params,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_plain(pattern: &str) -> ParseOutcome {
        parse("test", pattern, &HashMap::new(), &HashMap::new()).unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("users//42/"), "/users/42");
        assert_eq!(sanitize("/users"), "/users");
        assert_eq!(sanitize(""), "/");
        assert_eq!(sanitize("///"), "/");
    }

    #[test]
    fn test_literal_segments() {
        let ParseOutcome::Pattern { pattern, parsed } = parse_plain("/users/list") else {
            panic!("expected a parsed pattern");
        };
        assert_eq!(pattern, "/users/list");
        assert_eq!(parsed.segments.len(), 2);
        assert!(parsed.params().next().is_none());
    }

    #[test]
    fn test_param_segment() {
        let ParseOutcome::Pattern { pattern, parsed } = parse_plain("/users/:id") else {
            panic!("expected a parsed pattern");
        };
        assert_eq!(pattern, "/users/:id");
        assert_eq!(parsed.mandatory_params, vec!["id".to_string()]);
        assert!(parsed.optional_params.is_empty());
    }

    #[test]
    fn test_optional_marker() {
        let ParseOutcome::Pattern { pattern, parsed } = parse_plain("/users/:page?") else {
            panic!("expected a parsed pattern");
        };
        assert_eq!(pattern, "/users/:page?");
        assert_eq!(parsed.optional_params, vec!["page".to_string()]);
    }

    #[test]
    fn test_default_implies_optional_and_rewrites_pattern() {
        let defaults = HashMap::from([("page".to_string(), "1".to_string())]);
        let outcome = parse("test", "/users/:page", &defaults, &HashMap::new()).unwrap();
        let ParseOutcome::Pattern { pattern, parsed } = outcome else {
            panic!("expected a parsed pattern");
        };
        // The canonical pattern carries the marker explicitly.
        assert_eq!(pattern, "/users/:page?");
        assert_eq!(parsed.optional_params, vec!["page".to_string()]);
        let param = parsed.params().next().unwrap();
        assert_eq!(param.default.as_deref(), Some("1"));
    }

    #[test]
    fn test_requirement_delimiters_stripped() {
        let requirements = HashMap::from([("id".to_string(), "/^\\d+$/".to_string())]);
        let outcome = parse("test", "/users/:id", &HashMap::new(), &requirements).unwrap();
        let ParseOutcome::Pattern { parsed, .. } = outcome else {
            panic!("expected a parsed pattern");
        };
        let param = parsed.params().next().unwrap();
        assert!(param.accepts("42"));
        assert!(!param.accepts("abc"));
    }

    #[test]
    fn test_bare_requirement_source() {
        let requirements = HashMap::from([("id".to_string(), "^[a-z]+$".to_string())]);
        let outcome = parse("test", "/x/:id", &HashMap::new(), &requirements).unwrap();
        let ParseOutcome::Pattern { parsed, .. } = outcome else {
            panic!("expected a parsed pattern");
        };
        assert!(parsed.params().next().unwrap().accepts("abc"));
    }

    #[test]
    fn test_invalid_requirement_fails() {
        let requirements = HashMap::from([("id".to_string(), "/[unclosed/".to_string())]);
        let err = parse("test", "/x/:id", &HashMap::new(), &requirements).unwrap_err();
        assert!(matches!(err, BuildError::BadRequirement { .. }));
    }

    #[test]
    fn test_wildcard_token_not_extracted() {
        let ParseOutcome::Pattern { parsed, .. } = parse_plain("/files/:path*") else {
            panic!("expected a parsed pattern");
        };
        assert!(parsed.params().next().is_none());
        assert!(matches!(&parsed.segments[1], Segment::Wildcard { cleaned } if cleaned == "path"));
    }

    #[test]
    fn test_degenerate_root() {
        assert!(matches!(parse_plain("/"), ParseOutcome::Root));
        assert!(matches!(parse_plain(""), ParseOutcome::Root));
    }

    #[test]
    fn test_strip_meta() {
        assert_eq!(strip_meta("fil?es(+)*"), "files");
    }
}
