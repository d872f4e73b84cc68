//! Python-side harness and its result protocol
//!
//! The harness reads one JSON request from stdin and reports on stdout with a
//! marker line `__SESSIONBOX_RESULT_<nonce>__ <json>`. User output is
//! redirected to stderr and the nonce is fresh per run, so the code under test
//! cannot forge a result line.

use serde::{Deserialize, Serialize};

use super::input::CallArgs;

/// Harness script, written next to the solution module
pub const HARNESS_SOURCE: &str = include_str!("harness.py");

/// File name of the harness inside the evaluation workspace
pub const HARNESS_FILE: &str = "harness.py";

/// File name of the code under test; the harness imports it as `solution`
pub const SOLUTION_FILE: &str = "solution.py";

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Import the module and resolve the entry point only
    Load,
    /// Resolve and call the entry point
    Call,
}

/// JSON request fed to the harness on stdin
#[derive(Debug, Clone, Serialize)]
pub struct HarnessRequest<'a> {
    pub mode: Mode,
    pub entry_point: &'a str,
    pub nonce: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<&'a [(String, String)]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positional: Option<&'a str>,
}

impl<'a> HarnessRequest<'a> {
    pub fn load(entry_point: &'a str, nonce: &'a str) -> Self {
        HarnessRequest {
            mode: Mode::Load,
            entry_point,
            nonce,
            keywords: None,
            positional: None,
        }
    }

    pub fn call(entry_point: &'a str, nonce: &'a str, args: &'a CallArgs) -> Self {
        let (keywords, positional) = match args {
            CallArgs::None => (None, None),
            CallArgs::Keyword(pairs) => (Some(pairs.as_slice()), None),
            CallArgs::Positional(text) => (None, Some(text.as_str())),
        };
        HarnessRequest {
            mode: Mode::Call,
            entry_point,
            nonce,
            keywords,
            positional,
        }
    }
}

/// What the harness reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Entry point resolved (and, for calls, returned this repr)
    Returned(Option<String>),
    /// Loading or calling raised
    Raised { error: String, traceback: String },
}

#[derive(Deserialize)]
struct Report {
    ok: bool,
    #[serde(default)]
    repr: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    traceback: Option<String>,
}

fn marker(nonce: &str) -> String {
    format!("__SESSIONBOX_RESULT_{}__ ", nonce)
}

/// Find the last well-formed report line for `nonce` in the harness stdout
pub fn parse_outcome(stdout: &str, nonce: &str) -> Option<Outcome> {
    let marker = marker(nonce);
    stdout.lines().rev().find_map(|line| {
        let payload = line.strip_prefix(&marker)?;
        let report: Report = serde_json::from_str(payload).ok()?;
        Some(if report.ok {
            Outcome::Returned(report.repr)
        } else {
            Outcome::Raised {
                error: report
                    .error
                    .unwrap_or_else(|| "unknown error".to_string()),
                traceback: report.traceback.unwrap_or_default(),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_returned() {
        let out = "\n__SESSIONBOX_RESULT_abc__ {\"ok\": true, \"repr\": \"[1, 2]\"}\n";
        assert_eq!(
            parse_outcome(out, "abc"),
            Some(Outcome::Returned(Some("[1, 2]".into())))
        );
    }

    #[test]
    fn test_parse_raised() {
        let out = "__SESSIONBOX_RESULT_n1__ {\"ok\": false, \"error\": \"ValueError: bad\", \"traceback\": \"tb\"}";
        assert_eq!(
            parse_outcome(out, "n1"),
            Some(Outcome::Raised {
                error: "ValueError: bad".into(),
                traceback: "tb".into()
            })
        );
    }

    #[test]
    fn test_wrong_nonce_is_ignored() {
        let out = "__SESSIONBOX_RESULT_forged__ {\"ok\": true, \"repr\": \"42\"}";
        assert_eq!(parse_outcome(out, "real"), None);
        assert_eq!(parse_outcome("", "real"), None);
        assert_eq!(parse_outcome("__SESSIONBOX_RESULT_real__ not json", "real"), None);
    }

    #[test]
    fn test_call_request_shape() {
        let args = CallArgs::Keyword(vec![("a".into(), "1".into())]);
        let json = serde_json::to_value(HarnessRequest::call("f", "n", &args)).unwrap();
        assert_eq!(json["mode"], "call");
        assert_eq!(json["keywords"][0][0], "a");
        assert!(json.get("positional").is_none());

        let json = serde_json::to_value(HarnessRequest::load("f", "n")).unwrap();
        assert_eq!(json["mode"], "load");
        assert!(json.get("keywords").is_none());
    }
}
