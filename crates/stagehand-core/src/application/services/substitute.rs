//! `{{key}}` token substitution against the answer map.
//!
//! Stage-local literal context takes precedence over answers, so a stage
//! can pin a value without an option existing for it. An unresolved token
//! is a Template error — tokens are never passed through silently.

use std::path::Path;

use crate::application::error::ApplicationError;
use crate::domain::AnswerMap;
use crate::error::EngineResult;

/// Substitute every `{{token}}` in `input`.
///
/// `origin` only labels the error (the file, or the script command, the
/// text came from). Tokens are identifiers: `{{` and `}}` around a run of
/// non-brace characters; anything else is left untouched as literal text.
pub fn substitute(
    input: &str,
    answers: &AnswerMap,
    context: &[(String, String)],
    origin: &Path,
) -> EngineResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated braces are literal text, not a token.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let token = after[..end].trim();
        let value = lookup(token, answers, context).ok_or_else(|| {
            ApplicationError::UnresolvedToken {
                token: token.to_owned(),
                path: origin.to_path_buf(),
            }
        })?;
        out.push_str(&value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup(token: &str, answers: &AnswerMap, context: &[(String, String)]) -> Option<String> {
    // Stage-local context wins over answers.
    if let Some((_, v)) = context.iter().find(|(k, _)| k == token) {
        return Some(v.clone());
    }
    answers.get(token).map(|v| v.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerValue, answers};
    use std::path::PathBuf;

    fn origin() -> PathBuf {
        PathBuf::from("template.txt")
    }

    #[test]
    fn substitutes_answer_tokens() {
        let map = answers([("projectName", "demo")]);
        let out = substitute("name = {{projectName}}", &map, &[], &origin()).unwrap();
        assert_eq!(out, "name = demo");
    }

    #[test]
    fn context_overrides_answers() {
        let map = answers([("version", "1")]);
        let ctx = vec![("version".to_string(), "2".to_string())];
        let out = substitute("v{{version}}", &map, &ctx, &origin()).unwrap();
        assert_eq!(out, "v2");
    }

    #[test]
    fn list_answers_render_joined() {
        let map = answers([(
            "workspaces",
            AnswerValue::List(vec!["web".into(), "api".into()]),
        )]);
        let out = substitute("members: {{workspaces}}", &map, &[], &origin()).unwrap();
        assert_eq!(out, "members: web,api");
    }

    #[test]
    fn unresolved_token_is_an_error() {
        let err = substitute("{{ghost}}", &AnswerMap::empty(), &[], &origin()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn text_without_tokens_passes_through() {
        let out = substitute("plain text { } {not a token", &AnswerMap::empty(), &[], &origin())
            .unwrap();
        assert_eq!(out, "plain text { } {not a token");
    }

    #[test]
    fn unterminated_braces_are_literal() {
        let out = substitute("open {{ never closes", &AnswerMap::empty(), &[], &origin()).unwrap();
        assert_eq!(out, "open {{ never closes");
    }

    #[test]
    fn multiple_tokens_in_one_line() {
        let map = answers([("a", "1"), ("b", "2")]);
        let out = substitute("{{a}}-{{b}}-{{a}}", &map, &[], &origin()).unwrap();
        assert_eq!(out, "1-2-1");
    }
}
