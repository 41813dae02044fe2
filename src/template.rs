use crate::value::StructuredValue;

/// Render a message template by substituting `{name}` placeholders with
/// the bound property's display form.
///
/// `{{` and `}}` are literal braces. A placeholder whose name has no bound
/// property, or a brace that never closes, is left in the output verbatim
/// so a malformed template still produces a usable message.
pub fn render(template: &str, properties: &[(String, StructuredValue)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(['{', '}']) {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail.find('}') {
            Some(close) => {
                let name = &tail[1..close];
                match properties.iter().find(|(n, _)| n == name) {
                    Some((_, value)) => value.render_compact(&mut out),
                    None => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, StructuredValue)]) -> Vec<(String, StructuredValue)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn substitutes_bound_placeholders() {
        let p = props(&[
            ("user", StructuredValue::scalar("alice")),
            ("count", StructuredValue::scalar(3i64)),
        ]);
        assert_eq!(
            render("user {user} has {count} items", &p),
            "user alice has 3 items"
        );
    }

    #[test]
    fn unknown_placeholders_stay_verbatim() {
        assert_eq!(render("hello {who}", &[]), "hello {who}");
    }

    #[test]
    fn doubled_braces_are_literals() {
        assert_eq!(render("{{not a placeholder}}", &[]), "{not a placeholder}");
    }

    #[test]
    fn unclosed_brace_is_kept() {
        assert_eq!(render("oops {user", &[]), "oops {user");
    }

    #[test]
    fn non_scalar_values_render_compactly() {
        let p = props(&[(
            "ids",
            StructuredValue::Sequence(vec![
                StructuredValue::scalar(1i64),
                StructuredValue::scalar(2i64),
            ]),
        )]);
        assert_eq!(render("ids: {ids}", &p), "ids: [1, 2]");
    }
}
