//! Integration tests for the document API: loading, imports, evaluation,
//! expansion, analysis, and editing.

use std::fs;

use lgen::{Document, EngineConfig, LgenError, Scope, Value};

fn doc(source: &str) -> Document {
    lgen::parse_text(source, "inline.lg").expect("Failed to load document")
}

fn scope_json(json: &str) -> Scope<'static> {
    let json: serde_json::Value = serde_json::from_str(json).expect("invalid test JSON");
    Scope::from_json(&json)
}

#[test]
fn test_text_substitution() {
    let document = doc("# greet(name)\n- Hello ${name}!\n");
    let value = document
        .evaluate("greet", &scope_json(r#"{"name": "Ann"}"#))
        .expect("Failed to evaluate");
    assert_eq!(value, Value::string("Hello Ann!"));
}

#[test]
fn test_single_expression_alternative_keeps_raw_value() {
    let document = doc("# answer\n- ${6 * 7}\n");
    let value = document.evaluate("answer", &Scope::new()).unwrap();
    assert_eq!(value, Value::Number(42.0));
}

#[test]
fn test_conditional_picks_first_matching_branch() {
    let document = doc(concat!(
        "# pick(x)\n",
        "- IF: ${x > 10}\n",
        "  - big\n",
        "- ELSEIF: ${x > 0}\n",
        "  - small\n",
        "- ELSE:\n",
        "  - non-positive\n",
    ));
    let run = |x: f64| {
        document
            .evaluate("pick", &Scope::new().with("x", Value::Number(x)))
            .unwrap()
            .to_string()
    };
    assert_eq!(run(11.0), "big");
    assert_eq!(run(3.0), "small");
    assert_eq!(run(-1.0), "non-positive");
}

#[test]
fn test_switch_matches_subject_then_default() {
    let document = doc(concat!(
        "# day(d)\n",
        "- SWITCH: ${d}\n",
        "- CASE: ${'mon'}\n",
        "  - Monday\n",
        "- DEFAULT:\n",
        "  - Sometime\n",
    ));
    let run = |d: &str| {
        document
            .evaluate("day", &Scope::new().with("d", Value::from(d)))
            .unwrap()
            .to_string()
    };
    assert_eq!(run("mon"), "Monday");
    assert_eq!(run("fri"), "Sometime");
}

#[test]
fn test_structured_body_produces_tagged_value() {
    let document = doc(concat!(
        "# card(name)\n",
        "[Activity\n",
        "    text = Hello ${name}\n",
        "    speak = hi\n",
        "]\n",
    ));
    let value = document
        .evaluate("card", &scope_json(r#"{"name": "Ann"}"#))
        .unwrap();
    match &value {
        Value::Tagged { tag, fields } => {
            assert_eq!(tag, "Activity");
            assert_eq!(fields["text"], Value::string("Hello Ann"));
            assert_eq!(fields["speak"], Value::string("hi"));
        }
        other => panic!("expected tagged value, got {:?}", other),
    }
    assert_eq!(value.to_json()["lgType"], "Activity");
}

#[test]
fn test_template_call_binds_parameters() {
    let document = doc(concat!(
        "# full(first, last)\n",
        "- ${first} ${last}\n",
        "# intro(user)\n",
        "- I am ${full(user.first, user.last)}.\n",
    ));
    let scope = scope_json(r#"{"user": {"first": "Ada", "last": "Lovelace"}}"#);
    let value = document.evaluate("intro", &scope).unwrap();
    assert_eq!(value.to_string(), "I am Ada Lovelace.");
}

#[test]
fn test_zero_argument_call_shares_caller_scope() {
    let document = doc(concat!(
        "# outer(name)\n",
        "- ${inner()}\n",
        "# inner\n",
        "- Hi ${name}\n",
    ));
    let value = document
        .evaluate("outer", &scope_json(r#"{"name": "Ann"}"#))
        .unwrap();
    assert_eq!(value.to_string(), "Hi Ann");
}

#[test]
fn test_bang_suffix_and_lg_prefix_resolve_to_templates() {
    let document = doc(concat!(
        "# greet(name)\n",
        "- Hello ${name}\n",
        "# caller\n",
        "- ${lg.greet('Ann')} / ${greet!('Bob')}\n",
    ));
    let value = document.evaluate("caller", &Scope::new()).unwrap();
    assert_eq!(value.to_string(), "Hello Ann / Hello Bob");
}

#[test]
fn test_missing_template_is_an_error() {
    let document = doc("# a\n- x\n");
    assert!(matches!(
        document.evaluate("nope", &Scope::new()),
        Err(LgenError::TemplateNotFound(name)) if name == "nope"
    ));
}

#[test]
fn test_argument_mismatch_is_never_degraded() {
    let document = doc("# pair(a, b)\n- ${a}${b}\n# caller\n- ${pair(1)}\n");
    // the checker flags this statically
    assert!(document.has_errors());
    assert!(matches!(
        document.evaluate("caller", &Scope::new()),
        Err(LgenError::CheckFailed(_))
    ));
}

#[test]
fn test_literal_dynamic_call_arity_is_checked_statically() {
    // template("b", 1) names `b` literally, so the checker sees the
    // mismatch just like a direct call would
    let document = doc("# a\n- ${template(\"b\", 1)}\n# b\n- bee\n");
    assert!(document.has_errors());
    assert!(matches!(
        document.evaluate("a", &Scope::new()),
        Err(LgenError::CheckFailed(_))
    ));

    // matching arity stays clean
    let document = doc("# a\n- ${template(\"b\", 1)}\n# b(x)\n- bee ${x}\n");
    assert!(!document.has_errors());
    let value = document.evaluate("a", &Scope::new()).unwrap();
    assert_eq!(value.to_string(), "bee 1");
}

mod strict_mode {
    use super::*;

    #[test]
    fn test_lenient_degrades_to_empty() {
        let document = doc("# t\n- a ${missing} b\n");
        assert!(!document.strict_mode());
        let value = document.evaluate("t", &Scope::new()).unwrap();
        assert_eq!(value.to_string(), "a  b");
    }

    #[test]
    fn test_strict_propagates_failures() {
        let document = doc("> ! @strict = true\n# t\n- a ${missing} b\n");
        assert!(document.strict_mode());
        assert!(matches!(
            document.evaluate("t", &Scope::new()),
            Err(LgenError::Eval { template, .. }) if template == "t"
        ));
    }

    #[test]
    fn test_strict_rejects_null_condition() {
        let source = "> ! @strict = true\n# t(x)\n- IF: ${x.flag}\n  - yes\n- ELSE:\n  - no\n";
        let document = doc(source);
        let scope = scope_json(r#"{"x": {"flag": null}}"#);
        assert!(document.evaluate("t", &scope).is_err());
    }

    #[test]
    fn test_last_strict_option_wins() {
        let document = doc("> ! @strict = true\n> ! @strict = false\n# t\n- x\n");
        assert!(!document.strict_mode());
    }
}

mod functions {
    use super::*;

    #[test]
    fn test_builtin_calls() {
        let document = doc(concat!(
            "# t(items)\n",
            "- ${toUpper(join(items, ', '))} has ${length(items)}\n",
        ));
        let scope = scope_json(r#"{"items": ["a", "b"]}"#);
        let value = document.evaluate("t", &scope).unwrap();
        assert_eq!(value.to_string(), "A, B has 2");
    }

    #[test]
    fn test_custom_function_shadows_builtin() {
        let document = doc("# t\n- ${trim(' x ')}\n");
        let config = EngineConfig::new()
            .with_function("trim", |_args| Ok(Value::string("custom")));
        let value = document
            .evaluate_with("t", &Scope::new(), &config)
            .unwrap();
        assert_eq!(value.to_string(), "custom");
    }

    #[test]
    fn test_custom_function_error_degrades_when_lenient() {
        let document = doc("# t\n- [${boom()}]\n");
        let config =
            EngineConfig::new().with_function("boom", |_args| Err("always fails".to_string()));
        let value = document
            .evaluate_with("t", &Scope::new(), &config)
            .unwrap();
        assert_eq!(value.to_string(), "[]");
    }

    #[test]
    fn test_dynamic_template_call() {
        let document = doc("# a\n- ${template(which)}\n# b\n- bee\n");
        let value = document
            .evaluate("a", &Scope::new().with("which", Value::from("b")))
            .unwrap();
        assert_eq!(value.to_string(), "bee");
    }

    #[test]
    fn test_is_template() {
        let document = doc("# t\n- ${if(isTemplate('t'), 'yes', 'no')}-${if(isTemplate('u'), 'yes', 'no')}\n");
        let value = document.evaluate("t", &Scope::new()).unwrap();
        assert_eq!(value.to_string(), "yes-no");
    }

    #[test]
    fn test_activity_attachment() {
        let document = doc("# att\n- ${ActivityAttachment('hello', 'plain')}\n");
        let value = document.evaluate("att", &Scope::new()).unwrap();
        match &value {
            Value::Tagged { tag, fields } => {
                assert_eq!(tag, "attachment");
                assert_eq!(fields["contenttype"], Value::string("plain"));
                assert_eq!(fields["content"], Value::string("hello"));
            }
            other => panic!("expected attachment, got {:?}", other),
        }
    }

    #[test]
    fn test_recursion_limit() {
        let document = doc("# loop\n- ${loop()}\n");
        let config = EngineConfig::new().with_max_depth(16);
        assert!(matches!(
            document.evaluate_with("loop", &Scope::new(), &config),
            Err(LgenError::RecursionLimitExceeded { limit: 16, .. })
        ));
    }

    #[test]
    fn test_from_file_substitutes_expressions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("snippet.txt"), "Name: ${name}").unwrap();
        let main = dir.path().join("main.lg");
        fs::write(&main, "# t\n- ${fromFile('snippet.txt')}\n").unwrap();

        let document = lgen::parse_file(&main).unwrap();
        let value = document
            .evaluate("t", &scope_json(r#"{"name": "Ann"}"#))
            .unwrap();
        assert_eq!(value.to_string(), "Name: Ann");
    }
}

mod imports {
    use super::*;

    #[test]
    fn test_diamond_import_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.lg"), "# shared\n- common\n").unwrap();
        fs::write(
            dir.path().join("a.lg"),
            "[common](./common.lg)\n\n# fromA\n- A ${shared()}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.lg"),
            "[common](./common.lg)\n\n# fromB\n- B ${shared()}\n",
        )
        .unwrap();
        let main = dir.path().join("main.lg");
        fs::write(
            &main,
            "[a](./a.lg)\n[b](./b.lg)\n\n# both\n- ${fromA()} ${fromB()}\n",
        )
        .unwrap();

        let document = lgen::parse_file(&main).unwrap();
        assert_eq!(document.references().len(), 3, "common.lg must load once");
        assert!(document.imports().iter().all(|i| !i.resolved_id.is_empty()));

        let value = document.evaluate("both", &Scope::new()).unwrap();
        assert_eq!(value.to_string(), "A common B common");
    }

    #[test]
    fn test_missing_import_fails_with_target() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main.lg");
        fs::write(&main, "[gone](./gone.lg)\n\n# t\n- x\n").unwrap();

        match lgen::parse_file(&main) {
            Err(LgenError::Import { id, .. }) => assert_eq!(id, "./gone.lg"),
            other => panic!("expected import error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_template_across_documents_blocks_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.lg"), "# greet\n- from lib\n").unwrap();
        let main = dir.path().join("main.lg");
        fs::write(&main, "[lib](./lib.lg)\n\n# greet\n- from main\n").unwrap();

        let document = lgen::parse_file(&main).unwrap();
        assert!(document.has_errors());
        assert!(matches!(
            document.evaluate("greet", &Scope::new()),
            Err(LgenError::CheckFailed(err)) if err.to_string().contains("greet")
        ));
    }

    #[test]
    fn test_parse_files_shares_common_imports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.lg"), "# shared\n- common\n").unwrap();
        let r1 = dir.path().join("r1.lg");
        let r2 = dir.path().join("r2.lg");
        fs::write(&r1, "[c](./common.lg)\n\n# t1\n- 1 ${shared()}\n").unwrap();
        fs::write(&r2, "[c](./common.lg)\n\n# t2\n- 2 ${shared()}\n").unwrap();

        let documents = lgen::parse_files(&[&r1, &r2]).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[0]
                .evaluate("t1", &Scope::new())
                .unwrap()
                .to_string(),
            "1 common"
        );
        assert_eq!(
            documents[1]
                .evaluate("t2", &Scope::new())
                .unwrap()
                .to_string(),
            "2 common"
        );
    }
}

mod expansion {
    use super::*;

    #[test]
    fn test_expand_multiplies_template_calls() {
        let document = doc(concat!(
            "# hello\n",
            "- hi\n",
            "- hello\n",
            "# greeting(name)\n",
            "- ${hello()} ${name}\n",
            "- Good day ${name}\n",
        ));
        let values = document
            .expand("greeting", &scope_json(r#"{"name": "Ann"}"#))
            .unwrap();
        let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
        assert_eq!(rendered, vec!["hi Ann", "hello Ann", "Good day Ann"]);
    }

    #[test]
    fn test_expand_evaluates_nested_template_calls() {
        // only a call that is the whole expression multiplies; a call
        // nested inside a larger expression takes its first alternative
        let document = doc(concat!(
            "# hello\n",
            "- hi\n",
            "- hello\n",
            "# shout\n",
            "- ${toUpper(hello())}\n",
        ));
        let values = document.expand("shout", &Scope::new()).unwrap();
        let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
        assert_eq!(rendered, vec!["HI"]);
    }

    #[test]
    fn test_expand_enumerates_all_branches() {
        let document = doc(concat!(
            "# pick(x)\n",
            "- IF: ${x > 0}\n",
            "  - pos\n",
            "- ELSE:\n",
            "  - neg\n",
        ));
        let values = document
            .expand("pick", &Scope::new().with("x", Value::Number(5.0)))
            .unwrap();
        let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
        assert_eq!(rendered, vec!["pos", "neg"], "conditions must not prune");
    }

    #[test]
    fn test_expand_structured_is_cartesian() {
        let document = doc(concat!(
            "# card\n",
            "[Activity\n",
            "    text = a | b\n",
            "    speak = x | y\n",
            "]\n",
        ));
        let values = document.expand("card", &Scope::new()).unwrap();
        assert_eq!(values.len(), 4);
        let texts: Vec<&Value> = values.iter().filter_map(|v| v.field("text")).collect();
        // leftmost binding varies slowest
        assert_eq!(
            texts,
            vec![
                &Value::string("a"),
                &Value::string("a"),
                &Value::string("b"),
                &Value::string("b"),
            ]
        );
    }
}

mod analysis {
    use super::*;

    #[test]
    fn test_analyze_reports_free_variables_and_references() {
        let document = doc(concat!(
            "# a(p)\n",
            "- ${greeting} ${p} ${b()}\n",
            "# b\n",
            "- ${user.name}\n",
        ));
        let result = document.analyze("a").unwrap();
        assert_eq!(result.variables, vec!["greeting", "user.name"]);
        assert_eq!(result.template_references, vec!["b"]);
    }

    #[test]
    fn test_analyze_handles_recursive_templates() {
        let document = doc("# a\n- ${b()}\n# b\n- ${a()} ${x}\n");
        let result = document.analyze("a").unwrap();
        assert_eq!(result.variables, vec!["x"]);
        assert_eq!(result.template_references, vec!["b", "a"]);
    }

    #[test]
    fn test_analyze_sees_literal_dynamic_references() {
        let document = doc("# a\n- ${template('b')}\n# b\n- bee\n");
        let result = document.analyze("a").unwrap();
        assert_eq!(result.template_references, vec!["b"]);
    }
}

mod editing {
    use super::*;

    #[test]
    fn test_add_then_delete_round_trip() {
        let original = doc("# a\n- one\n\n# b\n- two\n");
        let added = original
            .add_template("c", Some(vec!["x".to_string()]), "- see ${x}")
            .unwrap();
        assert_eq!(
            added
                .evaluate("c", &Scope::new().with("x", Value::from("me")))
                .unwrap()
                .to_string(),
            "see me"
        );

        let removed = added.delete_template("c").unwrap();
        assert!(removed.template("c").is_none());
        for name in ["a", "b"] {
            assert_eq!(
                removed.template(name).unwrap().body,
                original.template(name).unwrap().body,
                "untouched template `{}` must survive edits intact",
                name
            );
        }
    }

    #[test]
    fn test_add_existing_name_is_rejected() {
        let document = doc("# a\n- one\n");
        assert!(matches!(
            document.add_template("a", None, "- again"),
            Err(LgenError::AlreadyExists(name)) if name == "a"
        ));
    }

    #[test]
    fn test_update_renames_and_reparameterizes() {
        let document = doc("# a\n- one\n\n# b\n- two\n");
        let updated = document
            .update_template("a", "a2", Some(vec!["x".to_string()]), "- X ${x}")
            .unwrap();
        assert!(updated.template("a").is_none());
        assert_eq!(
            updated
                .evaluate("a2", &Scope::new().with("x", Value::Number(1.0)))
                .unwrap()
                .to_string(),
            "X 1"
        );
        assert_eq!(
            updated.evaluate("b", &Scope::new()).unwrap().to_string(),
            "two"
        );
    }

    #[test]
    fn test_update_demotes_header_lines_in_body() {
        let document = doc("# a\n- one\n");
        let updated = document
            .update_template("a", "a", None, "# not a header\n- real")
            .unwrap();
        assert_eq!(updated.templates().len(), 1);
        assert_eq!(
            updated.evaluate("a", &Scope::new()).unwrap().to_string(),
            "# not a header"
        );
    }

    #[test]
    fn test_delete_referenced_template_fails_at_runtime() {
        let document = doc("# a\n- ${template(\"b\")}\n# b\n- bee\n");
        assert_eq!(
            document.evaluate("a", &Scope::new()).unwrap().to_string(),
            "bee"
        );

        let edited = document.delete_template("b").unwrap();
        // the dangling reference is a warning, not an error
        assert!(!edited.has_errors());
        assert!(matches!(
            edited.evaluate("a", &Scope::new()),
            Err(LgenError::TemplateNotFound(name)) if name == "b"
        ));
    }

    #[test]
    fn test_imported_templates_cannot_be_edited() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.lg"), "# li\n- lib\n").unwrap();
        let main = dir.path().join("main.lg");
        fs::write(&main, "[lib](./lib.lg)\n\n# t\n- ${li()}\n").unwrap();

        let document = lgen::parse_file(&main).unwrap();
        assert!(document.template("li").is_some());
        assert!(matches!(
            document.update_template("li", "li", None, "- nope"),
            Err(LgenError::TemplateNotFound(name)) if name == "li"
        ));
    }
}
