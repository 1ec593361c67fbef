//! End-to-end rendering of the documented template features

use minibars::{compile, Context, TemplateError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn context(value: serde_json::Value) -> Context {
    Context::from_json(&value).unwrap()
}

fn render(template: &str, value: serde_json::Value) -> String {
    compile(template)
        .unwrap()
        .render(Some(&context(value)))
        .unwrap()
}

fn without_spaces(s: String) -> String {
    s.replace(' ', "")
}

#[test]
fn test_standard_variables() {
    let template = "<div>   <p>{{message1}}</p>   <p>{{message2}}</p></div>";
    assert_eq!(
        render(template, json!({"message1": "Hello", "message2": "World"})),
        "<div>   <p>Hello</p>   <p>World</p></div>"
    );
}

#[test]
fn test_expressions() {
    let template = compile("<div>{{message.indexOf('Hello') > -1}}</div>").unwrap();
    let ctx = context(json!({"message": "Hello World"}));
    assert_eq!(template.render(Some(&ctx)).unwrap(), "<div>true</div>");
    let ctx = context(json!({"message": "Lol"}));
    assert_eq!(template.render(Some(&ctx)).unwrap(), "<div>false</div>");
}

#[test]
fn test_multi_variable_expressions() {
    let template = "<div>{{message1 === message2}}</div>";
    assert_eq!(
        render(template, json!({"message1": "abc", "message2": "abc"})),
        "<div>true</div>"
    );
    assert_eq!(
        render(template, json!({"message1": "abc", "message2": "abd"})),
        "<div>false</div>"
    );
}

#[test]
fn test_global_interfaces() {
    let output = compile("<div>{{new Date().toLocaleDateString()}}</div>")
        .unwrap()
        .render(None)
        .unwrap();
    let date = regex::Regex::new(r"^<div>\d{1,2}/\d{1,2}/\d{4}</div>$").unwrap();
    assert!(date.is_match(&output), "unexpected date output {}", output);

    assert_eq!(
        render("<div>{{Array.isArray(items)}}</div>", json!({"items": []})),
        "<div>true</div>"
    );
}

#[test]
fn test_instanceof_keyword() {
    assert_eq!(
        render("<div>{{message instanceof Array}}</div>", json!({"message": []})),
        "<div>true</div>"
    );
}

#[test]
fn test_declared_globals() {
    let template = [
        "{{@globals myglobalvariable, anotherglobal}}",
        "",
        "<div>",
        "   <p>{{myglobalvariable}}-{{anotherglobal}}</p>",
        "</div>",
    ]
    .join("\n");

    let mut globals = Context::new();
    globals.set("myglobalvariable", "hello");
    globals.set("anotherglobal", "world");

    let output = compile(&template)
        .unwrap()
        .render_with_globals(None, &globals)
        .unwrap();
    assert_eq!(without_spaces(output), "<div><p>hello-world</p></div>");
}

#[test]
fn test_simple_if() {
    let template = "<div>   {{#if message}}   <p>truthy</p>   {{/if}}</div>";
    assert_eq!(
        without_spaces(render(template, json!({"message": "hello"}))),
        "<div><p>truthy</p></div>"
    );
    assert_eq!(
        without_spaces(render(template, json!({"message": ""}))),
        "<div></div>"
    );
}

#[test]
fn test_complex_if() {
    let template = "<div>   {{#if message1 === message2}}   <p>truthy</p>   {{/if}}</div>";
    assert_eq!(
        without_spaces(render(
            template,
            json!({"message1": "hello", "message2": "hello"})
        )),
        "<div><p>truthy</p></div>"
    );
    assert_eq!(
        without_spaces(render(
            template,
            json!({"message1": "hello", "message2": "hello1"})
        )),
        "<div></div>"
    );
}

#[test]
fn test_if_else() {
    let template = "<div>   {{#if message1 === message2}}   <p>truthy</p>   {{else}}   <p>falsey</p>   {{/if}}</div>";
    assert_eq!(
        without_spaces(render(
            template,
            json!({"message1": "hello", "message2": "hello"})
        )),
        "<div><p>truthy</p></div>"
    );
    assert_eq!(
        without_spaces(render(
            template,
            json!({"message1": "hello", "message2": "hello1"})
        )),
        "<div><p>falsey</p></div>"
    );
}

#[test]
fn test_nested_if() {
    let template = concat!(
        "<div>",
        "   {{#if message1}}",
        "       <p>truthy message1</p>",
        "       {{#if message2.indexOf('lol') > -1}}",
        "           <p>truthy message2</p>",
        "       {{else}}",
        "           <p>falsey message2</p>",
        "       {{/if}}",
        "   {{/if}}",
        "</div>"
    );
    assert_eq!(
        without_spaces(render(
            template,
            json!({"message1": "hello", "message2": "hello"})
        )),
        "<div><p>truthymessage1</p><p>falseymessage2</p></div>"
    );
}

#[test]
fn test_each_over_values() {
    let template = "<div>   {{#each item in items}}   <p>{{item}}</p>   {{/each}}</div>";
    assert_eq!(
        without_spaces(render(template, json!({"items": [1, 2, 3]}))),
        "<div><p>1</p><p>2</p><p>3</p></div>"
    );
}

#[test]
fn test_each_over_objects() {
    let template = "<div>   {{#each item in items}}   <p>{{item.name}}</p>   {{/each}}</div>";
    assert_eq!(
        without_spaces(render(
            template,
            json!({"items": [{"name": 1}, {"name": 2}, {"name": 3}]})
        )),
        "<div><p>1</p><p>2</p><p>3</p></div>"
    );
}

#[test]
fn test_each_index() {
    let template = "<div>   {{#each item in items}}   <p>{{@index}}</p>   {{/each}}</div>";
    assert_eq!(
        without_spaces(render(template, json!({"items": ["lol", "lol", "lol"]}))),
        "<div><p>0</p><p>1</p><p>2</p></div>"
    );
    assert_eq!(
        render("{{#each item in [1, 2, 3]}}{{@index}},{{/each}}", json!({})),
        "0,1,2,"
    );
}

#[test]
fn test_each_object_keys() {
    let template =
        "<div>   {{#each item in items}}   <p>{{@index}}:{{item.name}}</p>   {{/each}}</div>";
    assert_eq!(
        without_spaces(render(
            template,
            json!({"items": {
                "lol1": {"name": "p1"},
                "lol2": {"name": "p2"},
                "lol3": {"name": "p3"}
            }})
        )),
        "<div><p>lol1:p1</p><p>lol2:p2</p><p>lol3:p3</p></div>"
    );
}

#[test]
fn test_nested_each() {
    let template = concat!(
        "<div>",
        "   {{#each item in items}}",
        "       <p>{{@index}}</p>",
        "       {{#each prop in item}}",
        "           <p>{{@index}}:{{prop}}</p>",
        "       {{/each}}",
        "       <p>end</p>",
        "   {{/each}}",
        "</div>"
    );
    assert_eq!(
        without_spaces(render(
            template,
            json!({"items": {"lol1": {"name": "p1"}, "lol2": {"name": "p2"}}})
        )),
        "<div><p>lol1</p><p>name:p1</p><p>end</p><p>lol2</p><p>name:p2</p><p>end</p></div>"
    );
}

#[test]
fn test_escaping() {
    assert_eq!(
        render(
            "<div>{{message}}</div>",
            json!({"message": "<script>alert</script>"})
        ),
        "<div>&lt;script&gt;alert&lt;/script&gt;</div>"
    );
    assert_eq!(
        render("{{message}}", json!({"message": "a & b \"c\" 'd' `e` = f"})),
        "a &amp; b &quot;c&quot; &#x27;d&#x27; &#x60;e&#x60; &#x3D; f"
    );
}

#[test]
fn test_registry_precedence() {
    let ctx = json!({"JSON": "shadow"});
    assert_eq!(render("{{typeof JSON}}", ctx.clone()), "object");

    let mut globals = Context::new();
    globals.set("JSON", "declared");
    let output = compile("{{@globals JSON}}{{JSON}}")
        .unwrap()
        .render_with_globals(Some(&context(ctx)), &globals)
        .unwrap();
    assert_eq!(output, "declared");
}

#[test]
fn test_unbalanced_if_fails() {
    assert!(matches!(
        compile("{{#if x}}<p>never closed</p>"),
        Err(TemplateError::Syntax { .. })
    ));
    assert!(matches!(
        compile("{{#each x in xs}}{{/if}}"),
        Err(TemplateError::Syntax { .. })
    ));
}

#[test]
fn test_scenario_each_with_if() {
    let template = concat!(
        "<div>",
        "   {{#each item in items}}",
        "       {{#if item === true}}",
        "       <p>truthy</p>",
        "       {{else}}",
        "       <p>falsey</p>",
        "       {{/if}}",
        "   {{/each}}",
        "</div>"
    );
    assert_eq!(
        without_spaces(render(template, json!({"items": [true, true, false]}))),
        "<div><p>truthy</p><p>truthy</p><p>falsey</p></div>"
    );
}

#[test]
fn test_scenario_attributes() {
    assert_eq!(
        render("<div class=\"lol\">{{message}}</div>", json!({"message": "hello"})),
        "<div class=\"lol\">hello</div>"
    );
}

#[test]
fn test_scenario_quotes_in_braces() {
    assert_eq!(
        render(
            r#"<div class="lol">{{message.indexOf("hello") > -1}}</div>"#,
            json!({"message": "hello world"})
        ),
        r#"<div class="lol">true</div>"#
    );
}

#[test]
fn test_scenario_quotes_in_text() {
    assert_eq!(
        render(r#"<div class="lol">"{{message}}"</div>"#, json!({"message": "hello"})),
        r#"<div class="lol">"hello"</div>"#
    );
}

#[test]
fn test_scenario_quotes_everywhere() {
    let template = [
        r#"<div class="lol">"#,
        r#"   {{#if message.indexOf("\"hello\"") > -1}}"#,
        r#"       <p>"{{message}}"</p>"#,
        r#"   {{/if}}"#,
        r#"</div>"#,
    ]
    .join("\n");
    assert_eq!(
        without_spaces(render(&template, json!({"message": "\"hello\""}))),
        r#"<divclass="lol"><p>"&quot;hello&quot;"</p></div>"#
    );
}

#[test]
fn test_number_output() {
    assert_eq!(
        render("{{1e21}} {{0.0000001}} {{1.5e300}} {{(2.5).toFixed(0)}}", json!({})),
        "1e+21 1e-7 1.5e+300 3"
    );
}

#[test]
fn test_oversized_builtins_fail_cleanly() {
    for source in [
        "{{new Date(1e18, 0)}}",
        "{{'ab'.repeat(1e19)}}",
        "{{'ab'.padStart(1e19)}}",
        "{{new Array(4294967295).length}}",
        "{{decodeURIComponent('%+1')}}",
    ] {
        let result = compile(source).unwrap().render(None);
        assert!(
            matches!(result, Err(TemplateError::Evaluation(_))),
            "{} rendered {:?}",
            source,
            result
        );
    }
}
