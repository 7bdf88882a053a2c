use diffex::{parse_opt, Error, Options, Template};
use indexmap::IndexMap;

fn parse(template: &str, input: &str) -> IndexMap<String, String> {
    Template::new(template, Options::default())
        .unwrap()
        .parse(input)
}

fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn parse_matrix() {
    let cases: &[(&str, &str, &[(&str, &str)])] = &[
        ("Hello, {{name}}", "Hello, Bob", &[("name", "Bob")]),
        (
            "Hello, {{name}} it's {{now}} today.",
            "Hello, Bob it's Saturday today.",
            &[("name", "Bob"), ("now", "Saturday")],
        ),
        ("Hello, {{first_name}}", "Hello, Bob", &[("first_name", "Bob")]),
        ("Hello, {{first-name}}", "Hello, Bob", &[("first-name", "Bob")]),
        ("Today is {{day}}", "Today is Saturday", &[("day", "Saturday")]),
        ("Today is {{todayyy}}", "Today is Saturday", &[("todayyy", "Saturday")]),
        ("Hello, {{name}}", "Hello, Bob Bobson", &[("name", "Bob Bobson")]),
        (
            "Heading is \"{{heading}}\"",
            "Heading is \"nice\"",
            &[("heading", "nice")],
        ),
        // Keys may not contain whitespace.
        ("Hello, {{full name}}", "Hello, Bob", &[]),
        ("Hello, {{full name}}", "Hello, Bob Bob Bobson", &[]),
        ("Hello, \n{{name}}", "Hello, \nBob", &[("name", "Bob")]),
        ("Hello, {{name}}", "Hello, Bob\nBobson", &[("name", "Bob\nBobson")]),
        // Blank values are left out.
        (
            "Hello, {{name}} it's {{now}} today.",
            "Hello,  it's Saturday today.",
            &[("now", "Saturday")],
        ),
        // The first non-blank value wins.
        (
            "Hello, {{name}}. I am {{name}}.",
            "Hello, Bob. I am Jim.",
            &[("name", "Bob")],
        ),
        (
            "Hello, {{name}}. I am {{name}}.",
            "Hello, . I am Jim.",
            &[("name", "Jim")],
        ),
        // Text rewrapped at different points than the template.
        (
            "Hello, \n{{name}} how are you today?\n",
            "Hello, Bob \nhow are \nyou today?",
            &[("name", "Bob")],
        ),
        (
            "Hello, {{name}} \nhow are you today?\n",
            "Hello, \nBob how are \nyou today?",
            &[("name", "Bob")],
        ),
        // Values that repeat the template's own words.
        (
            "The direct debit of customer {{name}} at {{company}} for £{{amount}} on {{date}} has failed.",
            "The direct debit of customer John at Doe at ABC for Limited for £60 on 07/10/2015 has failed.",
            &[
                ("name", "John at Doe"),
                ("company", "ABC for Limited"),
                ("amount", "60"),
                ("date", "07/10/2015"),
            ],
        ),
        (
            "The direct debit of customer {{name}} at {{company}} \nfor £{{amount}} on {{date}} has failed.",
            "The direct debit of customer John at Doe at ABC \nfor Limited for £60 on 07/10/2015 has failed.",
            &[
                ("name", "John at Doe"),
                ("company", "ABC \nfor Limited"),
                ("amount", "60"),
                ("date", "07/10/2015"),
            ],
        ),
    ];
    for (template, input, expected) in cases {
        assert_eq!(parse(template, input), map(expected), "{template:?} / {input:?}");
    }
}

#[test]
fn parse_direct_debit_notice() {
    let template =
        "The direct debit of customer {{name}} at {{company}} for £{{amount}} on {{date}} has failed.";
    let input =
        "The direct debit of customer John Doe at ABC Limited for £60 on 07/10/2015 has failed.";
    let values = parse(template, input);
    assert_eq!(
        values,
        map(&[
            ("name", "John Doe"),
            ("company", "ABC Limited"),
            ("amount", "60"),
            ("date", "07/10/2015"),
        ])
    );
    // Insertion order follows the template.
    let keys: Vec<&str> = values.keys().map(String::as_str).collect();
    assert_eq!(keys, ["name", "company", "amount", "date"]);
}

#[test]
fn parse_with_custom_delimiters() {
    let options = Options {
        open: "<%".into(),
        close: "%>".into(),
    };
    let template = Template::new("Dear <%name%>,", options).unwrap();
    assert_eq!(template.parse("Dear Bob,"), map(&[("name", "Bob")]));
}

#[test]
fn unchanged_input_yields_nothing() {
    assert!(parse("Hello, {{name}}", "Hello, {{name}}").is_empty());
    assert!(parse("", "").is_empty());
}

#[test]
fn placeholders_matrix() {
    let template = Template::new(
        "Hi there {{name}}, today is {{today}} and tomorrow is {{tomorrow}}.",
        Options::default(),
    )
    .unwrap();
    assert_eq!(template.placeholders(), vec!["name", "today", "tomorrow"]);

    let template = Template::new("No placeholders here!", Options::default()).unwrap();
    assert!(template.placeholders().is_empty());
}

#[test]
fn absent_inputs_yield_an_empty_map() {
    assert!(parse_opt(None, Some("Hello, Bob")).is_empty());
    assert!(parse_opt(Some("Hello, {{name}}"), None).is_empty());
    assert_eq!(
        parse_opt(Some("Hello, {{name}}"), Some("Hello, Bob")),
        map(&[("name", "Bob")])
    );
}

#[test]
fn empty_delimiter_is_an_error() {
    let options = Options {
        open: "".into(),
        close: "".into(),
    };
    assert!(matches!(
        Template::new("Hello", options),
        Err(Error::InvalidDelimiter(_))
    ));
}
