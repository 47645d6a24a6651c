use template::{
    CollectingDiagnostics, Diagnostic, Diagnostics, ListItem, ListKind, LoadError,
    MAX_TEMPLATE_FILESIZE_KIB, ScalarBatch, Template, TemplateConfig, Value,
};

fn batch(pairs: &[(&str, &str)]) -> ScalarBatch {
    pairs.iter().copied().collect()
}

#[test]
fn default_size_limit_uses_rounded_kib() {
    let dir = tempfile::tempdir().expect("tempdir");
    let limit_bytes = MAX_TEMPLATE_FILESIZE_KIB as usize * 1024;

    let at_limit = dir.path().join("at_limit.html");
    std::fs::write(&at_limit, "a".repeat(limit_bytes + 511)).expect("write");
    assert!(Template::open(&at_limit, TemplateConfig::default()).is_ok());

    let over = dir.path().join("over.html");
    std::fs::write(&over, "a".repeat(limit_bytes + 512)).expect("write");
    match Template::open(&over, TemplateConfig::default()) {
        Err(LoadError::TooLarge {
            size_kib,
            limit_kib,
            ..
        }) => {
            assert_eq!(size_kib, MAX_TEMPLATE_FILESIZE_KIB + 1);
            assert_eq!(limit_kib, MAX_TEMPLATE_FILESIZE_KIB);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }

    let empty = dir.path().join("empty.html");
    std::fs::write(&empty, "").expect("write");
    let page = Template::open(&empty, TemplateConfig::default()).expect("empty file opens");
    assert_eq!(page.markup(), "");
}

#[test]
fn missing_file_error_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.html");
    let err = Template::open(&path, TemplateConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
    assert!(err.to_string().contains("absent.html"), "{err}");
}

#[test]
fn a_borrowed_sink_sees_every_diagnostic() {
    let mut sink = CollectingDiagnostics::new();
    {
        let mut page = Template::from_markup("<p>[##_n_##]</p>", TemplateConfig::default())
            .with_diagnostics(&mut sink);
        let mut numbers = ScalarBatch::new();
        numbers.insert("n", 1.5);
        page.register_scalar_batch(numbers);
        page.register_list_items(ListKind::Ordered, "absent", vec![ListItem::text("x")]);
        page.apply();
        assert_eq!(page.markup(), "<p>[##_n_##]</p>");
    }
    assert_eq!(
        sink.messages(),
        &[
            "item of element 'n' is not string type. type: float".to_string(),
            "can't find tag => absent".to_string(),
        ]
    );
}

#[test]
fn every_marker_occurrence_is_replaced_and_pending_state_tracks_queues() {
    let mut page = Template::from_markup(
        "<a href=\"/u/[##_user_##]\" title=\"[##_user_##]\">[##_user_##]</a><roles></roles>",
        TemplateConfig::default(),
    );
    assert!(!page.has_pending_work());
    page.register_scalar_batch(batch(&[("user", "ana")]));
    assert!(page.has_pending_work());
    page.register_list_batch(ListKind::Unordered, "roles", ["admin", "editor"]);
    page.apply();
    assert!(!page.has_pending_work());
    assert!(!page.markup().contains("[##_user_##]"));
    assert_eq!(
        page.markup(),
        "<a href=\"/u/ana\" title=\"ana\">ana</a><ul><li>admin</li><li>editor</li></ul>"
    );

    let before = page.markup().to_string();
    page.apply();
    assert_eq!(page.markup(), before);
}

#[test]
fn lists_and_scalars_survive_surrounding_markup_untouched() {
    let markup = "<div class=\"wrap\"><p>keep <b>this</b></p><ol id=\"x\"><li>old</li></ol><br><p>tail</p></div>";
    let mut page = Template::from_markup(markup, TemplateConfig::default());
    page.register_list_value(&Value::from(1), &Value::from("ol"), Value::from(vec!["a", "b", "c"]));
    page.apply();
    assert_eq!(
        page.markup(),
        "<div class=\"wrap\"><p>keep <b>this</b></p><ol><li>a</li><li>b</li><li>c</li></ol><br><p>tail</p></div>"
    );
}

#[test]
fn sibling_references_and_opaque_markup_survive_list_injection() {
    let markup = "<?xml version=\"1.0\"?><footer title=\"&copy; Co\">&copy; 2024 &mdash; Co &amp;copy;</footer>\
                  <svg><![CDATA[a < b && c]]></svg><menu></menu>";
    let mut page = Template::from_markup(markup, TemplateConfig::default());
    page.register_list_batch(ListKind::Unordered, "menu", ["a"]);
    page.apply();
    assert_eq!(
        page.markup(),
        "<?xml version=\"1.0\"?><footer title=\"&copy; Co\">&copy; 2024 &mdash; Co &amp;copy;</footer>\
         <svg><![CDATA[a < b && c]]></svg><ul><li>a</li></ul>"
    );
}

#[test]
fn deeply_nested_markup_renders_without_recursion() {
    let depth = 80_000;
    let markup = format!("{}<menu></menu>", "<b>".repeat(depth));
    let mut page = Template::from_markup(markup, TemplateConfig::default());
    page.register_list_batch(ListKind::Unordered, "menu", ["a"]);
    page.apply();
    let expected = format!(
        "{}<ul><li>a</li></ul>{}",
        "<b>".repeat(depth),
        "</b>".repeat(depth)
    );
    assert!(page.markup() == expected, "deep markup did not round-trip");
}

#[test]
fn custom_sinks_receive_structured_reports() {
    #[derive(Default)]
    struct Counting {
        missing: usize,
        other: usize,
    }
    impl Diagnostics for Counting {
        fn warn(&mut self, _message: &str) {
            self.other += 1;
        }
        fn report(&mut self, diagnostic: &Diagnostic) {
            match diagnostic {
                Diagnostic::TargetNotFound { .. } => self.missing += 1,
                _ => self.other += 1,
            }
        }
    }

    let mut page = Template::from_markup("<p></p>", TemplateConfig::default())
        .with_diagnostics(Counting::default());
    page.register_list_batch(ListKind::Unordered, "a", ["1"]);
    page.register_list_batch(ListKind::Ordered, "b", [Value::from(false)]);
    page.apply();
    assert_eq!(page.diagnostics().missing, 2);
    assert_eq!(page.diagnostics().other, 1);
}
