//! Library API integration tests
use rolemark_core::*;
use scraper::{Html, Selector};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn label_counted(html: &str, config: &LabelConfig) -> (LabeledDocument, Arc<LabelStats>) {
    let stats = Arc::new(LabelStats::new());
    let labeled = label_html_with_stats(html, config, stats.clone()).expect("should label");
    (labeled, stats)
}

fn roles_of(html: &str, selector: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(selector).unwrap();
    doc.select(&selector)
        .filter_map(|el| el.value().attr("data-mobile-role").map(str::to_string))
        .collect()
}

/// Writer whose bytes stay readable while a rewriter owns it.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn take_string(&self) -> String {
        String::from_utf8(std::mem::take(&mut *self.0.borrow_mut())).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_news_page_roles() {
    let (labeled, stats) = label_counted(&read_fixture("news_page.html"), &LabelConfig::default());
    let summary = &labeled.summary;

    assert_eq!(summary.ids.header, vec!["masthead"]);
    assert_eq!(summary.ids.navigational, vec!["rolemark-2", "rolemark-2-0"]);
    assert_eq!(summary.ids.content, vec!["story"]);
    assert_eq!(summary.ids.marginal, vec!["rolemark-4", "rolemark-5"]);
    assert_eq!(summary.labeled, 6);
    assert_eq!(summary.inferred, 6);
    assert_eq!(summary.unlabeled, 0);

    assert_eq!(roles_of(&labeled.html, "#masthead"), vec!["header"]);
    assert_eq!(roles_of(&labeled.html, "div.topnav > ul"), vec!["navigational"]);
    assert_eq!(roles_of(&labeled.html, "footer"), vec!["marginal"]);
    assert!(roles_of(&labeled.html, "li, a, h1, p").is_empty());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.pages_labeled, 1);
    assert_eq!(snapshot.pages_role_added, 1);
    assert_eq!(snapshot.header_roles, 1);
    assert_eq!(snapshot.navigational_roles, 2);
    assert_eq!(snapshot.content_roles, 1);
    assert_eq!(snapshot.marginal_roles, 2);
    assert_eq!(snapshot.elements_unlabeled, 0);
}

#[test]
fn test_news_page_summary_block() {
    let labeled = label_html(&read_fixture("news_page.html")).unwrap();
    let expected = "<script type=\"text/javascript\" data-mobile-role-summary>\
                    mobileHeaderIds=['masthead'];\n\
                    mobileNavigationalIds=['rolemark-2','rolemark-2-0'];\n\
                    mobileContentIds=['story'];\n\
                    mobileMarginalIds=['rolemark-4','rolemark-5'];\n\
                    </script></body>";
    assert!(labeled.html.contains(expected));
    assert_eq!(labeled.html.matches("data-mobile-role-summary").count(), 1);
    assert!(labeled.html.starts_with("<!DOCTYPE html>\n<html>"));
}

#[test]
fn test_relabeling_is_idempotent() {
    let first = label_html(&read_fixture("news_page.html")).unwrap();
    let (second, stats) = label_counted(&first.html, &LabelConfig::default());

    assert_eq!(second.html, first.html);
    assert_eq!(second.summary.ids, first.summary.ids);
    assert_eq!(second.summary.inferred, 0);
    assert_eq!(stats.get(Counter::PagesLabeled), 1);
    assert_eq!(stats.get(Counter::PagesRoleAdded), 0);
    assert_eq!(stats.get(Counter::NavigationalRoles), 0);
}

#[test]
fn test_relabeling_verbose_output_is_idempotent() {
    let config = LabelConfig::builder().verbose(true).build();
    let first = label_html_with_config(&read_fixture("news_page.html"), &config).unwrap();
    let second = label_html_with_config(&first.html, &config).unwrap();
    assert_eq!(second.html, first.html);
}

#[test]
fn test_relabeling_verbose_keeps_unlabeled_elements_unlabeled() {
    let config = LabelConfig::builder().verbose(true).build();
    let html = "<div id=\"main\"><div>Some text here</div><p>x</p></div>";
    let first = label_html_with_config(html, &config).unwrap();
    assert!(first.html.starts_with("<div id=\"main\" data-mobile-role=\"content\"><div id=\"rolemark-main-0\">"));

    let second = label_html_with_config(&first.html, &config).unwrap();
    assert_eq!(second.html, first.html);
    assert_eq!(second.summary.ids.content, vec!["main"]);
    assert_eq!(second.summary.inferred, 0);
}

#[test]
fn test_non_ascii_identifier_kept() {
    let labeled = label_html("<header id='g\u{142}\u{f3}wna'>Header</header>").unwrap();
    assert_eq!(
        labeled.html,
        "<header id=\"główna\" data-mobile-role=\"header\">Header</header>\
         <script type=\"text/javascript\" data-mobile-role-summary>mobileHeaderIds=['główna'];\n</script>"
    );
    assert_eq!(labeled.summary.ids.header, vec!["główna"]);
}

#[test]
fn test_quotes_and_slashes_identifier_escaped() {
    let labeled = label_html(r#"<header id="'Quotes'\slashes">Header</header>"#).unwrap();
    assert!(labeled.html.starts_with(r#"<header id="'Quotes'\slashes" data-mobile-role="header">Header</header>"#));
    assert!(labeled.html.contains(r"mobileHeaderIds=['\'Quotes\'\\slashes'];"));
}

#[test]
fn test_script_end_in_identifier_escaped() {
    let labeled = label_html(r#"<nav id="a</script>b">Home</nav>"#).unwrap();
    assert!(labeled.html.contains(r"mobileNavigationalIds=['a<\/script>b'];"));
    let block = &labeled.html[labeled.html.find("<script").unwrap()..];
    assert_eq!(block.matches("</script>").count(), 1);
}

#[test]
fn test_blank_identifier_replaced() {
    let labeled = label_html("<nav id=\"  \">Home</nav><nav id=\"\">Away</nav>").unwrap();
    assert!(labeled.html.starts_with(
        "<nav id=\"rolemark-0\" data-mobile-role=\"navigational\">Home</nav>\
         <nav id=\"rolemark-1\" data-mobile-role=\"navigational\">Away</nav>"
    ));
}

#[test]
fn test_synthesized_identifier_avoids_existing() {
    let labeled = label_html("<div id=\"rolemark-1\">plain</div><nav>Home</nav>").unwrap();
    assert_eq!(labeled.summary.ids.navigational, vec!["rolemark-1~1"]);
}

#[test]
fn test_synthesized_identifier_yields_to_later_explicit_id() {
    let labeled = label_html("<nav>Home</nav><footer id=\"rolemark-0\">Fine print</footer>").unwrap();
    assert_eq!(labeled.summary.ids.navigational, vec!["rolemark-0~1"]);
    assert_eq!(labeled.summary.ids.marginal, vec!["rolemark-0"]);

    let doc = Html::parse_document(&labeled.html);
    let selector = Selector::parse("[id=\"rolemark-0\"]").unwrap();
    assert_eq!(doc.select(&selector).count(), 1);
}

#[test]
fn test_identifier_path_under_named_ancestor() {
    let labeled = label_html("<div id=\"page\"><p>intro</p><aside>Related</aside></div>").unwrap();
    assert_eq!(labeled.summary.ids.marginal, vec!["page", "rolemark-page-1"]);
}

#[test]
fn test_unanimous_children_label_parent() {
    let labeled = label_html("<div class=\"wrap\"><nav>One</nav><nav>Two</nav></div>").unwrap();
    assert_eq!(roles_of(&labeled.html, "div.wrap"), vec!["navigational"]);
    assert_eq!(labeled.summary.ids.navigational, vec!["rolemark-0", "rolemark-0-0", "rolemark-0-1"]);
}

#[test]
fn test_split_children_leave_parent_unlabeled() {
    let (labeled, stats) =
        label_counted("<div class=\"wrap\"><header>Top</header><nav>Menu</nav></div>", &LabelConfig::default());
    assert!(roles_of(&labeled.html, "div.wrap").is_empty());
    assert_eq!(labeled.summary.labeled, 2);
    assert_eq!(stats.get(Counter::ElementsUnlabeled), 1);
}

#[test]
fn test_marginal_child_breaks_unanimity() {
    let labeled = label_html("<div class=\"wrap\"><nav>One</nav><aside>Two</aside></div>").unwrap();
    assert!(roles_of(&labeled.html, "div.wrap").is_empty());
    assert_eq!(labeled.summary.ids.navigational, vec!["rolemark-0-0"]);
    assert_eq!(labeled.summary.ids.marginal, vec!["rolemark-0-1"]);
}

#[test]
fn test_ineligible_tags_do_not_inherit() {
    let labeled = label_html(
        "<ul><li><nav>One</nav></li><li><nav>Two</nav></li></ul><p><span><aside>Aside</aside></span></p>",
    )
    .unwrap();
    assert!(roles_of(&labeled.html, "li, p, span").is_empty());
    assert_eq!(roles_of(&labeled.html, "nav"), vec!["navigational", "navigational"]);
    assert_eq!(roles_of(&labeled.html, "aside"), vec!["marginal"]);
    assert_eq!(labeled.summary.labeled, 3);
}

#[test]
fn test_marginal_bubbles_through_unlabeled_ancestors() {
    let labeled =
        label_html("<div id=\"outer\"><div id=\"inner\"><footer>Fine print</footer></div></div>").unwrap();
    assert_eq!(labeled.summary.ids.marginal, vec!["outer", "inner", "rolemark-inner-0"]);
}

#[test]
fn test_marginal_bubbles_through_ambiguous_parent() {
    let labeled = label_html("<div class=\"footer-menu\"><aside>Related links</aside></div>").unwrap();
    assert_eq!(roles_of(&labeled.html, "div.footer-menu"), vec!["marginal"]);
}

#[test]
fn test_marginal_stops_at_labeled_ancestor() {
    let labeled = label_html("<article><div><aside>Related</aside></div><p>Body text</p></article>").unwrap();
    assert_eq!(roles_of(&labeled.html, "article"), vec!["content"]);
    assert_eq!(roles_of(&labeled.html, "article > div"), vec!["marginal"]);
}

#[test]
fn test_anchor_contents_not_labeled() {
    let (labeled, stats) = label_counted(
        "<a href=\"/\"><div class=\"nav\">Home</div></a><a href=\"/x\"><nav>Away</nav></a>",
        &LabelConfig::default(),
    );
    assert!(labeled.summary.ids.is_empty());
    assert!(labeled.html.ends_with("<!--No elements labeled for mobile layout-->"));
    assert_eq!(stats.get(Counter::ElementsUnlabeled), 2);
}

#[test]
fn test_nested_anchors_label_inner_container() {
    let labeled = label_html(
        "<a href=\"/x\"><div class=\"menu\"><a href=\"/1\">one</a> <a href=\"/2\">two</a></div></a>",
    )
    .unwrap();
    assert!(labeled.html.starts_with(
        "<a href=\"/x\"><div class=\"menu\" id=\"rolemark-0-0\" data-mobile-role=\"navigational\">"
    ));
    assert!(roles_of(&labeled.html, "a").is_empty());
    assert_eq!(labeled.summary.ids.navigational, vec!["rolemark-0-0"]);
    assert_eq!(labeled.summary.labeled, 1);
}

#[test]
fn test_no_labelable_content() {
    let (labeled, stats) = label_counted(&read_fixture("no_content.html"), &LabelConfig::default());
    assert!(labeled.html.contains("<!--No elements labeled for mobile layout--></body>"));
    assert!(!labeled.html.contains("<script"));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.pages_labeled, 1);
    assert_eq!(
        snapshot,
        StatsSnapshot { pages_labeled: 1, ..Default::default() }
    );
}

#[test]
fn test_debug_comment_contents() {
    let config = LabelConfig::builder().verbose(true).build();
    let html = "<div role='header'>  Hello there, <a href='http://theworld.com/'>World</a></div>";
    let labeled = label_html_with_config(html, &config).unwrap();
    assert_eq!(
        labeled.html,
        "<div role=\"header\" id=\"rolemark-0\" data-mobile-role=\"header\">  Hello there, \
         <a href=\"http://theworld.com/\">World</a></div>\
         <!--id: rolemark-0, role: header, ElementTagDepth: 1, ContainedTagDepth: 2, \
         ContainedTagRelativeDepth: 1, ContainedTagCount: 2, ContainedTagPercent: 100.00, \
         ContainedContentBytes: 17, ContainedContentPercent: 100.00, ContainedNonBlankBytes: 16, \
         ContainedNonBlankPercent: 100.00, ContainedAContentBytes: 5, ContainedAContentLocalPercent: 29.41, \
         ContainedNonAContentBytes: 12, head: 1, a count: 1, a percent: 50.00, div count: 1, \
         div percent: 50.00-->\
         <script type=\"text/javascript\" data-mobile-role-summary>mobileHeaderIds=['rolemark-0'];\n</script>"
    );
}

#[test]
fn test_debug_comment_names_labeled_ancestor() {
    let config = LabelConfig::builder().verbose(true).build();
    let labeled = label_html_with_config("<div class=\"wrap\"><nav>One</nav></div>", &config).unwrap();
    assert!(labeled.html.contains("<!--id: rolemark-0-0, role: navigational, ElementTagDepth: 2,"));
    assert!(labeled.html.contains("parent role is navigational-->"));
    assert!(labeled.html.contains("inherited from children"));
}

#[test]
fn test_ambiguous_signals_counted() {
    let config = LabelConfig::builder().verbose(true).build();
    let (labeled, stats) = label_counted("<div class=\"footer-menu\">Links and fine print</div>", &config);
    assert!(labeled.summary.ids.is_empty());
    assert!(labeled.html.contains("outcome: ambiguous-->"));
    assert_eq!(labeled.summary.ambiguous, 1);
    assert_eq!(stats.get(Counter::AmbiguousRoleLabels), 1);
    assert_eq!(stats.get(Counter::ElementsUnlabeled), 1);
}

#[test]
fn test_explicit_roles_kept_and_not_counted() {
    let (labeled, stats) = label_counted(
        "<div data-mobile-role=\"marginal\">Aside</div><nav data-mobile-role=\"content\">Story</nav>",
        &LabelConfig::default(),
    );
    assert!(labeled.html.starts_with(
        "<div data-mobile-role=\"marginal\" id=\"rolemark-0\">Aside</div>\
         <nav data-mobile-role=\"content\" id=\"rolemark-1\">Story</nav>"
    ));
    assert_eq!(labeled.summary.ids.marginal, vec!["rolemark-0"]);
    assert_eq!(labeled.summary.ids.content, vec!["rolemark-1"]);
    assert_eq!(stats.get(Counter::PagesRoleAdded), 0);
    assert_eq!(stats.get(Counter::MarginalRoles), 0);
}

#[test]
fn test_class_overrides() {
    let html = "<div class=\"primary\">Home</div><nav class=\"ads\">Buy now</nav>\
                <div class=\"ads\"><nav>One</nav><nav>Two</nav></div>";

    let config = LabelConfig::builder().nav_classes("primary, -ads").build();
    let labeled = label_html_with_config(html, &config).unwrap();
    assert_eq!(roles_of(&labeled.html, "div.primary"), vec!["navigational"]);
    assert!(roles_of(&labeled.html, "nav.ads").is_empty());
    assert!(roles_of(&labeled.html, "div.ads").is_empty());
    assert_eq!(roles_of(&labeled.html, "div.ads > nav"), vec!["navigational", "navigational"]);

    let config = LabelConfig::builder().nav_classes("primary, -ads").server_side_nav(false).build();
    let labeled = label_html_with_config(html, &config).unwrap();
    assert!(roles_of(&labeled.html, "div.primary").is_empty());
    assert_eq!(roles_of(&labeled.html, "nav.ads"), vec!["navigational"]);
    assert_eq!(roles_of(&labeled.html, "div.ads"), vec!["navigational"]);
}

#[test]
fn test_disabled_config_passes_through() {
    let html = read_fixture("news_page.html");
    let config = LabelConfig::builder().enabled(false).build();
    let (labeled, stats) = label_counted(&html, &config);
    assert!(!labeled.html.contains("data-mobile-role"));
    assert_eq!(stats.snapshot(), StatsSnapshot::default());
}

#[test]
fn test_flush_output_is_final() {
    let first_chunk = "<body><div class=\"menu\"><a href=\"/\">Home</a></div><div>";
    let continuations = ["<p>alpha</p></div></body>", "<nav>beta</nav><nav>gamma</nav></div></body>"];

    let mut flushed = Vec::new();
    let mut finals = Vec::new();
    for rest in continuations {
        let buffer = SharedBuffer::default();
        let engine = LabelEngine::without_stats(LabelConfig::default());
        let mut rewriter = LabelRewriter::new(engine, buffer.clone());
        rewriter.write(first_chunk.as_bytes()).unwrap();
        rewriter.flush().unwrap();
        flushed.push(buffer.take_string());
        rewriter.write(rest.as_bytes()).unwrap();
        rewriter.end().unwrap();
        finals.push(buffer.take_string());
    }

    assert_eq!(flushed[0], flushed[1]);
    assert_eq!(
        flushed[0],
        "<body><div class=\"menu\" id=\"rolemark-0\" data-mobile-role=\"navigational\"><a href=\"/\">Home</a></div><div>"
    );
    assert_eq!(finals[1].matches("data-mobile-role=\"").count(), 2);
    assert!(finals[1].starts_with("<nav id=\"rolemark-1-0\" data-mobile-role=\"navigational\">beta</nav>"));
}

#[test]
fn test_root_snapshot_covers_document() {
    let labeled = label_html(&read_fixture("no_content.html")).unwrap();
    let root = &labeled.summary.root;
    assert_eq!(root.contained_tag_count, 6);
    assert_eq!(root.contained_tag_percent, 100.0);
    assert!(root.contained_content_bytes > 0);
    assert_eq!(root.tag_count("body"), 1);
}

#[test]
fn test_summary_serializes() {
    let labeled = label_html("<footer>Fine print</footer>").unwrap();
    let json = serde_json::to_value(&labeled).unwrap();
    assert_eq!(json["summary"]["ids"]["marginal"][0], "rolemark-0");
    assert_eq!(json["summary"]["labeled"], 1);
    assert!(json["html"].as_str().unwrap().contains("data-mobile-role=\"marginal\""));
}

#[test]
fn test_config_from_file_drives_labeling() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("rolemark.json");
    std::fs::write(&path, r#"{"id_prefix": "m-", "nav_classes": "primary"}"#).unwrap();

    let config = LabelConfig::from_file(&path).unwrap();
    let labeled = label_html_with_config("<div class=\"primary\">Home</div>", &config).unwrap();
    assert_eq!(labeled.summary.ids.navigational, vec!["m-0"]);
}
