//! Render the fixture feeds into SVG documents.

use anyhow::Result;
use serde::Deserialize;

use livechart_core::{
    charts::{BarChart, DonutChart, LineChart, TreeChart},
    ChangeEvent, Chart, Config, ElementKind, LiveChart, ScriptedFeed,
};
use livechart_svg::SvgDocument;

#[derive(Debug, Deserialize)]
struct FeedFixture {
    batches: Vec<Vec<ChangeEvent>>,
}

fn render(chart: impl Chart + 'static, fixture: &str) -> Result<LiveChart<ScriptedFeed, SvgDocument>> {
    let feed: FeedFixture = livechart_test_fixtures::feeds::load(fixture)?;
    let mut host = LiveChart::new(
        chart,
        ScriptedFeed::new(feed.batches),
        SvgDocument::new(1100.0, 500.0),
        Config::default(),
    );
    host.settle();
    Ok(host)
}

#[test]
fn bar_feed_renders_one_rect_and_axes() -> Result<()> {
    let host = render(BarChart::default(), "bar-amounts")?;
    let doc = host.target();
    assert_eq!(doc.nodes_of(ElementKind::Rect).count(), 1);
    let svg = doc.to_svg_string();
    assert!(svg.contains(r##"fill="#ffa500""##));
    assert!(svg.contains(" units</text>"));
    Ok(())
}

#[test]
fn donut_slices_are_paths_with_arc_data() -> Result<()> {
    let host = render(DonutChart::default(), "expenses")?;
    let doc = host.target();
    let arcs: Vec<_> = doc.nodes_of(ElementKind::Path).collect();
    assert_eq!(arcs.len(), 3);
    for arc in arcs {
        let d = arc.attrs.get("d").map(|v| v.to_string()).unwrap_or_default();
        assert!(d.starts_with('M') && d.contains('A'), "d={d}");
    }
    Ok(())
}

#[test]
fn line_feed_renders_path_and_points() -> Result<()> {
    let host = render(LineChart::default(), "activities")?;
    let doc = host.target();
    assert_eq!(doc.nodes_of(ElementKind::Circle).count(), 2);
    assert!(doc.nodes_of(ElementKind::Path).any(|p| p
        .attrs
        .get("fill")
        .map(|v| v.to_string() == "none")
        .unwrap_or(false)));
    Ok(())
}

#[test]
fn tree_nodes_draw_labels_over_links() -> Result<()> {
    let host = render(TreeChart::default(), "employees")?;
    let svg = host.target().to_svg_string();
    let first_link = svg.find("<path").expect("link path");
    let first_node = svg.find(r#"<g class="node""#).expect("node group");
    assert!(first_link < first_node);
    assert!(svg.contains(">CEO</text></g>"));
    assert!(svg.contains(r#"opacity="1""#));
    Ok(())
}

#[test]
fn document_keyed_tree_draws_employee_names() -> Result<()> {
    let host = render(TreeChart::default(), "employees-docs")?;
    let svg = host.target().to_svg_string();
    for name in ["Ada", "Bo", "Cy", "Dee"] {
        assert!(svg.contains(&format!(">{name}</text></g>")), "missing {name}");
    }
    assert!(!svg.contains("t4Rw"));
    Ok(())
}

#[test]
fn failed_layout_leaves_document_unchanged() -> Result<()> {
    let feed: FeedFixture = livechart_test_fixtures::feeds::load("employees-orphan")?;
    let mut batches = feed.batches.into_iter();
    let first = batches.next().expect("first batch");
    let rest: Vec<_> = batches.collect();

    let mut host = LiveChart::new(
        TreeChart::default(),
        ScriptedFeed::new(vec![first]),
        SvgDocument::new(1100.0, 500.0),
        Config::default(),
    );
    host.settle();
    let before = host.target().to_svg_string();

    for batch in rest {
        host.feed_mut().push(batch);
    }
    let frames = host.settle();
    assert!(frames.iter().any(|f| !f.errors.is_empty()));
    assert_eq!(host.target().to_svg_string(), before);
    Ok(())
}
