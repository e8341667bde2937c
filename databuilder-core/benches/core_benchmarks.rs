use criterion::{Criterion, black_box, criterion_group, criterion_main};
use databuilder_core::graph::{GraphNode, GraphRelationship, validate_node, validate_relation};
use databuilder_core::models::dashboard::{DashboardMetadata, DashboardMetadataFields};
use databuilder_core::serializers::{neo4j, neptune};
use databuilder_core::template::render_template;
use databuilder_core::{GraphSerializable, Record, SerializedKeys};
use serde_json::json;

fn dashboard_fields(i: usize) -> DashboardMetadataFields {
    DashboardMetadataFields {
        dashboard_group: "Sales".into(),
        dashboard_name: format!("Revenue {i}"),
        description: Some("Quarterly revenue by region".into()),
        tags: vec!["finance".into(), "weekly".into()],
        cluster: "gold".into(),
        product: "mode".into(),
        dashboard_group_id: Some("s1".into()),
        dashboard_id: Some(format!("r{i}")),
        ..Default::default()
    }
}

fn bench_validation(c: &mut Criterion) {
    let node = GraphNode::new("hive://gold.core/users", "Table").with_attribute("name", "users");
    let relation = GraphRelationship::new(
        "Table",
        "hive://gold.core/users",
        "Badge",
        "pii",
        "HAS_BADGE",
        "BADGE_FOR",
    );

    c.bench_function("validate_node", |b| b.iter(|| validate_node(black_box(&node))));
    c.bench_function("validate_relation", |b| {
        b.iter(|| validate_relation(black_box(&relation)))
    });
}

fn bench_dashboard_metadata(c: &mut Criterion) {
    c.bench_function("dashboard_metadata_drain", |b| {
        let keys = SerializedKeys::new();
        let mut i = 0;
        b.iter(|| {
            i += 1;
            let mut dashboard = DashboardMetadata::new(dashboard_fields(i), &keys);
            let nodes = dashboard.drain_nodes();
            let relations = dashboard.drain_relations();
            black_box((nodes, relations))
        })
    });
}

fn bench_serializers(c: &mut Criterion) {
    let node = GraphNode::new("hive://gold.core/users/id/distinct/", "Stat")
        .with_attribute("stat_name", "distinct")
        .with_unquoted_attribute("stat_val", 42)
        .with_attribute("start_epoch", 1_577_836_800);
    let relation = GraphRelationship::new(
        "Stat",
        "hive://gold.core/users/id/distinct/",
        "Column",
        "hive://gold.core/users/id",
        "STAT_OF",
        "STAT",
    );

    c.bench_function("neo4j_serialize_node", |b| {
        b.iter(|| neo4j::serialize_node(black_box(&node)))
    });
    c.bench_function("neptune_convert_node", |b| {
        b.iter(|| neptune::convert_node(black_box(&node)))
    });
    c.bench_function("neptune_convert_relationship", |b| {
        b.iter(|| neptune::convert_relationship(black_box(&relation)))
    });
}

fn bench_template(c: &mut Criterion) {
    let record: Record = json!({"organization": "acme", "space": "s1", "report": "r1"})
        .as_object()
        .cloned()
        .unwrap_or_default();

    c.bench_function("render_url_template", |b| {
        b.iter(|| {
            render_template(
                black_box("https://app.example.com/api/{organization}/spaces/{space}/reports/{report}"),
                black_box(&record),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_validation,
    bench_dashboard_metadata,
    bench_serializers,
    bench_template,
);
criterion_main!(benches);
